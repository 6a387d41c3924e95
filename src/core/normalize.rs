//! Stat value normalization
//!
//! The tracker renders numbers in several encodings: plain integers,
//! comma-grouped numbers ("1,234"), magnitude suffixes ("12.3k", "4m") and
//! percentages ("52%"). Everything that needs to compare two stat values
//! goes through [`normalize`].
//!
//! Percentages keep their point value: `"52%"` normalizes to `52.0`, not
//! `0.52`, so a percent stat and a count stat share one numeric axis.

/// Sentinel stored when a field could not be extracted from the page
pub const NOT_AVAILABLE: &str = "N/A";

/// Convert a raw stat string into a comparable magnitude
///
/// Never fails: empty input, the `"N/A"` sentinel and anything that does not
/// parse after suffix stripping all yield `0.0`. The result is always finite.
///
/// # Examples
/// ```
/// use rematch_tracker::core::normalize::normalize;
/// assert_eq!(normalize("1,234"), 1234.0);
/// assert_eq!(normalize("1.5k"), 1500.0);
/// assert_eq!(normalize("52%"), 52.0);
/// assert_eq!(normalize("N/A"), 0.0);
/// ```
pub fn normalize(raw: &str) -> f64 {
    let cleaned = raw.trim().to_lowercase().replace(',', "");

    if cleaned.is_empty() || cleaned == "n/a" {
        return 0.0;
    }

    let (number, multiplier) = split_suffix(&cleaned);

    number
        .trim()
        .parse::<f64>()
        .ok()
        .map(|value| value * multiplier)
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Split a cleaned value into its numeric part and suffix multiplier
fn split_suffix(cleaned: &str) -> (&str, f64) {
    if let Some(rest) = cleaned.strip_suffix('%') {
        return (rest, 1.0);
    }

    match cleaned.char_indices().last() {
        Some((idx, 'k')) => (&cleaned[..idx], 1e3),
        Some((idx, 'm')) => (&cleaned[..idx], 1e6),
        Some((idx, 'b')) => (&cleaned[..idx], 1e9),
        _ => (cleaned, 1.0),
    }
}

/// Win rate in percentage points
///
/// Both inputs are raw stat strings. Returns `0.0` when no games were played.
pub fn win_percent(wins: &str, losses: &str) -> f64 {
    let wins = normalize(wins);
    let losses = normalize(losses);
    let total = wins + losses;

    if total > 0.0 {
        wins / total * 100.0
    } else {
        0.0
    }
}

/// Render a percentage with one decimal place (e.g. "75.0%")
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_and_grouped() {
        assert_eq!(normalize("42"), 42.0);
        assert_eq!(normalize("1,234"), 1234.0);
        assert_eq!(normalize("  1,234,567 "), 1234567.0);
        assert_eq!(normalize("3.25"), 3.25);
    }

    #[test]
    fn test_normalize_suffixes() {
        assert_eq!(normalize("1.5k"), 1500.0);
        assert_eq!(normalize("12.3K"), 12300.0);
        assert_eq!(normalize("2m"), 2_000_000.0);
        assert_eq!(normalize("1b"), 1_000_000_000.0);
    }

    #[test]
    fn test_normalize_percent_keeps_points() {
        assert_eq!(normalize("52%"), 52.0);
        assert_eq!(normalize("0.5%"), 0.5);
    }

    #[test]
    fn test_normalize_degrades_to_zero() {
        assert_eq!(normalize(""), 0.0);
        assert_eq!(normalize("   "), 0.0);
        assert_eq!(normalize("N/A"), 0.0);
        assert_eq!(normalize("n/a"), 0.0);
        assert_eq!(normalize("Gold"), 0.0);
        assert_eq!(normalize("k"), 0.0);
        assert_eq!(normalize("%"), 0.0);
    }

    #[test]
    fn test_normalize_is_always_finite() {
        for raw in ["inf", "-inf", "NaN", "1e308k", "infinity%"] {
            let value = normalize(raw);
            assert!(value.is_finite(), "{} -> {}", raw, value);
        }
    }

    #[test]
    fn test_normalize_is_deterministic() {
        assert_eq!(normalize("7.7k"), normalize("7.7k"));
    }

    #[test]
    fn test_win_percent() {
        assert_eq!(format_percent(win_percent("3", "1")), "75.0%");
        assert_eq!(format_percent(win_percent("0", "0")), "0.0%");
        assert_eq!(format_percent(win_percent("N/A", "N/A")), "0.0%");
        assert_eq!(format_percent(win_percent("2", "1")), "66.7%");
    }
}
