//! Profile page parsing
//!
//! Works on markup that was already rendered and captured. A field whose
//! strategies all miss becomes "N/A"; the rest of the profile is still
//! returned.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

use super::selectors::{CompiledSelectors, CompiledStrategy, ProfileField};
use crate::core::normalize::NOT_AVAILABLE;
use crate::models::{ProfileSnapshot, ProfileStats};

/// Name shown when the page heading is missing
pub const UNKNOWN_NAME: &str = "Unknown";

/// Everything read from one profile page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedProfile {
    pub name: String,
    pub stats: ProfileStats,
}

impl ExtractedProfile {
    /// Names of the fields that fell back to "N/A"
    pub fn degraded_fields(&self) -> Vec<&'static str> {
        ProfileField::ALL
            .iter()
            .filter(|&&field| field_value(&self.stats, field) == NOT_AVAILABLE)
            .map(|field| field.name())
            .collect()
    }

    pub fn into_snapshot(
        self,
        user_id: &str,
        platform: &str,
        player_id: &str,
        captured_at: DateTime<Utc>,
    ) -> ProfileSnapshot {
        ProfileSnapshot {
            user_id: user_id.to_string(),
            platform: platform.to_string(),
            player_id: player_id.to_string(),
            captured_at,
            stats: self.stats,
        }
    }
}

/// Extract the profile from rendered page markup
pub fn parse_profile(html: &str, selectors: &CompiledSelectors) -> ExtractedProfile {
    let document = Html::parse_document(html);

    let name = resolve(&document, &selectors.heading).unwrap_or_else(|| UNKNOWN_NAME.to_string());

    let mut stats = ProfileStats::default();
    for (field, strategies) in &selectors.fields {
        match resolve(&document, strategies) {
            Some(value) => *field_value_mut(&mut stats, *field) = value,
            None => tracing::warn!("Field '{}' not found on profile page", field.name()),
        }
    }

    ExtractedProfile { name, stats }
}

/// First strategy that yields non-empty text at its positional index
fn resolve(document: &Html, strategies: &[CompiledStrategy]) -> Option<String> {
    strategies.iter().enumerate().find_map(|(tier, strategy)| {
        let element = document.select(&strategy.selector).nth(strategy.index)?;
        let text = clean_text(&element);
        if text.is_empty() {
            return None;
        }
        if tier > 0 {
            tracing::debug!(
                "Matched fallback selector '{}' (tier {})",
                strategy.source,
                tier + 1
            );
        }
        Some(text)
    })
}

/// Text content with each text node trimmed and the pieces joined
fn clean_text(element: &ElementRef) -> String {
    element.text().map(str::trim).collect()
}

fn field_value(stats: &ProfileStats, field: ProfileField) -> &str {
    match field {
        ProfileField::Rank => &stats.rank,
        ProfileField::Wins => &stats.wins,
        ProfileField::Losses => &stats.losses,
        ProfileField::Goals => &stats.goals,
        ProfileField::Passes => &stats.passes,
        ProfileField::Steals => &stats.steals,
        ProfileField::Saves => &stats.saves,
        ProfileField::Assists => &stats.assists,
    }
}

fn field_value_mut(stats: &mut ProfileStats, field: ProfileField) -> &mut String {
    match field {
        ProfileField::Rank => &mut stats.rank,
        ProfileField::Wins => &mut stats.wins,
        ProfileField::Losses => &mut stats.losses,
        ProfileField::Goals => &mut stats.goals,
        ProfileField::Passes => &mut stats.passes,
        ProfileField::Steals => &mut stats.steals,
        ProfileField::Saves => &mut stats.saves,
        ProfileField::Assists => &mut stats.assists,
    }
}
