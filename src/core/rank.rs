//! Rank tiers
//!
//! Ranks are discrete categories, so leaderboards order them by a fixed
//! priority table instead of a numeric value. Lower priority is better.

/// Priority assigned to rank strings that match no known tier
pub const UNRANKED: u32 = 0;

/// Known tiers, best first. The position + 1 is the tier priority.
const TIERS: [&str; 7] = [
    "Elite", "Master", "Diamond", "Platinum", "Gold", "Silver", "Bronze",
];

/// Priority of a rank string (1 = best), or [`UNRANKED`]
///
/// Matching is case-insensitive and accepts division suffixes
/// ("Gold III" is Gold).
pub fn tier_priority(rank: &str) -> u32 {
    let rank = rank.trim().to_lowercase();
    if rank.is_empty() {
        return UNRANKED;
    }

    // Longest name first so a tier whose name contains another wins
    let mut candidates: Vec<(usize, &str)> = TIERS.iter().copied().enumerate().collect();
    candidates.sort_by_key(|(_, name)| std::cmp::Reverse(name.len()));

    candidates
        .into_iter()
        .find(|(_, name)| rank.contains(&name.to_lowercase()))
        .map(|(idx, _)| idx as u32 + 1)
        .unwrap_or(UNRANKED)
}

/// Canonical tier name for a rank string, if it matches one
pub fn tier_name(rank: &str) -> Option<&'static str> {
    match tier_priority(rank) {
        UNRANKED => None,
        priority => TIERS.get(priority as usize - 1).copied(),
    }
}

/// Ascending sort key where unranked entries come after every known tier
pub fn tier_sort_key(priority: u32) -> u32 {
    if priority == UNRANKED {
        u32::MAX
    } else {
        priority
    }
}
