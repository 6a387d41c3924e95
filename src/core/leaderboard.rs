//! Leaderboard ranking over cached snapshots
//!
//! Ordering:
//! - `rank`: ascending tier priority, unknown ranks last
//! - `win-percent`: computed from wins and losses, descending
//! - everything else: [`normalize`]d value, descending
//!
//! The sort is stable, so entries with equal keys keep the order in which
//! the snapshot cache yielded them. For the JSON cache that is insertion
//! order; ties are not broken any further.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::normalize::{format_percent, normalize, win_percent};
use super::rank::{tier_priority, tier_sort_key};
use crate::models::ProfileSnapshot;

/// Default leaderboard page size
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Positions that get the podium marker
const PODIUM_SIZE: usize = 3;

/// Stats a leaderboard can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stat {
    Wins,
    Goals,
    Saves,
    Rank,
    Passes,
    Steals,
    Assists,
    WinPercent,
}

impl Stat {
    pub const ALL: [Stat; 8] = [
        Stat::Wins,
        Stat::Goals,
        Stat::Saves,
        Stat::Rank,
        Stat::Passes,
        Stat::Steals,
        Stat::Assists,
        Stat::WinPercent,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Stat::Wins => "wins",
            Stat::Goals => "goals",
            Stat::Saves => "saves",
            Stat::Rank => "rank",
            Stat::Passes => "passes",
            Stat::Steals => "steals",
            Stat::Assists => "assists",
            Stat::WinPercent => "win-percent",
        }
    }

    /// Raw value for stats read straight from the snapshot
    fn raw<'a>(self, snapshot: &'a ProfileSnapshot) -> &'a str {
        let stats = &snapshot.stats;
        match self {
            Stat::Wins => &stats.wins,
            Stat::Goals => &stats.goals,
            Stat::Saves => &stats.saves,
            Stat::Rank => &stats.rank,
            Stat::Passes => &stats.passes,
            Stat::Steals => &stats.steals,
            Stat::Assists => &stats.assists,
            Stat::WinPercent => "",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Stat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wins" => Ok(Stat::Wins),
            "goals" => Ok(Stat::Goals),
            "saves" => Ok(Stat::Saves),
            "rank" => Ok(Stat::Rank),
            "passes" => Ok(Stat::Passes),
            "steals" => Ok(Stat::Steals),
            "assists" => Ok(Stat::Assists),
            "win-percent" | "winpercent" | "win%" | "winrate" | "win_percent" => {
                Ok(Stat::WinPercent)
            }
            other => Err(other.to_string()),
        }
    }
}

/// Resolves a user id to the name shown on leaderboards
///
/// Returning `None` drops the user from the leaderboard.
pub trait IdentityResolver: Send + Sync {
    fn display_name(&self, user_id: &str) -> Option<String>;
}

/// Uses the user id itself as the display name
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl IdentityResolver for Passthrough {
    fn display_name(&self, user_id: &str) -> Option<String> {
        Some(user_id.to_string())
    }
}

/// Fixed user id -> name directory; unknown users are unresolvable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserDirectory {
    names: HashMap<String, String>,
}

impl UserDirectory {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl IdentityResolver for UserDirectory {
    fn display_name(&self, user_id: &str) -> Option<String> {
        self.names.get(user_id).cloned()
    }
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub position: usize,
    pub user_id: String,
    pub display_name: String,
    pub display_value: String,
    pub sort_key: f64,
    /// Top three
    pub podium: bool,
}

/// Fully ordered leaderboard for one stat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub stat: Stat,
    pub entries: Vec<LeaderboardEntry>,
}

/// One page of a leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardPage {
    pub stat: Stat,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_entries: usize,
    pub entries: Vec<LeaderboardEntry>,
}

struct Candidate {
    user_id: String,
    display_name: String,
    display_value: String,
    sort_key: f64,
}

impl Leaderboard {
    /// Rank every resolvable snapshot by `stat`
    pub fn build(
        stat: Stat,
        snapshots: &IndexMap<String, ProfileSnapshot>,
        resolver: &dyn IdentityResolver,
    ) -> Self {
        let mut candidates: Vec<Candidate> = snapshots
            .iter()
            .filter_map(|(user_id, snapshot)| {
                let display_name = match resolver.display_name(user_id) {
                    Some(name) => name,
                    None => {
                        tracing::debug!("Skipping unresolvable user {} on leaderboard", user_id);
                        return None;
                    }
                };
                let (display_value, sort_key) = score(stat, snapshot);
                Some(Candidate {
                    user_id: user_id.clone(),
                    display_name,
                    display_value,
                    sort_key,
                })
            })
            .collect();

        match stat {
            Stat::Rank => candidates.sort_by_key(|c| tier_sort_key(c.sort_key as u32)),
            _ => candidates.sort_by(|a, b| b.sort_key.total_cmp(&a.sort_key)),
        }

        let entries = candidates
            .into_iter()
            .enumerate()
            .map(|(idx, c)| LeaderboardEntry {
                position: idx + 1,
                user_id: c.user_id,
                display_name: c.display_name,
                display_value: c.display_value,
                sort_key: c.sort_key,
                podium: idx < PODIUM_SIZE,
            })
            .collect();

        Self { stat, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slice out a 1-based page; out-of-range pages clamp to the last one
    pub fn page(&self, page: usize, per_page: usize) -> LeaderboardPage {
        let per_page = per_page.max(1);
        let total_entries = self.entries.len();
        let total_pages = total_entries.div_ceil(per_page).max(1);
        let page = page.clamp(1, total_pages);

        let start = (page - 1) * per_page;
        let entries = self
            .entries
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect();

        LeaderboardPage {
            stat: self.stat,
            page,
            per_page,
            total_pages,
            total_entries,
            entries,
        }
    }
}

/// Display value and sort key for one snapshot
fn score(stat: Stat, snapshot: &ProfileSnapshot) -> (String, f64) {
    match stat {
        Stat::Rank => {
            let rank = stat.raw(snapshot);
            (rank.to_string(), tier_priority(rank) as f64)
        }
        Stat::WinPercent => {
            let pct = win_percent(&snapshot.stats.wins, &snapshot.stats.losses);
            (format_percent(pct), pct)
        }
        _ => {
            let raw = stat.raw(snapshot);
            (raw.to_string(), normalize(raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileStats;
    use chrono::Utc;

    fn snapshots(rows: &[(&str, ProfileStats)]) -> IndexMap<String, ProfileSnapshot> {
        rows.iter()
            .map(|(user_id, stats)| {
                (
                    user_id.to_string(),
                    ProfileSnapshot {
                        user_id: user_id.to_string(),
                        platform: "steam".to_string(),
                        player_id: format!("p-{}", user_id),
                        captured_at: Utc::now(),
                        stats: stats.clone(),
                    },
                )
            })
            .collect()
    }

    fn wins(value: &str) -> ProfileStats {
        ProfileStats {
            wins: value.to_string(),
            ..ProfileStats::default()
        }
    }

    fn rank(value: &str) -> ProfileStats {
        ProfileStats {
            rank: value.to_string(),
            ..ProfileStats::default()
        }
    }

    fn order(board: &Leaderboard) -> Vec<&str> {
        board.entries.iter().map(|e| e.user_id.as_str()).collect()
    }

    #[test]
    fn test_stat_from_str() {
        assert_eq!("Wins".parse::<Stat>(), Ok(Stat::Wins));
        assert_eq!("win%".parse::<Stat>(), Ok(Stat::WinPercent));
        assert_eq!("winrate".parse::<Stat>(), Ok(Stat::WinPercent));
        assert!("mvps".parse::<Stat>().is_err());
        for stat in Stat::ALL {
            assert_eq!(stat.key().parse::<Stat>(), Ok(stat));
        }
    }

    #[test]
    fn test_wins_descending_with_na_last() {
        let data = snapshots(&[("A", wins("10")), ("B", wins("25")), ("C", wins("N/A"))]);
        let board = Leaderboard::build(Stat::Wins, &data, &Passthrough);

        assert_eq!(order(&board), vec!["B", "A", "C"]);
        assert_eq!(board.entries[2].sort_key, 0.0);
        assert_eq!(board.entries[2].display_value, "N/A");
    }

    #[test]
    fn test_mixed_encodings() {
        let data = snapshots(&[
            ("A", wins("1,234")),
            ("B", wins("1.5k")),
            ("C", wins("999")),
            ("D", wins("2m")),
        ]);
        let board = Leaderboard::build(Stat::Wins, &data, &Passthrough);
        assert_eq!(order(&board), vec!["D", "B", "A", "C"]);
        assert_eq!(board.entries[1].display_value, "1.5k");
    }

    #[test]
    fn test_rank_ascending_by_tier() {
        let data = snapshots(&[("A", rank("Gold")), ("B", rank("Elite"))]);
        let board = Leaderboard::build(Stat::Rank, &data, &Passthrough);
        assert_eq!(order(&board), vec!["B", "A"]);
        assert_eq!(board.entries[0].sort_key, 1.0);
    }

    #[test]
    fn test_unknown_rank_sorts_after_known() {
        let data = snapshots(&[
            ("A", rank("N/A")),
            ("B", rank("Bronze")),
            ("C", rank("Diamond II")),
        ]);
        let board = Leaderboard::build(Stat::Rank, &data, &Passthrough);
        assert_eq!(order(&board), vec!["C", "B", "A"]);
        assert_eq!(board.entries[2].sort_key, 0.0);
    }

    #[test]
    fn test_win_percent() {
        let data = snapshots(&[
            (
                "A",
                ProfileStats {
                    wins: "3".to_string(),
                    losses: "1".to_string(),
                    ..ProfileStats::default()
                },
            ),
            (
                "B",
                ProfileStats {
                    wins: "0".to_string(),
                    losses: "0".to_string(),
                    ..ProfileStats::default()
                },
            ),
            (
                "C",
                ProfileStats {
                    wins: "9".to_string(),
                    losses: "1".to_string(),
                    ..ProfileStats::default()
                },
            ),
        ]);
        let board = Leaderboard::build(Stat::WinPercent, &data, &Passthrough);

        assert_eq!(order(&board), vec!["C", "A", "B"]);
        assert_eq!(board.entries[0].display_value, "90.0%");
        assert_eq!(board.entries[1].display_value, "75.0%");
        assert_eq!(board.entries[2].display_value, "0.0%");
    }

    #[test]
    fn test_ties_keep_cache_order() {
        let data = snapshots(&[("X", wins("5")), ("Y", wins("7")), ("Z", wins("5"))]);
        let board = Leaderboard::build(Stat::Wins, &data, &Passthrough);
        assert_eq!(order(&board), vec!["Y", "X", "Z"]);
    }

    #[test]
    fn test_podium_and_positions() {
        let data = snapshots(&[
            ("A", wins("1")),
            ("B", wins("2")),
            ("C", wins("3")),
            ("D", wins("4")),
        ]);
        let board = Leaderboard::build(Stat::Wins, &data, &Passthrough);

        let positions: Vec<_> = board.entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
        let podium: Vec<_> = board.entries.iter().map(|e| e.podium).collect();
        assert_eq!(podium, vec![true, true, true, false]);
    }

    #[test]
    fn test_unresolvable_users_excluded() {
        let data = snapshots(&[("A", wins("10")), ("gone", wins("99")), ("B", wins("5"))]);
        let mut names = HashMap::new();
        names.insert("A".to_string(), "Alice".to_string());
        names.insert("B".to_string(), "Bob".to_string());
        let directory = UserDirectory::new(names);

        let board = Leaderboard::build(Stat::Wins, &data, &directory);
        assert_eq!(order(&board), vec!["A", "B"]);
        assert_eq!(board.entries[0].display_name, "Alice");
        assert_eq!(board.entries[0].position, 1);
        assert!(board.entries[1].podium);
    }

    #[test]
    fn test_pagination() {
        let rows: Vec<(String, ProfileStats)> = (0..25)
            .map(|i| (format!("u{:02}", i), wins(&i.to_string())))
            .collect();
        let rows: Vec<(&str, ProfileStats)> =
            rows.iter().map(|(id, s)| (id.as_str(), s.clone())).collect();
        let board = Leaderboard::build(Stat::Wins, &snapshots(&rows), &Passthrough);

        let first = board.page(1, 10);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_entries, 25);
        assert_eq!(first.entries.len(), 10);
        assert_eq!(first.entries[0].user_id, "u24");

        let last = board.page(3, 10);
        assert_eq!(last.entries.len(), 5);
        assert_eq!(last.entries[0].position, 21);

        assert_eq!(board.page(99, 10).page, 3);
        assert_eq!(board.page(0, 10).page, 1);
    }

    #[test]
    fn test_empty_leaderboard_page() {
        let board = Leaderboard::build(Stat::Goals, &IndexMap::new(), &Passthrough);
        let page = board.page(1, DEFAULT_PAGE_SIZE);
        assert!(page.entries.is_empty());
        assert_eq!(page.total_pages, 1);
    }
}
