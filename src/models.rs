use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::normalize::NOT_AVAILABLE;

/// Link between a chat user and a tracker profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub user_id: String,
    pub platform: String,
    pub player_id: String,
}

impl LinkRecord {
    pub fn new(
        user_id: impl Into<String>,
        platform: impl Into<String>,
        player_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            platform: platform.into(),
            player_id: player_id.into(),
        }
    }
}

/// Stat fields as scraped text ("N/A" when the page did not show them)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub rank: String,
    pub wins: String,
    pub losses: String,
    pub goals: String,
    pub passes: String,
    pub steals: String,
    pub saves: String,
    pub assists: String,
}

impl Default for ProfileStats {
    fn default() -> Self {
        let na = || NOT_AVAILABLE.to_string();
        Self {
            rank: na(),
            wins: na(),
            losses: na(),
            goals: na(),
            passes: na(),
            steals: na(),
            saves: na(),
            assists: na(),
        }
    }
}

/// Last scraped profile for one user
///
/// Serialized as the value half of the snapshot cache file, so `user_id`
/// lives in the map key rather than in the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    #[serde(skip)]
    pub user_id: String,
    pub platform: String,
    pub player_id: String,
    #[serde(rename = "last_updated")]
    pub captured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: ProfileStats,
}

impl ProfileSnapshot {
    /// Win rate display string, e.g. "75.0%"
    pub fn win_percent_display(&self) -> String {
        crate::core::normalize::format_percent(crate::core::normalize::win_percent(
            &self.stats.wins,
            &self.stats.losses,
        ))
    }
}

/// Link request body
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkRequest {
    pub user_id: String,
    pub profile_url: String,
    /// Replace an existing link (admin force-link)
    #[serde(default)]
    pub force: bool,
}

/// Linked account with its resolved display name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkListing {
    pub display_name: String,
    #[serde(flatten)]
    pub record: LinkRecord,
}

/// Refresh / stats response
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub user_id: String,
    pub platform: String,
    pub player_id: String,
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: ProfileStats,
    pub win_percent: String,
}

impl From<ProfileSnapshot> for SnapshotResponse {
    fn from(snapshot: ProfileSnapshot) -> Self {
        let win_percent = snapshot.win_percent_display();
        Self {
            user_id: snapshot.user_id,
            platform: snapshot.platform,
            player_id: snapshot.player_id,
            last_updated: snapshot.captured_at,
            stats: snapshot.stats,
            win_percent,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub link_backend: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
