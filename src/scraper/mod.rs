//! Profile scraper for rematchtracker.com
//!
//! Profile pages are rendered client-side, so pages are loaded in a headless
//! browser and the captured markup is parsed with a tiered selector table.
//!
//! # Example
//!
//! ```no_run
//! use rematch_tracker::scraper::{ProfileScraper, ScraperConfig, SelectorTable};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scraper = ProfileScraper::new(ScraperConfig::default(), &SelectorTable::default())?;
//!
//!     let profile = scraper.extract("steam", "76561198000000000", None).await?;
//!     println!("{} is {}", profile.name, profile.stats.rank);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod profile;
mod selectors;

pub use client::{
    ChromeRenderer, PageRenderer, ProfileScraper, RenderRequest, ScraperConfig,
    DEFAULT_TRACKER_HOST,
};
pub use profile::{parse_profile, ExtractedProfile, UNKNOWN_NAME};
pub use selectors::{
    CompiledSelectors, CompiledStrategy, ProfileField, SelectorStrategy, SelectorTable,
};

#[cfg(test)]
pub(crate) use client::tests::{FixtureRenderer, UnreachableRenderer};

use thiserror::Error;

/// Scraper errors
///
/// A field missing from the page is not an error; it comes back as "N/A".
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Could not load profile page: {0}")]
    Acquisition(String),

    #[error("Invalid selector table: {0}")]
    InvalidSelector(String),

    #[error("Not a tracker profile URL: {0}")]
    InvalidProfileUrl(String),
}

/// Profile page URL for a player
pub fn profile_url(tracker_host: &str, platform: &str, player_id: &str) -> String {
    format!("https://{}/player/{}/{}", tracker_host, platform, player_id)
}

/// Extract `(platform, player_id)` from a profile URL
///
/// Accepts anything with a `.../player/<platform>/<player_id>` path,
/// including trailing slashes.
pub fn parse_profile_url(url: &str) -> Result<(String, String), ScraperError> {
    let parts: Vec<&str> = url.trim().trim_matches('/').split('/').collect();

    let idx = parts
        .iter()
        .position(|part| *part == "player")
        .ok_or_else(|| ScraperError::InvalidProfileUrl(url.to_string()))?;

    match (parts.get(idx + 1), parts.get(idx + 2)) {
        (Some(platform), Some(player_id)) if !platform.is_empty() && !player_id.is_empty() => {
            Ok((platform.to_string(), player_id.to_string()))
        }
        _ => Err(ScraperError::InvalidProfileUrl(url.to_string())),
    }
}
