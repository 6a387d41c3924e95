//! Rematch Tracker - profile links, stat snapshots and leaderboards
//!
//! This library provides:
//! - Linking chat users to rematchtracker.com profiles (SQLite or JSON file)
//! - Headless-browser profile scraping with tiered, data-driven selectors
//! - A rolling per-user snapshot cache
//! - Leaderboards over heterogeneous stat encodings ("1,234", "1.5k", "52%")
//!
//! # Example
//!
//! ```no_run
//! use rematch_tracker::{AppConfig, TrackerService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let service = TrackerService::from_config(&config)?;
//!
//!     service.link("1234", "https://www.rematchtracker.com/player/steam/7656")?;
//!     let snapshot = service.refresh("1234", None).await?;
//!     println!("Rank: {}", snapshot.stats.rank);
//!
//!     let board = service.leaderboard("wins", 1, 10)?;
//!     for entry in board.entries {
//!         println!("{}. {} {}", entry.position, entry.display_name, entry.display_value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod scraper;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use crate::core::{normalize, Leaderboard, LeaderboardEntry, LeaderboardPage, Stat};
pub use error::TrackerError;
pub use models::{LinkRecord, ProfileSnapshot, ProfileStats};
pub use service::TrackerService;
