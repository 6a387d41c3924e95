//! Core business logic modules

pub mod leaderboard;
pub mod normalize;
pub mod rank;

// Re-export commonly used types
pub use leaderboard::{
    IdentityResolver, Leaderboard, LeaderboardEntry, LeaderboardPage, Passthrough, Stat,
    UserDirectory, DEFAULT_PAGE_SIZE,
};
pub use normalize::{format_percent, normalize, win_percent, NOT_AVAILABLE};
pub use rank::{tier_name, tier_priority};
