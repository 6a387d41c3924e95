pub mod health;
pub mod leaderboard;
pub mod links;
pub mod profiles;
