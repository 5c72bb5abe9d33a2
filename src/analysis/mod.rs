pub mod distribution;
pub mod leaderboard;
pub mod rank;
pub mod rankings;
pub mod summary;
pub mod trend;
pub mod usage_stats;
