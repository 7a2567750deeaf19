pub mod challenge;
pub mod leaderboard;
pub mod solve;
pub mod submission;
pub mod user;
