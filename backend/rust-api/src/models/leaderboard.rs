use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::challenge::ChallengeId;

pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 50;
pub const RECENT_SOLVES_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub username: String,
    pub points: u64,
    pub solves: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LeaderboardQuery {
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentSolve {
    pub challenge_id: ChallengeId,
    pub title: String,
    pub category: String,
    pub points: u32,
    pub solved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub user_id: String,
    pub username: String,
    pub solves: u32,
    pub points: u64,
    pub rank: u32,
    pub recent_solves: Vec<RecentSolve>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStats {
    pub total_users: u64,
    pub total_challenges: u64,
    pub total_submissions: u64,
}

/// Admin view of one user with live totals. Solvers the directory has never
/// seen have no email or `created_at`.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub points: u64,
    pub solves: u32,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolveCountCorrection {
    pub challenge_id: ChallengeId,
    pub previous: u32,
    pub actual: u32,
}
