use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::challenge::ChallengeId;

/// Credit marker for a (user, challenge) pair. Its existence is the solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub challenge_id: ChallengeId,
    pub solved_at: DateTime<Utc>,
}

impl SolveRecord {
    pub fn new(user_id: &str, challenge_id: ChallengeId, solved_at: DateTime<Utc>) -> Self {
        Self {
            id: Self::key(user_id, challenge_id),
            user_id: user_id.to_string(),
            challenge_id,
            solved_at,
        }
    }

    /// Storage key; one record per pair.
    pub fn key(user_id: &str, challenge_id: ChallengeId) -> String {
        format!("{}:{}", user_id, challenge_id)
    }
}

/// Result of an atomic conditional insert into solve state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveInsert {
    Created,
    AlreadyPresent,
}
