use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::challenge::ChallengeId;

pub const MSG_SOLVED: &str = "Correct! Challenge solved!";
pub const MSG_ALREADY_SOLVED: &str = "You already solved this challenge!";
pub const MSG_INCORRECT: &str = "Incorrect flag. Try again!";

/// Request to submit a flag
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitFlagRequest {
    #[validate(
        length(max = 512, message = "Flag must be at most 512 characters"),
        custom(function = "validate_not_blank")
    )]
    pub flag: String,
}

fn validate_not_blank(flag: &str) -> Result<(), ValidationError> {
    if flag.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Flag must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// One ledger row per attempt, correct or not. Never updated once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub challenge_id: ChallengeId,
    /// Raw text as submitted, before trimming.
    pub flag: String,
    pub correct: bool,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Solved,
    AlreadySolved,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub correct: bool,
    pub outcome: SubmissionOutcome,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_awarded: Option<u32>,
}

impl SubmissionResult {
    pub fn solved(points: u32) -> Self {
        Self {
            correct: true,
            outcome: SubmissionOutcome::Solved,
            message: MSG_SOLVED.to_string(),
            points_awarded: Some(points),
        }
    }

    pub fn already_solved() -> Self {
        Self {
            correct: true,
            outcome: SubmissionOutcome::AlreadySolved,
            message: MSG_ALREADY_SOLVED.to_string(),
            points_awarded: Some(0),
        }
    }

    pub fn incorrect() -> Self {
        Self {
            correct: false,
            outcome: SubmissionOutcome::Incorrect,
            message: MSG_INCORRECT.to_string(),
            points_awarded: None,
        }
    }
}
