use thiserror::Error;

use crate::store::StoreError;

/// Failures of the scoring and leaderboard operations. Wrong flags and
/// repeated solves are ordinary results, not errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}
