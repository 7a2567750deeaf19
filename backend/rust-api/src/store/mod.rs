//! Storage traits for the scoring API.
//!
//! Every backend (MongoDB, in-memory for tests and local runs) implements these
//! traits. Services depend only on the traits, through the [`Stores`] handle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    challenge::{Challenge, ChallengeId},
    solve::{SolveInsert, SolveRecord},
    submission::Submission,
    user::UserProfile,
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Challenge records. Content is managed elsewhere; the API only reads it and
/// maintains the solve counter.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn get_challenge(&self, id: ChallengeId) -> Result<Option<Challenge>, StoreError>;

    /// Ordered by points ascending, then id.
    async fn list_challenges(&self, category: Option<&str>)
        -> Result<Vec<Challenge>, StoreError>;

    /// Atomic +1 on the solve counter.
    async fn increment_solves(&self, id: ChallengeId) -> Result<(), StoreError>;

    async fn set_solves(&self, id: ChallengeId, solves: u32) -> Result<(), StoreError>;

    async fn count_challenges(&self) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Append-only submission ledger.
#[async_trait]
pub trait SubmissionLedger: Send + Sync {
    async fn append(&self, submission: &Submission) -> Result<(), StoreError>;

    async fn count_submissions(&self) -> Result<u64, StoreError>;
}

/// Solve state: at most one record per (user, challenge).
#[async_trait]
pub trait SolveStore: Send + Sync {
    async fn exists(&self, user_id: &str, challenge_id: ChallengeId) -> Result<bool, StoreError>;

    /// Inserts the record unless one exists for the pair. The existence check
    /// and the insert are a single atomic step.
    async fn create_if_absent(
        &self,
        user_id: &str,
        challenge_id: ChallengeId,
        solved_at: DateTime<Utc>,
    ) -> Result<SolveInsert, StoreError>;

    /// Newest first.
    async fn solves_for_user(&self, user_id: &str) -> Result<Vec<SolveRecord>, StoreError>;

    async fn all_solves(&self) -> Result<Vec<SolveRecord>, StoreError>;
}

/// Profiles of identities seen by the API.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Records the profile if the id is unknown; existing profiles are kept.
    async fn ensure_user(&self, profile: &UserProfile) -> Result<UserProfile, StoreError>;

    async fn get_user(&self, id: &str) -> Result<Option<UserProfile>, StoreError>;

    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError>;

    async fn count_users(&self) -> Result<u64, StoreError>;
}

/// Injected storage handles, built once at startup and shared by all services.
#[derive(Clone)]
pub struct Stores {
    pub challenges: Arc<dyn ChallengeStore>,
    pub ledger: Arc<dyn SubmissionLedger>,
    pub solves: Arc<dyn SolveStore>,
    pub users: Arc<dyn UserDirectory>,
}

impl Stores {
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            challenges: store.clone(),
            ledger: store.clone(),
            solves: store.clone(),
            users: store,
        }
    }

    pub fn mongo(store: Arc<MongoStore>) -> Self {
        Self {
            challenges: store.clone(),
            ledger: store.clone(),
            solves: store.clone(),
            users: store,
        }
    }
}
