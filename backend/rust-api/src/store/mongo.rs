use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions, UpdateOptions},
    Collection, Database, IndexModel,
};

use super::{ChallengeStore, SolveStore, StoreError, SubmissionLedger, UserDirectory};
use crate::metrics::track_db_operation;
use crate::models::{
    challenge::{Challenge, ChallengeId},
    solve::{SolveInsert, SolveRecord},
    submission::Submission,
    user::UserProfile,
};

const CHALLENGES: &str = "challenges";
const SUBMISSIONS: &str = "submissions";
const SOLVES: &str = "solves";
const USERS: &str = "users";

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    db: Database,
}

fn backend(err: mongodb::error::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == DUPLICATE_KEY
    )
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn challenges(&self) -> Collection<Challenge> {
        self.db.collection(CHALLENGES)
    }

    fn submissions(&self) -> Collection<Submission> {
        self.db.collection(SUBMISSIONS)
    }

    fn solves(&self) -> Collection<SolveRecord> {
        self.db.collection(SOLVES)
    }

    fn users(&self) -> Collection<UserProfile> {
        self.db.collection(USERS)
    }

    /// Creates the unique (user_id, challenge_id) index that backs the
    /// one-solve-per-pair rule, plus the ledger lookup index.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique_solve = IndexModel::builder()
            .keys(doc! { "user_id": 1, "challenge_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.solves()
            .create_index(unique_solve)
            .await
            .map_err(backend)?;

        let ledger_lookup = IndexModel::builder()
            .keys(doc! { "user_id": 1, "challenge_id": 1, "submitted_at": 1 })
            .build();
        self.submissions()
            .create_index(ledger_lookup)
            .await
            .map_err(backend)?;

        tracing::info!("MongoDB indexes ensured");
        Ok(())
    }
}

#[async_trait]
impl ChallengeStore for MongoStore {
    async fn get_challenge(&self, id: ChallengeId) -> Result<Option<Challenge>, StoreError> {
        track_db_operation("find_one", CHALLENGES, async {
            self.challenges()
                .find_one(doc! { "_id": id })
                .await
                .map_err(backend)
        })
        .await
    }

    async fn list_challenges(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<Challenge>, StoreError> {
        let filter = match category {
            Some(category) => doc! { "category": category },
            None => Document::new(),
        };
        let options = FindOptions::builder()
            .sort(doc! { "points": 1, "_id": 1 })
            .build();

        track_db_operation("find", CHALLENGES, async {
            let cursor = self
                .challenges()
                .find(filter)
                .with_options(options)
                .await
                .map_err(backend)?;
            cursor.try_collect::<Vec<_>>().await.map_err(backend)
        })
        .await
    }

    async fn increment_solves(&self, id: ChallengeId) -> Result<(), StoreError> {
        let result = track_db_operation("update_one", CHALLENGES, async {
            self.challenges()
                .update_one(doc! { "_id": id }, doc! { "$inc": { "solves": 1 } })
                .await
                .map_err(backend)
        })
        .await?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(format!("challenge {}", id)));
        }
        Ok(())
    }

    async fn set_solves(&self, id: ChallengeId, solves: u32) -> Result<(), StoreError> {
        let result = track_db_operation("update_one", CHALLENGES, async {
            self.challenges()
                .update_one(
                    doc! { "_id": id },
                    doc! { "$set": { "solves": i64::from(solves) } },
                )
                .await
                .map_err(backend)
        })
        .await?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(format!("challenge {}", id)));
        }
        Ok(())
    }

    async fn count_challenges(&self) -> Result<u64, StoreError> {
        track_db_operation("count", CHALLENGES, async {
            self.challenges()
                .count_documents(doc! {})
                .await
                .map_err(backend)
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(backend)
    }
}

#[async_trait]
impl SubmissionLedger for MongoStore {
    async fn append(&self, submission: &Submission) -> Result<(), StoreError> {
        track_db_operation("insert_one", SUBMISSIONS, async {
            self.submissions()
                .insert_one(submission)
                .await
                .map(|_| ())
                .map_err(backend)
        })
        .await
    }

    async fn count_submissions(&self) -> Result<u64, StoreError> {
        track_db_operation("count", SUBMISSIONS, async {
            self.submissions()
                .count_documents(doc! {})
                .await
                .map_err(backend)
        })
        .await
    }
}

#[async_trait]
impl SolveStore for MongoStore {
    async fn exists(&self, user_id: &str, challenge_id: ChallengeId) -> Result<bool, StoreError> {
        let found = track_db_operation("find_one", SOLVES, async {
            self.solves()
                .find_one(doc! { "_id": SolveRecord::key(user_id, challenge_id) })
                .await
                .map_err(backend)
        })
        .await?;
        Ok(found.is_some())
    }

    async fn create_if_absent(
        &self,
        user_id: &str,
        challenge_id: ChallengeId,
        solved_at: DateTime<Utc>,
    ) -> Result<SolveInsert, StoreError> {
        let record = SolveRecord::new(user_id, challenge_id, solved_at);

        // The keyed _id and the unique index both reject a second record for
        // the pair, so losing a race surfaces as a duplicate key error.
        track_db_operation("insert_one", SOLVES, async {
            match self.solves().insert_one(&record).await {
                Ok(_) => Ok(SolveInsert::Created),
                Err(e) if is_duplicate_key(&e) => Ok(SolveInsert::AlreadyPresent),
                Err(e) => Err(backend(e)),
            }
        })
        .await
    }

    async fn solves_for_user(&self, user_id: &str) -> Result<Vec<SolveRecord>, StoreError> {
        let mut solves: Vec<SolveRecord> = track_db_operation("find", SOLVES, async {
            let cursor = self
                .solves()
                .find(doc! { "user_id": user_id })
                .await
                .map_err(backend)?;
            cursor.try_collect::<Vec<_>>().await.map_err(backend)
        })
        .await?;

        solves.sort_by(|a, b| b.solved_at.cmp(&a.solved_at));
        Ok(solves)
    }

    async fn all_solves(&self) -> Result<Vec<SolveRecord>, StoreError> {
        track_db_operation("find", SOLVES, async {
            let cursor = self.solves().find(doc! {}).await.map_err(backend)?;
            cursor.try_collect::<Vec<_>>().await.map_err(backend)
        })
        .await
    }
}

#[async_trait]
impl UserDirectory for MongoStore {
    async fn ensure_user(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        let created_at = mongodb::bson::to_bson(&profile.created_at)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        track_db_operation("upsert", USERS, async {
            self.users()
                .update_one(
                    doc! { "_id": &profile.id },
                    doc! {
                        "$setOnInsert": {
                            "username": &profile.username,
                            "email": &profile.email,
                            "created_at": created_at,
                        }
                    },
                )
                .with_options(UpdateOptions::builder().upsert(true).build())
                .await
                .map_err(backend)
        })
        .await?;

        self.get_user(&profile.id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", profile.id)))
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        track_db_operation("find_one", USERS, async {
            self.users()
                .find_one(doc! { "_id": id })
                .await
                .map_err(backend)
        })
        .await
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        track_db_operation("find", USERS, async {
            let cursor = self.users().find(doc! {}).await.map_err(backend)?;
            cursor.try_collect::<Vec<_>>().await.map_err(backend)
        })
        .await
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        track_db_operation("count", USERS, async {
            self.users()
                .count_documents(doc! {})
                .await
                .map_err(backend)
        })
        .await
    }
}
