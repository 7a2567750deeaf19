use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use super::error::ServiceError;
use crate::metrics::{
    DUPLICATE_SOLVES_TOTAL, FLAG_SUBMISSIONS_TOTAL, SOLVES_CREATED_TOTAL,
    SOLVE_COUNTER_FAILURES_TOTAL,
};
use crate::models::{
    challenge::ChallengeId,
    leaderboard::SolveCountCorrection,
    solve::SolveInsert,
    submission::{Submission, SubmissionResult},
};
use crate::store::Stores;
use crate::utils::retry::{retry_async_with_config, RetryConfig};

pub struct ScoringService {
    stores: Stores,
}

impl ScoringService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Validates a flag and grants first-solve credit at most once per
    /// (user, challenge). Every attempt is written to the ledger before any
    /// solve state is touched.
    pub async fn submit_flag(
        &self,
        user_id: &str,
        challenge_id: ChallengeId,
        flag: &str,
    ) -> Result<SubmissionResult, ServiceError> {
        tracing::info!(
            "Processing flag submission: user={}, challenge={}, flag_len={}",
            user_id,
            challenge_id,
            flag.len()
        );

        if flag.trim().is_empty() {
            return Err(ServiceError::Validation("Flag must not be empty".to_string()));
        }

        let challenge = retry_async_with_config(RetryConfig::default(), || {
            self.stores.challenges.get_challenge(challenge_id)
        })
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Challenge {} not found", challenge_id)))?;

        let is_correct = challenge.accepts_flag(flag);
        let now = Utc::now();

        // Ledger writes are not retried: a retry after an unacknowledged
        // success would duplicate the row.
        let submission = Submission {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            challenge_id,
            flag: flag.to_string(),
            correct: is_correct,
            submitted_at: now,
        };
        self.stores.ledger.append(&submission).await.map_err(|e| {
            tracing::error!(
                "Failed to append submission {} to ledger: {}",
                submission.id,
                e
            );
            e
        })?;

        if !is_correct {
            FLAG_SUBMISSIONS_TOTAL
                .with_label_values(&["incorrect"])
                .inc();
            tracing::info!(
                "Incorrect flag: user={}, challenge={}",
                user_id,
                challenge_id
            );
            return Ok(SubmissionResult::incorrect());
        }

        match self
            .stores
            .solves
            .create_if_absent(user_id, challenge_id, now)
            .await?
        {
            SolveInsert::AlreadyPresent => {
                FLAG_SUBMISSIONS_TOTAL
                    .with_label_values(&["already_solved"])
                    .inc();
                DUPLICATE_SOLVES_TOTAL.inc();
                tracing::info!(
                    "Repeated solve ignored: user={}, challenge={}",
                    user_id,
                    challenge_id
                );
                Ok(SubmissionResult::already_solved())
            }
            SolveInsert::Created => {
                // The solve record is the source of truth; the counter is a
                // cache that reconcile_solve_counts can rebuild.
                if let Err(e) = self.stores.challenges.increment_solves(challenge_id).await {
                    SOLVE_COUNTER_FAILURES_TOTAL.inc();
                    tracing::error!(
                        "Solve recorded but counter increment failed: challenge={}, error={}",
                        challenge_id,
                        e
                    );
                }

                FLAG_SUBMISSIONS_TOTAL
                    .with_label_values(&["solved"])
                    .inc();
                SOLVES_CREATED_TOTAL.inc();
                tracing::info!(
                    "Challenge solved: user={}, challenge={}, points={}",
                    user_id,
                    challenge_id,
                    challenge.points
                );
                Ok(SubmissionResult::solved(challenge.points))
            }
        }
    }

    /// Rewrites every challenge's solve counter that disagrees with the number
    /// of solve records for it.
    pub async fn reconcile_solve_counts(&self) -> Result<Vec<SolveCountCorrection>, ServiceError> {
        let solves = self.stores.solves.all_solves().await?;
        let challenges = self.stores.challenges.list_challenges(None).await?;

        let mut actual: HashMap<ChallengeId, u32> = HashMap::new();
        for solve in &solves {
            *actual.entry(solve.challenge_id).or_default() += 1;
        }

        let mut corrections = Vec::new();
        for challenge in challenges {
            let count = actual.get(&challenge.id).copied().unwrap_or(0);
            if count == challenge.solves {
                continue;
            }
            self.stores
                .challenges
                .set_solves(challenge.id, count)
                .await?;
            tracing::warn!(
                "Solve counter corrected: challenge={}, previous={}, actual={}",
                challenge.id,
                challenge.solves,
                count
            );
            corrections.push(SolveCountCorrection {
                challenge_id: challenge.id,
                previous: challenge.solves,
                actual: count,
            });
        }

        corrections.sort_by_key(|c| c.challenge_id);
        Ok(corrections)
    }
}
