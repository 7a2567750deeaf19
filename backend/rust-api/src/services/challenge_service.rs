use std::collections::HashSet;

use super::error::ServiceError;
use crate::models::challenge::{ChallengeId, ChallengeView};
use crate::store::Stores;
use crate::utils::retry::{retry_async_with_config, RetryConfig};

pub struct ChallengeService {
    stores: Stores,
}

impl ChallengeService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn list_challenges(
        &self,
        user_id: &str,
        category: Option<&str>,
    ) -> Result<Vec<ChallengeView>, ServiceError> {
        let challenges = retry_async_with_config(RetryConfig::default(), || {
            self.stores.challenges.list_challenges(category)
        })
        .await?;
        let solved: HashSet<ChallengeId> = self.solved_challenge_ids(user_id).await?.into_iter().collect();

        Ok(challenges
            .into_iter()
            .map(|challenge| {
                let is_solved = solved.contains(&challenge.id);
                ChallengeView::from_challenge(challenge, is_solved)
            })
            .collect())
    }

    pub async fn get_challenge(
        &self,
        user_id: &str,
        challenge_id: ChallengeId,
    ) -> Result<ChallengeView, ServiceError> {
        let challenge = retry_async_with_config(RetryConfig::default(), || {
            self.stores.challenges.get_challenge(challenge_id)
        })
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Challenge {} not found", challenge_id)))?;

        let solved = self.stores.solves.exists(user_id, challenge_id).await?;
        Ok(ChallengeView::from_challenge(challenge, solved))
    }

    /// Ids of every challenge the user has been credited for, ascending.
    pub async fn solved_challenge_ids(&self, user_id: &str) -> Result<Vec<ChallengeId>, ServiceError> {
        let solves = retry_async_with_config(RetryConfig::default(), || {
            self.stores.solves.solves_for_user(user_id)
        })
        .await?;

        let mut ids: Vec<ChallengeId> = solves.into_iter().map(|s| s.challenge_id).collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
