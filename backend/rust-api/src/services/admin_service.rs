use std::collections::HashMap;

use super::error::ServiceError;
use super::leaderboard_service::LeaderboardService;
use crate::models::leaderboard::{PlatformStats, UserSummary};
use crate::store::Stores;

pub struct AdminService {
    stores: Stores,
}

impl AdminService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn platform_stats(&self) -> Result<PlatformStats, ServiceError> {
        let total_users = self.stores.users.count_users().await?;
        let total_challenges = self.stores.challenges.count_challenges().await?;
        let total_submissions = self.stores.ledger.count_submissions().await?;

        Ok(PlatformStats {
            total_users,
            total_challenges,
            total_submissions,
        })
    }

    /// Every known user with live points and solves, newest profiles first.
    /// Solvers without a profile follow, in rank order.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, ServiceError> {
        let (ranking, profiles) = LeaderboardService::new(self.stores.clone())
            .full_ranking()
            .await?;
        let profiles: HashMap<_, _> = profiles.into_iter().map(|p| (p.id.clone(), p)).collect();

        let mut users: Vec<UserSummary> = ranking
            .into_iter()
            .map(|entry| {
                let profile = profiles.get(&entry.user_id);
                UserSummary {
                    email: profile.map(|p| p.email.clone()),
                    created_at: profile.map(|p| p.created_at),
                    user_id: entry.user_id,
                    username: entry.username,
                    points: entry.points,
                    solves: entry.solves,
                    rank: entry.rank,
                }
            })
            .collect();

        users.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => y.cmp(&x).then(a.rank.cmp(&b.rank)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.rank.cmp(&b.rank),
        });

        tracing::debug!("Listed {} users for admin", users.len());
        Ok(users)
    }
}
