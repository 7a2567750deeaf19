use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::error::ServiceError;
use crate::metrics::LEADERBOARD_COMPUTE_DURATION_SECONDS;
use crate::models::{
    challenge::{Challenge, ChallengeId},
    leaderboard::{LeaderboardEntry, RecentSolve, UserStats, RECENT_SOLVES_LIMIT},
    solve::SolveRecord,
    user::UserProfile,
};
use crate::store::Stores;
use crate::utils::retry::{retry_async_with_config, RetryConfig};

/// Consistent read of everything the ranking joins over.
struct ScoringSnapshot {
    users: Vec<UserProfile>,
    solves: Vec<SolveRecord>,
    challenges: HashMap<ChallengeId, Challenge>,
}

pub struct LeaderboardService {
    stores: Stores,
}

impl LeaderboardService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Recomputes the ranking from solve state and current challenge points.
    pub async fn get_leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let timer = LEADERBOARD_COMPUTE_DURATION_SECONDS.start_timer();
        let snapshot = self.load_snapshot().await?;
        let mut ranking = rank_users(&snapshot.users, &snapshot.solves, &snapshot.challenges);
        timer.observe_duration();

        ranking.truncate(limit as usize);
        Ok(ranking)
    }

    /// The complete ranking together with the profiles it was computed from.
    pub async fn full_ranking(
        &self,
    ) -> Result<(Vec<LeaderboardEntry>, Vec<UserProfile>), ServiceError> {
        let snapshot = self.load_snapshot().await?;
        let ranking = rank_users(&snapshot.users, &snapshot.solves, &snapshot.challenges);
        Ok((ranking, snapshot.users))
    }

    pub async fn get_user_stats(&self, user_id: &str) -> Result<UserStats, ServiceError> {
        let snapshot = self.load_snapshot().await?;
        let ranking = rank_users(&snapshot.users, &snapshot.solves, &snapshot.challenges);

        // Located by identity; several users may share a points total.
        let entry = ranking
            .into_iter()
            .find(|entry| entry.user_id == user_id)
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        let mut own: Vec<&SolveRecord> = snapshot
            .solves
            .iter()
            .filter(|solve| solve.user_id == user_id)
            .collect();
        own.sort_by(|a, b| b.solved_at.cmp(&a.solved_at));

        let recent_solves = own
            .into_iter()
            .filter_map(|solve| {
                snapshot
                    .challenges
                    .get(&solve.challenge_id)
                    .map(|challenge| RecentSolve {
                        challenge_id: challenge.id,
                        title: challenge.title.clone(),
                        category: challenge.category.clone(),
                        points: challenge.points,
                        solved_at: solve.solved_at,
                    })
            })
            .take(RECENT_SOLVES_LIMIT)
            .collect();

        Ok(UserStats {
            user_id: entry.user_id,
            username: entry.username,
            solves: entry.solves,
            points: entry.points,
            rank: entry.rank,
            recent_solves,
        })
    }

    async fn load_snapshot(&self) -> Result<ScoringSnapshot, ServiceError> {
        let cfg = RetryConfig::default();

        let users =
            retry_async_with_config(cfg.clone(), || self.stores.users.list_users()).await?;
        let solves =
            retry_async_with_config(cfg.clone(), || self.stores.solves.all_solves()).await?;
        let challenges = retry_async_with_config(cfg, || {
            self.stores.challenges.list_challenges(None)
        })
        .await?;

        Ok(ScoringSnapshot {
            users,
            solves,
            challenges: challenges.into_iter().map(|c| (c.id, c)).collect(),
        })
    }
}

struct Tally {
    user_id: String,
    username: String,
    points: u64,
    solves: u32,
    last_solved_at: Option<DateTime<Utc>>,
}

/// Joins solve records with challenge points and ranks every user.
///
/// Ordering: points descending, then whoever reached that total first (earlier
/// latest solve; users without solves last), then username, then user id.
/// Ranks are the 1-based positions in that order. Solves whose challenge no
/// longer exists count towards `solves` but add no points.
pub fn rank_users(
    users: &[UserProfile],
    solves: &[SolveRecord],
    challenges: &HashMap<ChallengeId, Challenge>,
) -> Vec<LeaderboardEntry> {
    let mut tallies: HashMap<&str, Tally> = users
        .iter()
        .map(|user| {
            (
                user.id.as_str(),
                Tally {
                    user_id: user.id.clone(),
                    username: user.username.clone(),
                    points: 0,
                    solves: 0,
                    last_solved_at: None,
                },
            )
        })
        .collect();

    for solve in solves {
        let tally = tallies
            .entry(solve.user_id.as_str())
            .or_insert_with(|| Tally {
                user_id: solve.user_id.clone(),
                username: solve.user_id.clone(),
                points: 0,
                solves: 0,
                last_solved_at: None,
            });
        tally.points += challenges
            .get(&solve.challenge_id)
            .map(|c| u64::from(c.points))
            .unwrap_or(0);
        tally.solves += 1;
        tally.last_solved_at = tally.last_solved_at.max(Some(solve.solved_at));
    }

    let mut tallies: Vec<Tally> = tallies.into_values().collect();
    tallies.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| reached_first(a.last_solved_at, b.last_solved_at))
            .then_with(|| a.username.cmp(&b.username))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    tallies
        .into_iter()
        .enumerate()
        .map(|(index, tally)| LeaderboardEntry {
            rank: index as u32 + 1,
            user_id: tally.user_id,
            username: tally.username,
            points: tally.points,
            solves: tally.solves,
        })
        .collect()
}

fn reached_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::challenge::Difficulty;
    use chrono::Duration;

    fn user(id: &str, username: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            created_at: Utc::now(),
        }
    }

    fn challenge(id: ChallengeId, points: u32) -> (ChallengeId, Challenge) {
        (
            id,
            Challenge {
                id,
                title: format!("challenge {}", id),
                description: String::new(),
                category: "misc".to_string(),
                difficulty: Difficulty::Hard,
                points,
                flag: "CTF{x}".to_string(),
                solves: 0,
                hints: vec![],
                files: vec![],
                created_at: Utc::now(),
            },
        )
    }

    fn solve(user_id: &str, challenge_id: ChallengeId, minutes_ago: i64) -> SolveRecord {
        SolveRecord::new(
            user_id,
            challenge_id,
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    #[test]
    fn sums_live_points_and_counts_solves() {
        let users = vec![user("u1", "alice"), user("u2", "bob"), user("u3", "carol")];
        let challenges: HashMap<_, _> = [challenge(1, 100), challenge(2, 250)].into();
        let solves = vec![solve("u1", 1, 10), solve("u1", 2, 5), solve("u2", 2, 3)];

        let ranking = rank_users(&users, &solves, &challenges);

        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking[0].username, "alice");
        assert_eq!(ranking[0].points, 350);
        assert_eq!(ranking[0].solves, 2);
        assert_eq!(ranking[1].username, "bob");
        assert_eq!(ranking[1].points, 250);
        assert_eq!(ranking[2].username, "carol");
        assert_eq!(ranking[2].points, 0);
        assert_eq!(ranking[2].solves, 0);
        let ranks: Vec<u32> = ranking.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn ties_go_to_whoever_reached_the_total_first() {
        let users = vec![user("u1", "alice"), user("u2", "bob")];
        let challenges: HashMap<_, _> = [challenge(1, 100), challenge(2, 100)].into();
        // bob reached 100 earlier than alice did
        let solves = vec![solve("u1", 1, 5), solve("u2", 2, 30)];

        let ranking = rank_users(&users, &solves, &challenges);
        assert_eq!(ranking[0].username, "bob");
        assert_eq!(ranking[1].username, "alice");
    }

    #[test]
    fn zero_point_ties_fall_back_to_username() {
        let users = vec![user("u2", "zed"), user("u1", "amy"), user("u3", "max")];
        let ranking = rank_users(&users, &[], &HashMap::new());
        let names: Vec<&str> = ranking.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["amy", "max", "zed"]);
    }

    #[test]
    fn solves_without_profile_still_rank() {
        let challenges: HashMap<_, _> = [challenge(1, 100)].into();
        let ranking = rank_users(&[], &[solve("ghost", 1, 1)], &challenges);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].user_id, "ghost");
        assert_eq!(ranking[0].username, "ghost");
        assert_eq!(ranking[0].points, 100);
    }

    #[test]
    fn removed_challenge_counts_as_solve_without_points() {
        let users = vec![user("u1", "alice")];
        let ranking = rank_users(&users, &[solve("u1", 42, 1)], &HashMap::new());
        assert_eq!(ranking[0].solves, 1);
        assert_eq!(ranking[0].points, 0);
    }
}
