//! In-memory store. Thread-safe for tokio's multi-threaded runtime; every
//! operation runs under a single lock acquisition so conditional inserts and
//! counter increments are atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{ChallengeStore, SolveStore, StoreError, SubmissionLedger, UserDirectory};
use crate::models::{
    challenge::{Challenge, ChallengeId},
    solve::{SolveInsert, SolveRecord},
    submission::Submission,
    user::UserProfile,
};

#[derive(Default)]
pub struct MemoryStore {
    challenges: Mutex<BTreeMap<ChallengeId, Challenge>>,
    submissions: Mutex<Vec<Submission>>,
    solves: Mutex<HashMap<String, SolveRecord>>,
    users: Mutex<HashMap<String, UserProfile>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stand-in for the external challenge store's create/update.
    pub fn put_challenge(&self, challenge: Challenge) -> Result<(), StoreError> {
        lock(&self.challenges)?.insert(challenge.id, challenge);
        Ok(())
    }

    /// Stand-in for an admin editing a challenge's point value.
    pub fn set_points(&self, id: ChallengeId, points: u32) -> Result<(), StoreError> {
        let mut challenges = lock(&self.challenges)?;
        let challenge = challenges
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("challenge {}", id)))?;
        challenge.points = points;
        Ok(())
    }

    /// Snapshot of the ledger in append order.
    pub fn submissions(&self) -> Result<Vec<Submission>, StoreError> {
        Ok(lock(&self.submissions)?.clone())
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn get_challenge(&self, id: ChallengeId) -> Result<Option<Challenge>, StoreError> {
        Ok(lock(&self.challenges)?.get(&id).cloned())
    }

    async fn list_challenges(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<Challenge>, StoreError> {
        let mut list: Vec<Challenge> = lock(&self.challenges)?
            .values()
            .filter(|c| category.map_or(true, |cat| c.category == cat))
            .cloned()
            .collect();
        list.sort_by_key(|c| (c.points, c.id));
        Ok(list)
    }

    async fn increment_solves(&self, id: ChallengeId) -> Result<(), StoreError> {
        let mut challenges = lock(&self.challenges)?;
        let challenge = challenges
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("challenge {}", id)))?;
        challenge.solves += 1;
        Ok(())
    }

    async fn set_solves(&self, id: ChallengeId, solves: u32) -> Result<(), StoreError> {
        let mut challenges = lock(&self.challenges)?;
        let challenge = challenges
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("challenge {}", id)))?;
        challenge.solves = solves;
        Ok(())
    }

    async fn count_challenges(&self) -> Result<u64, StoreError> {
        Ok(lock(&self.challenges)?.len() as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        lock(&self.challenges).map(|_| ())
    }
}

#[async_trait]
impl SubmissionLedger for MemoryStore {
    async fn append(&self, submission: &Submission) -> Result<(), StoreError> {
        lock(&self.submissions)?.push(submission.clone());
        Ok(())
    }

    async fn count_submissions(&self) -> Result<u64, StoreError> {
        Ok(lock(&self.submissions)?.len() as u64)
    }
}

#[async_trait]
impl SolveStore for MemoryStore {
    async fn exists(&self, user_id: &str, challenge_id: ChallengeId) -> Result<bool, StoreError> {
        Ok(lock(&self.solves)?.contains_key(&SolveRecord::key(user_id, challenge_id)))
    }

    async fn create_if_absent(
        &self,
        user_id: &str,
        challenge_id: ChallengeId,
        solved_at: DateTime<Utc>,
    ) -> Result<SolveInsert, StoreError> {
        let record = SolveRecord::new(user_id, challenge_id, solved_at);
        let mut solves = lock(&self.solves)?;
        if solves.contains_key(&record.id) {
            return Ok(SolveInsert::AlreadyPresent);
        }
        solves.insert(record.id.clone(), record);
        Ok(SolveInsert::Created)
    }

    async fn solves_for_user(&self, user_id: &str) -> Result<Vec<SolveRecord>, StoreError> {
        let mut list: Vec<SolveRecord> = lock(&self.solves)?
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.solved_at.cmp(&a.solved_at));
        Ok(list)
    }

    async fn all_solves(&self) -> Result<Vec<SolveRecord>, StoreError> {
        Ok(lock(&self.solves)?.values().cloned().collect())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn ensure_user(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        let mut users = lock(&self.users)?;
        Ok(users
            .entry(profile.id.clone())
            .or_insert_with(|| profile.clone())
            .clone())
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(lock(&self.users)?.get(id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        Ok(lock(&self.users)?.values().cloned().collect())
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        Ok(lock(&self.users)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::challenge::Difficulty;

    fn challenge(id: ChallengeId, category: &str, points: u32) -> Challenge {
        Challenge {
            id,
            title: format!("challenge {}", id),
            description: String::new(),
            category: category.to_string(),
            difficulty: Difficulty::Medium,
            points,
            flag: format!("CTF{{{}}}", id),
            solves: 0,
            hints: vec![],
            files: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_if_absent_only_creates_once() {
        let store = MemoryStore::new();
        let now = Utc::now();

        assert!(!store.exists("alice", 1).await.unwrap());
        assert_eq!(
            store.create_if_absent("alice", 1, now).await.unwrap(),
            SolveInsert::Created
        );
        assert_eq!(
            store.create_if_absent("alice", 1, now).await.unwrap(),
            SolveInsert::AlreadyPresent
        );
        assert!(store.exists("alice", 1).await.unwrap());
        assert!(!store.exists("bob", 1).await.unwrap());
        assert_eq!(store.all_solves().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_orders_by_points_and_filters_category() {
        let store = MemoryStore::new();
        store.put_challenge(challenge(1, "web", 300)).unwrap();
        store.put_challenge(challenge(2, "pwn", 100)).unwrap();
        store.put_challenge(challenge(3, "web", 100)).unwrap();

        let all = store.list_challenges(None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        let web = store.list_challenges(Some("web")).await.unwrap();
        let ids: Vec<_> = web.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn increment_unknown_challenge_is_not_found() {
        let store = MemoryStore::new();
        let err = store.increment_solves(42).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn ensure_user_keeps_first_profile() {
        let store = MemoryStore::new();
        let first = UserProfile {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: Utc::now(),
        };
        let mut renamed = first.clone();
        renamed.username = "mallory".to_string();

        store.ensure_user(&first).await.unwrap();
        let kept = store.ensure_user(&renamed).await.unwrap();
        assert_eq!(kept.username, "alice");
        assert_eq!(store.list_users().await.unwrap().len(), 1);
        assert_eq!(store.count_users().await.unwrap(), 1);
    }
}
