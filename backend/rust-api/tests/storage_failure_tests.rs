mod common;

use async_trait::async_trait;
use axum::{http::StatusCode, Router};
use flagforge_api::{
    create_router,
    handlers::GENERIC_FAILURE_MESSAGE,
    metrics::SOLVE_COUNTER_FAILURES_TOTAL,
    models::{
        challenge::{Challenge, ChallengeId},
        submission::Submission,
    },
    services::AppState,
    store::{ChallengeStore, MemoryStore, SolveStore, StoreError, Stores, SubmissionLedger},
};
use serde_json::json;
use std::sync::Arc;

const BACKEND_DETAIL: &str = "connection reset by peer";

/// Ledger whose writes always fail.
struct BrokenLedger;

#[async_trait]
impl SubmissionLedger for BrokenLedger {
    async fn append(&self, _submission: &Submission) -> Result<(), StoreError> {
        Err(StoreError::Backend(BACKEND_DETAIL.to_string()))
    }

    async fn count_submissions(&self) -> Result<u64, StoreError> {
        Ok(0)
    }
}

/// Challenge store that serves reads but cannot bump solve counters.
struct StuckCounter(Arc<MemoryStore>);

#[async_trait]
impl ChallengeStore for StuckCounter {
    async fn get_challenge(&self, id: ChallengeId) -> Result<Option<Challenge>, StoreError> {
        self.0.get_challenge(id).await
    }

    async fn list_challenges(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<Challenge>, StoreError> {
        self.0.list_challenges(category).await
    }

    async fn increment_solves(&self, _id: ChallengeId) -> Result<(), StoreError> {
        Err(StoreError::Backend(BACKEND_DETAIL.to_string()))
    }

    async fn set_solves(&self, id: ChallengeId, solves: u32) -> Result<(), StoreError> {
        self.0.set_solves(id, solves).await
    }

    async fn count_challenges(&self) -> Result<u64, StoreError> {
        self.0.count_challenges().await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.0.ping().await
    }
}

fn router_with(stores: Stores) -> Router {
    create_router(Arc::new(AppState::new(common::test_config(), stores)))
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.put_challenge(common::challenge(1, "CTF{abc}", 100)).unwrap();
    store
}

#[tokio::test]
async fn test_ledger_failure_is_reported_generically() {
    let store = seeded_store();
    let router = router_with(Stores {
        ledger: Arc::new(BrokenLedger),
        ..Stores::memory(store.clone())
    });
    let alice = common::token("alice-id", "alice");

    let (status, body) = common::send(&router, common::submit(&alice, 1, "CTF{abc}")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "message": GENERIC_FAILURE_MESSAGE, "status": 500 })
    );
    assert!(!body.to_string().contains(BACKEND_DETAIL));

    // Nothing is credited when the attempt could not be recorded
    assert!(!store.exists("alice-id", 1).await.unwrap());
    assert_eq!(store.get_challenge(1).await.unwrap().unwrap().solves, 0);

    let (_, leaderboard) = common::send(&router, common::get("/api/v1/leaderboard", None)).await;
    assert_eq!(leaderboard, json!([]));
}

#[tokio::test]
async fn test_ledger_failure_is_not_reported_as_wrong_flag() {
    let store = seeded_store();
    let router = router_with(Stores {
        ledger: Arc::new(BrokenLedger),
        ..Stores::memory(store)
    });
    let alice = common::token("alice-id", "alice");

    let (status, body) = common::send(&router, common::submit(&alice, 1, "CTF{wrong}")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("correct").is_none());
    assert_eq!(body["message"], GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_counter_failure_still_credits_and_reconcile_repairs() {
    let store = seeded_store();
    let router = router_with(Stores {
        challenges: Arc::new(StuckCounter(store.clone())),
        ..Stores::memory(store.clone())
    });
    let alice = common::token("alice-id", "alice");
    let failures_before = SOLVE_COUNTER_FAILURES_TOTAL.get();

    let (status, body) = common::send(&router, common::submit(&alice, 1, "CTF{abc}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "solved");
    assert_eq!(body["points_awarded"], 100);
    assert!(store.exists("alice-id", 1).await.unwrap());
    assert_eq!(store.get_challenge(1).await.unwrap().unwrap().solves, 0);
    assert!(SOLVE_COUNTER_FAILURES_TOTAL.get() > failures_before);

    let (_, leaderboard) = common::send(&router, common::get("/api/v1/leaderboard", None)).await;
    assert_eq!(leaderboard[0]["points"], 100);

    let admin = common::admin_token("root");
    let (status, corrections) = common::send(
        &router,
        common::post_json("/admin/reconcile-solves", Some(&admin), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        corrections,
        json!([{ "challenge_id": 1, "previous": 0, "actual": 1 }])
    );
    assert_eq!(store.get_challenge(1).await.unwrap().unwrap().solves, 1);
}
