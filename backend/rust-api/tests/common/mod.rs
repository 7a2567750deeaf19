#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use flagforge_api::{
    config::{Config, StorageBackend},
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    models::challenge::{Challenge, ChallengeId, Difficulty},
    services::AppState,
    store::{MemoryStore, Stores},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub state: Arc<AppState>,
}

pub fn test_config() -> Config {
    Config {
        storage: StorageBackend::Memory,
        mongo_uri: "mongodb://unused".to_string(),
        mongo_database: "flagforge_test".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        leaderboard_default_limit: 50,
        metrics_auth: "metrics:secret".to_string(),
        otlp_endpoint: None,
    }
}

pub fn create_test_app() -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(
        test_config(),
        Stores::memory(store.clone()),
    ));

    TestApp {
        router: create_router(state.clone()),
        store,
        state,
    }
}

pub fn challenge(id: ChallengeId, flag: &str, points: u32) -> Challenge {
    Challenge {
        id,
        title: format!("Challenge {}", id),
        description: "Find the flag".to_string(),
        category: "misc".to_string(),
        difficulty: Difficulty::Easy,
        points,
        flag: flag.to_string(),
        solves: 0,
        hints: vec!["Look closer".to_string()],
        files: vec![],
        created_at: Utc::now(),
    }
}

pub fn token(user_id: &str, username: &str) -> String {
    token_with_role(user_id, username, "player")
}

pub fn admin_token(user_id: &str) -> String {
    token_with_role(user_id, user_id, "admin")
}

fn token_with_role(user_id: &str, username: &str, role: &str) -> String {
    let now = Utc::now().timestamp();
    JwtService::new(TEST_JWT_SECRET)
        .generate_token(JwtClaims {
            sub: user_id.to_string(),
            email: format!("{}@example.com", username),
            username: Some(username.to_string()),
            role: role.to_string(),
            exp: (now + 3600) as usize,
            iat: now as usize,
        })
        .expect("token generation")
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn submit(token: &str, challenge_id: ChallengeId, flag: &str) -> Request<Body> {
    post_json(
        &format!("/api/v1/challenges/{}/submit", challenge_id),
        Some(token),
        json!({ "flag": flag }),
    )
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}
