mod common;

use axum::http::StatusCode;
use base64::{engine::general_purpose, Engine as _};
use flagforge_api::store::ChallengeStore;
use serde_json::json;

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = common::create_test_app();
    let player = common::token("player-id", "player");

    let (status, _) = common::send(&app.router, common::get("/admin/stats", Some(&player))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::send(&app.router, common::get("/admin/stats", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_platform_stats() {
    let app = common::create_test_app();
    app.store.put_challenge(common::challenge(1, "CTF{a}", 100)).unwrap();
    app.store.put_challenge(common::challenge(2, "CTF{b}", 200)).unwrap();
    let alice = common::token("alice-id", "alice");
    let bob = common::token("bob-id", "bob");

    common::send(&app.router, common::submit(&alice, 1, "CTF{a}")).await;
    common::send(&app.router, common::submit(&alice, 2, "nope")).await;
    common::send(&app.router, common::submit(&bob, 1, "nope")).await;

    let admin = common::admin_token("root");
    let (status, json) = common::send(&app.router, common::get("/admin/stats", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_users"], 2);
    assert_eq!(json["total_challenges"], 2);
    assert_eq!(json["total_submissions"], 3);
}

#[tokio::test]
async fn test_admin_user_listing_reports_live_totals() {
    let app = common::create_test_app();
    app.store.put_challenge(common::challenge(1, "CTF{a}", 100)).unwrap();
    app.store.put_challenge(common::challenge(2, "CTF{b}", 200)).unwrap();
    let alice = common::token("alice-id", "alice");
    let bob = common::token("bob-id", "bob");

    common::send(&app.router, common::submit(&alice, 1, "CTF{a}")).await;
    common::send(&app.router, common::submit(&alice, 2, "CTF{b}")).await;
    common::send(&app.router, common::submit(&bob, 1, "wrong")).await;

    let (status, _) = common::send(&app.router, common::get("/admin/users", Some(&bob))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = common::admin_token("root");
    let (status, json) = common::send(&app.router, common::get("/admin/users", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);

    let users = json.as_array().unwrap();
    assert_eq!(users.len(), 2);
    let alice_row = users.iter().find(|u| u["user_id"] == "alice-id").unwrap();
    assert_eq!(alice_row["points"], 300);
    assert_eq!(alice_row["solves"], 2);
    assert_eq!(alice_row["rank"], 1);
    assert_eq!(alice_row["email"], "alice@example.com");
    let bob_row = users.iter().find(|u| u["user_id"] == "bob-id").unwrap();
    assert_eq!(bob_row["points"], 0);
    assert_eq!(bob_row["rank"], 2);
}

#[tokio::test]
async fn test_reconcile_rebuilds_solve_counters() {
    let app = common::create_test_app();
    app.store.put_challenge(common::challenge(1, "CTF{a}", 100)).unwrap();
    app.store.put_challenge(common::challenge(2, "CTF{b}", 200)).unwrap();
    let alice = common::token("alice-id", "alice");
    let bob = common::token("bob-id", "bob");

    common::send(&app.router, common::submit(&alice, 1, "CTF{a}")).await;
    common::send(&app.router, common::submit(&bob, 1, "CTF{a}")).await;

    // simulate a lost increment and a stale counter
    app.store.set_solves(1, 1).await.unwrap();
    app.store.set_solves(2, 4).await.unwrap();

    let admin = common::admin_token("root");
    let (status, json) = common::send(
        &app.router,
        common::post_json("/admin/reconcile-solves", Some(&admin), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            { "challenge_id": 1, "previous": 1, "actual": 2 },
            { "challenge_id": 2, "previous": 4, "actual": 0 }
        ])
    );
    assert_eq!(app.store.get_challenge(1).await.unwrap().unwrap().solves, 2);
    assert_eq!(app.store.get_challenge(2).await.unwrap().unwrap().solves, 0);
}

#[tokio::test]
async fn test_health_and_metrics_endpoints() {
    let app = common::create_test_app();

    let (status, json) = common::send(&app.router, common::get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");

    let (status, _) = common::send(&app.router, common::get("/metrics", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let credentials = general_purpose::STANDARD.encode(&app.state.config.metrics_auth);
    let request = axum::http::Request::builder()
        .uri("/metrics")
        .header("authorization", format!("Basic {}", credentials))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_me_returns_profile_from_token() {
    let app = common::create_test_app();
    let alice = common::token("alice-id", "alice");

    let (status, json) = common::send(&app.router, common::get("/api/v1/me", Some(&alice))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["_id"], "alice-id");
    assert_eq!(json["username"], "alice");
    assert_eq!(json["email"], "alice@example.com");
}
