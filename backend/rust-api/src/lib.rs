use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // The leaderboard is public and may be embedded by other sites
    let public_cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        .route(
            "/api/v1/leaderboard",
            get(handlers::leaderboard::get_leaderboard).layer(public_cors),
        )
        .nest(
            "/api/v1",
            player_routes().layer(middleware::from_fn_with_state(
                app_state.clone(),
                middlewares::auth::auth_middleware,
            )),
        )
        .nest(
            "/admin",
            admin_routes()
                .route_layer(middleware::from_fn(
                    middlewares::auth::admin_guard_middleware,
                ))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    middlewares::auth::auth_middleware,
                )),
        )
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn player_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(handlers::me::get_current_user))
        .route("/challenges", get(handlers::challenges::list_challenges))
        .route("/challenges/{id}", get(handlers::challenges::get_challenge))
        .route(
            "/challenges/{id}/submit",
            post(handlers::challenges::submit_flag),
        )
        .route("/users/{id}/stats", get(handlers::leaderboard::get_user_stats))
        .route(
            "/users/{id}/solved",
            get(handlers::leaderboard::get_solved_challenges),
        )
}

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(handlers::admin::platform_stats))
        .route("/users", get(handlers::admin::list_users))
        .route("/reconcile-solves", post(handlers::admin::reconcile_solves))
}
