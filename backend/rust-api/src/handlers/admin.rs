use axum::{extract::State, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use super::ApiError;
use crate::{
    middlewares::auth::JwtClaims,
    services::{admin_service::AdminService, scoring_service::ScoringService, AppState},
};

/// GET /admin/stats
pub async fn platform_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = AdminService::new(state.stores.clone())
        .platform_stats()
        .await?;
    Ok(Json(stats))
}

/// GET /admin/users - Every user with live points and solves
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let users = AdminService::new(state.stores.clone()).list_users().await?;
    Ok(Json(users))
}

/// POST /admin/reconcile-solves - Rebuild challenge solve counters from solve records
pub async fn reconcile_solves(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Solve counter reconciliation requested by {}", claims.sub);
    let corrections = ScoringService::new(state.stores.clone())
        .reconcile_solve_counts()
        .await?;
    Ok(Json(corrections))
}
