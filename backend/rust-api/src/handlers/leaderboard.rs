use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::ApiError;
use crate::{
    extractors::AppQuery,
    models::leaderboard::LeaderboardQuery,
    services::{
        challenge_service::ChallengeService, leaderboard_service::LeaderboardService, AppState,
    },
};

/// GET /api/v1/leaderboard?limit=50
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<LeaderboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query.validate()?;
    let limit = query
        .limit
        .unwrap_or(state.config.leaderboard_default_limit);

    let service = LeaderboardService::new(state.stores.clone());
    let entries = service.get_leaderboard(limit).await?;
    Ok(Json(entries))
}

/// GET /api/v1/users/{id}/stats
pub async fn get_user_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = LeaderboardService::new(state.stores.clone());
    let stats = service.get_user_stats(&user_id).await?;
    Ok(Json(stats))
}

/// GET /api/v1/users/{id}/solved
pub async fn get_solved_challenges(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ChallengeService::new(state.stores.clone());
    let ids = service.solved_challenge_ids(&user_id).await?;
    Ok(Json(ids))
}
