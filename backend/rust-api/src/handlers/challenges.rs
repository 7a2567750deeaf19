use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use super::ApiError;
use crate::{
    extractors::{AppJson, AppQuery},
    middlewares::auth::JwtClaims,
    models::{
        challenge::{ChallengeId, ListChallengesQuery},
        submission::SubmitFlagRequest,
    },
    services::{
        challenge_service::ChallengeService, identity_service::IdentityService,
        scoring_service::ScoringService, AppState,
    },
};

/// GET /api/v1/challenges - List challenges, optionally by category
pub async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppQuery(query): AppQuery<ListChallengesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let service = ChallengeService::new(state.stores.clone());
    let challenges = service.list_challenges(&claims.sub, category).await?;
    Ok(Json(challenges))
}

/// GET /api/v1/challenges/{id}
pub async fn get_challenge(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(challenge_id): Path<ChallengeId>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ChallengeService::new(state.stores.clone());
    let challenge = service.get_challenge(&claims.sub, challenge_id).await?;
    Ok(Json(challenge))
}

/// POST /api/v1/challenges/{id}/submit - Submit a flag
pub async fn submit_flag(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(challenge_id): Path<ChallengeId>,
    AppJson(req): AppJson<SubmitFlagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    tracing::info!(
        "Flag submitted: user={}, challenge={}",
        claims.sub,
        challenge_id
    );

    let service = ScoringService::new(state.stores.clone());
    let result = service
        .submit_flag(&claims.sub, challenge_id, &req.flag)
        .await?;

    // Submitters show up on the leaderboard even with zero points. The
    // submission is already recorded, so a failure here is not reported back.
    if let Err(e) = IdentityService::new(state.stores.clone())
        .ensure_profile(&claims)
        .await
    {
        tracing::warn!("Failed to record profile for {}: {}", claims.sub, e);
    }

    Ok(Json(result))
}
