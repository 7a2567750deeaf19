use axum::{extract::State, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use super::ApiError;
use crate::{
    middlewares::auth::JwtClaims,
    services::{identity_service::IdentityService, AppState},
};

/// GET /api/v1/me - Profile of the authenticated caller
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = IdentityService::new(state.stores.clone())
        .ensure_profile(&claims)
        .await?;
    Ok(Json(profile))
}
