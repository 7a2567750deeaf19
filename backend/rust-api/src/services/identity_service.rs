use chrono::Utc;

use super::error::ServiceError;
use crate::middlewares::auth::JwtClaims;
use crate::models::user::UserProfile;
use crate::store::Stores;

/// Bridges identities issued by the external identity provider into the
/// local user directory.
pub struct IdentityService {
    stores: Stores,
}

impl IdentityService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Records the caller's profile on first sight and returns the stored one.
    pub async fn ensure_profile(&self, claims: &JwtClaims) -> Result<UserProfile, ServiceError> {
        let profile = UserProfile {
            id: claims.sub.clone(),
            username: display_name(claims),
            email: claims.email.clone(),
            created_at: Utc::now(),
        };
        Ok(self.stores.users.ensure_user(&profile).await?)
    }
}

fn display_name(claims: &JwtClaims) -> String {
    claims
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| claims.email.split('@').next().filter(|local| !local.is_empty()))
        .unwrap_or(&claims.sub)
        .to_string()
}
