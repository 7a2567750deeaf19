use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile of an identity issued by the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
