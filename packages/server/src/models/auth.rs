use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::user;

/// Provider authorization URL, returned to clients that ask for JSON.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AuthUrlResponse {
    #[schema(
        example = "https://github.com/login/oauth/authorize?client_id=abc&redirect_uri=...&scope=read%3Auser"
    )]
    pub url: String,
}

/// Query string of the provider's redirect back to us.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    /// Authorization code issued by the provider.
    pub code: Option<String>,
}

/// Successful login.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// HS256 bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    /// External identity the token is bound to.
    #[schema(example = "583231")]
    pub user_id: String,
    #[schema(example = "octocat")]
    pub username: String,
    /// Frontend URL carrying the same values as query parameters.
    pub redirect_url: String,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    /// Local account ID.
    #[schema(example = 7)]
    pub id: i64,
    /// External identity (matches the token's `user_id`).
    #[schema(example = "583231")]
    pub user_id: String,
    #[schema(example = "octocat")]
    pub username: String,
    /// Whether the caller is on the admin allowlist.
    pub is_admin: bool,
    pub last_login: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl MeResponse {
    pub fn new(user: user::Model, is_admin: bool) -> Self {
        Self {
            id: user.id,
            user_id: user.github_id,
            username: user.username,
            is_admin,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
