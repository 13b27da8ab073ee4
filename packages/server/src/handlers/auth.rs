use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use reqwest::Url;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::params::AppQuery;
use crate::models::auth::{AuthUrlResponse, CallbackQuery, LoginResponse, MeResponse};
use crate::state::AppState;
use crate::utils::jwt;

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Start the GitHub login.
#[utoipa::path(
    get,
    path = "/github",
    tag = "Auth",
    operation_id = "githubLogin",
    summary = "Start GitHub login",
    description = "Returns `{url}` when the request sends `Accept: application/json`; \
        otherwise answers with a 307 redirect to the GitHub authorization page.",
    responses(
        (status = 200, description = "Authorization URL", body = AuthUrlResponse),
        (status = 307, description = "Redirect to GitHub"),
        (status = 502, description = "Provider not configured (UPSTREAM_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn github_login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let url = state.identity_provider.authorize_url()?;

    if wants_json(&headers) {
        Ok(Json(AuthUrlResponse { url }).into_response())
    } else {
        Ok(Redirect::temporary(&url).into_response())
    }
}

/// Finish the GitHub login.
#[utoipa::path(
    get,
    path = "/github/callback",
    tag = "Auth",
    operation_id = "githubCallback",
    summary = "GitHub OAuth callback",
    description = "Exchanges the authorization code, creates or refreshes the local account and \
        issues a bearer token. JSON clients receive the token directly; browsers are redirected \
        (302) to the frontend callback with `token`, `user_id` and `username` query parameters.",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 302, description = "Redirect to the frontend callback"),
        (status = 400, description = "Missing or rejected code (VALIDATION_ERROR)", body = ErrorBody),
        (status = 502, description = "GitHub unreachable (UPSTREAM_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers, query))]
pub async fn github_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppQuery(query): AppQuery<CallbackQuery>,
) -> Result<Response, AppError> {
    let code = query
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing authorization code".into()))?;

    let identity = state.identity_provider.authenticate(&code).await?;
    let user = state.identities.upsert(&identity.id, &identity.login).await?;

    let auth = &state.config.auth;
    let token = jwt::sign(&user.github_id, &auth.jwt_secret, auth.token_ttl_hours)
        .map_err(|e| AppError::Internal(format!("Token signing failed: {e}")))?;

    let redirect_url = Url::parse_with_params(
        &state.config.github.frontend_callback,
        &[
            ("token", token.as_str()),
            ("user_id", user.github_id.as_str()),
            ("username", user.username.as_str()),
        ],
    )
    .map_err(|e| AppError::Internal(format!("Invalid github.frontend_callback: {e}")))?;

    info!(user_id = %user.github_id, username = %user.username, "User logged in");

    if wants_json(&headers) {
        Ok(Json(LoginResponse {
            token,
            user_id: user.github_id,
            username: user.username,
            redirect_url: redirect_url.into(),
        })
        .into_response())
    } else {
        Ok((StatusCode::FOUND, [(header::LOCATION, redirect_url.to_string())]).into_response())
    }
}

/// Get the current user's profile.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Get current user profile",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No local account for this identity (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = state
        .identities
        .find_by_external_id(&auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(MeResponse::new(user, auth_user.is_admin)))
}
