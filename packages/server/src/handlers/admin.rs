use axum::{Json, extract::State, http::HeaderMap};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::extractors::params::AppQuery;
use crate::ledger::PageRequest;
use crate::models::admin::{AdminImageQuery, StatsResponse};
use crate::models::image::ImageListResponse;
use crate::models::shared::Pagination;
use crate::state::AppState;
use crate::utils::url::base_url;

/// Default page size for the admin listing.
const DEFAULT_PAGE_SIZE: u64 = 20;

/// Treat `?user_id=` the same as an absent filter.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[utoipa::path(
    get,
    path = "/images",
    tag = "Admin",
    operation_id = "adminListImages",
    summary = "List all images",
    description = "Newest first, optionally filtered by owner and upload address. \
        `page_size` defaults to 20 and is clamped to 100. Requires admin.",
    params(AdminImageQuery),
    responses(
        (status = 200, description = "Page of images", body = ImageListResponse),
        (status = 400, description = "Bad query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(admin, state, headers, query), fields(admin = %admin.0.user_id))]
pub async fn list_images(
    admin: AdminUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    AppQuery(query): AppQuery<AdminImageQuery>,
) -> Result<Json<ImageListResponse>, AppError> {
    let page = PageRequest::new(query.page, query.page_size, DEFAULT_PAGE_SIZE);
    let (entries, total) = state
        .ledger
        .filter_images(non_empty(&query.user_id), non_empty(&query.upload_ip), page)
        .await?;

    let base = base_url(state.config.server.public_url.as_deref(), &headers);
    Ok(Json(ImageListResponse::new(
        entries,
        Pagination::new(page, total),
        &base,
    )))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Admin",
    operation_id = "adminStats",
    summary = "Usage statistics",
    description = "Totals, today's uploads (since midnight UTC), distinct owners and the top 10 \
        owners by image count. Requires admin.",
    responses(
        (status = 200, description = "Statistics", body = StatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(admin, state), fields(admin = %admin.0.user_id))]
pub async fn stats(
    admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.ledger.compute_stats().await?;
    Ok(Json(stats.into()))
}
