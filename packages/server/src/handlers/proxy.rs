use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::params::AppPath;
use crate::state::AppState;

/// Stored blobs never change, so clients may cache them indefinitely.
const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Stream a stored image.
#[utoipa::path(
    get,
    path = "/image/{file_id}",
    tag = "Proxy",
    operation_id = "proxyImage",
    summary = "Fetch image bytes",
    description = "Streams the blob stored under `file_id` (the handle returned by upload). \
        No authentication: the handle acts as a capability. Responses carry a strong ETag \
        derived from the content hash and honour `If-None-Match`.",
    params(("file_id" = String, Path, description = "Blob handle")),
    responses(
        (status = 200, description = "Blob bytes"),
        (status = 304, description = "Not modified"),
        (status = 404, description = "Unknown handle (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Blob store failed (UPSTREAM_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn proxy_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppPath(file_id): AppPath<String>,
) -> Result<Response, AppError> {
    let file = state
        .ledger
        .find_file_by_blob_handle(&file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".into()))?;

    let etag_value = format!("\"{}\"", file.content_hash);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && etag_matches(val, &etag_value)
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let download = state.blob_store.open(&file.telegram_file_id).await?;
    let content_type = download
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    debug!(content_type = %content_type, length = ?download.content_length, "Streaming blob");

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&content_type, &file.telegram_file_id),
        )
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .header(header::ETAG, &etag_value);
    if let Some(length) = download.content_length {
        response = response.header(header::CONTENT_LENGTH, length);
    }

    response
        .body(Body::from_stream(download.body))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Weak comparison against an `If-None-Match` list.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

/// Images render in the browser; anything else downloads as `image_<handle>`.
fn content_disposition_value(content_type: &str, handle: &str) -> String {
    if content_type.starts_with("image/") {
        return "inline".to_string();
    }

    let safe_handle: String = handle
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    format!("attachment; filename=\"image_{safe_handle}\"")
}
