use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::client_ip::ClientIp;
use crate::extractors::params::{AppPath, AppQuery};
use crate::ledger::PageRequest;
use crate::models::image::{DeleteImageResponse, ImageListResponse, ImageResponse, UploadResponse};
use crate::models::shared::{PageQuery, Pagination};
use crate::state::AppState;
use crate::upload::{UploadWorkflow, Uploader};
use crate::utils::filename::upload_filename;
use crate::utils::url::base_url;

/// Default page size for a user's own listing.
const DEFAULT_PAGE_SIZE: u64 = 10;

/// Multipart framing overhead allowed on top of the image limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_size: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_size.saturating_add(MULTIPART_OVERHEAD))
}

fn multipart_error(e: MultipartError, max_size: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(max_size)
    } else {
        AppError::Validation(format!("Multipart error: {}", e.body_text()))
    }
}

/// Upload an image.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Stores the `image` multipart field. Identical bytes are stored once; \
        uploading content you already own returns the existing record with `existing = true`.",
    request_body(content_type = "multipart/form-data", description = "Form with an `image` file field"),
    responses(
        (status = 200, description = "Stored or already present", body = UploadResponse),
        (status = 400, description = "Missing or empty field (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 502, description = "Blob store failed (UPSTREAM_UNAVAILABLE)", body = ErrorBody),
        (status = 500, description = "Record not saved (PERSISTENCE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user, state, headers, multipart), fields(user_id = %auth_user.user_id, ip = %ip))]
pub async fn upload_image(
    auth_user: AuthUser,
    ClientIp(ip): ClientIp,
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let max_size = state.config.upload.max_size;
    let mut upload: Option<(Bytes, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        if field.name() != Some("image") {
            continue; // Ignore unknown fields.
        }
        let filename = upload_filename(field.file_name());
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_size))?;
        if data.len() > max_size {
            return Err(AppError::PayloadTooLarge(max_size));
        }
        upload = Some((data, filename));
    }

    let (data, filename) =
        upload.ok_or_else(|| AppError::Validation("Missing 'image' field".into()))?;

    let outcome = UploadWorkflow::new(&state.ledger, state.blob_store.as_ref(), max_size)
        .run(
            data,
            &filename,
            Uploader {
                user_id: &auth_user.user_id,
                origin_addr: &ip,
            },
        )
        .await?;

    let base = base_url(state.config.server.public_url.as_deref(), &headers);
    Ok(Json(UploadResponse::new(outcome, &base)))
}

/// List the caller's images.
#[utoipa::path(
    get,
    path = "/list",
    tag = "Images",
    operation_id = "listImages",
    summary = "List my images",
    description = "Newest first. `page_size` defaults to 10 and is clamped to 100.",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of images", body = ImageListResponse),
        (status = 400, description = "Bad query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user, state, headers, query), fields(user_id = %auth_user.user_id))]
pub async fn list_images(
    auth_user: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<ImageListResponse>, AppError> {
    let page = PageRequest::new(query.page, query.page_size, DEFAULT_PAGE_SIZE);
    let (entries, total) = state
        .ledger
        .list_images_for_owner(&auth_user.user_id, page)
        .await?;

    let base = base_url(state.config.server.public_url.as_deref(), &headers);
    Ok(Json(ImageListResponse::new(
        entries,
        Pagination::new(page, total),
        &base,
    )))
}

/// Get one image.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Get an image",
    description = "Visible to its owner and to admins.",
    params(("id" = i64, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image", body = ImageResponse),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user, state, headers), fields(user_id = %auth_user.user_id))]
pub async fn get_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    AppPath(id): AppPath<i64>,
) -> Result<Json<ImageResponse>, AppError> {
    let entry = state
        .ledger
        .find_image_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".into()))?;
    auth_user.require_owner_or_admin(&entry.image.user_id)?;

    let base = base_url(state.config.server.public_url.as_deref(), &headers);
    Ok(Json(ImageResponse::new(entry, &base)))
}

/// Delete an image.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Images",
    operation_id = "deleteImage",
    summary = "Delete an image",
    description = "Removes the caller's ownership link. Admins may delete any image. \
        The stored blob is kept, since other users may own the same content.",
    params(("id" = i64, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Deleted", body = DeleteImageResponse),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user, state), fields(user_id = %auth_user.user_id))]
pub async fn delete_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<DeleteImageResponse>, AppError> {
    let entry = state
        .ledger
        .find_image_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".into()))?;
    auth_user.require_owner_or_admin(&entry.image.user_id)?;

    // A concurrent delete between the lookup and here surfaces as NOT_FOUND.
    state.ledger.delete_image(id).await?;
    info!(image_id = id, owner = %entry.image.user_id, "Image deleted");

    Ok(Json(DeleteImageResponse {
        message: "Image deleted".into(),
        id,
    }))
}
