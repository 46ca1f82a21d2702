use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use bytes::Bytes;
use tracing::{error, instrument};

use crate::auth::session::Session;
use crate::error::{ApiError, Result};
use crate::listings::dto::{ImageResponse, ListingBody, UploadImageRequest};
use crate::listings::repo::{self, Listing, SearchFilter};
use crate::listings::services;
use crate::state::AppState;

const PRESIGN_TTL_SECS: u64 = 600;

/// GET /listings — all listings, or the filtered subset when any search
/// parameter is present. Both orderings are newest-first.
#[instrument(skip(state))]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<Vec<Listing>>> {
    let rows = if filter.is_empty() {
        repo::list_all(&state.db).await?
    } else {
        repo::search(&state.db, &filter).await?
    };
    Ok(Json(rows))
}

/// GET /listings/:id — public, unscoped read.
#[instrument(skip(state))]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Listing>> {
    let listing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFoundOrForbidden)?;
    Ok(Json(listing))
}

/// GET /listings/mine — the caller's own listings.
#[instrument(skip(state))]
pub async fn my_listings(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Listing>>> {
    let rows = repo::list_by_owner(&state.db, session.user_id()).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, body))]
pub async fn create_listing(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ListingBody>,
) -> Result<(StatusCode, Json<Listing>)> {
    let listing = services::create_listing(&state.db, session.user_id(), body).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

#[instrument(skip(state, body))]
pub async fn update_listing(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(body): Json<ListingBody>,
) -> Result<StatusCode> {
    services::update_listing(&state.db, id, session.user_id(), body).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_listing(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    services::delete_listing(&state.db, id, session.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /listings/:id/image — upload bytes through the storage
/// collaborator and persist the returned key on the listing. Ownership is
/// checked before any object is written; the final UPDATE carries the
/// ownership predicate again to cover the gap between check and write.
#[instrument(skip(state, body))]
pub async fn upload_image(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(body): Json<UploadImageRequest>,
) -> Result<Json<ImageResponse>> {
    if body.image.is_empty() {
        return Err(ApiError::Validation("image must be non-empty".into()));
    }
    let content_type = body
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    let listing = repo::find_by_id(&state.db, id).await?;
    services::require_owner(listing, session.user_id())?;

    let key = state
        .storage
        .store(id, Bytes::from(body.image.into_vec()), content_type)
        .await
        .map_err(|e| {
            error!(error = %e, listing_id = id, "image upload failed");
            ApiError::StorageUnavailable
        })?;

    let updated = repo::set_image_path(&state.db, id, session.user_id(), &key).await?;
    if !updated {
        // listing vanished between check and write: drop the orphaned object
        if let Err(e) = state.storage.remove(&key).await {
            error!(error = %e, key = %key, "orphaned image cleanup failed");
        }
        return Err(ApiError::NotFoundOrForbidden);
    }

    Ok(Json(ImageResponse { image_path: key }))
}

/// GET /listings/:id/image — 302 to a presigned URL for the photo.
#[instrument(skip(state))]
pub async fn get_image(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Redirect> {
    let listing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFoundOrForbidden)?;
    let key = listing.image_path.ok_or(ApiError::NotFoundOrForbidden)?;

    let url = state
        .storage
        .url(&key, PRESIGN_TTL_SECS)
        .await
        .map_err(|e| {
            error!(error = %e, key = %key, "presign failed");
            ApiError::StorageUnavailable
        })?;

    Ok(Redirect::temporary(&url))
}
