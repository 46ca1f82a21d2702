use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use crate::auth::session::Session;
use crate::error::Result;
use crate::listings::repo::Listing;
use crate::state::AppState;
use crate::watchlist::dto::{AddedResponse, RemovedResponse, WatchStatus};
use crate::watchlist::repo;

/// GET /watchlist — the caller's watched listings, newest entry first.
#[instrument(skip(state))]
pub async fn list_watchlist(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Listing>>> {
    let rows = repo::list_for_user(&state.db, session.user_id()).await?;
    Ok(Json(rows))
}

/// PUT /watchlist/:listing_id — idempotent; repeats report `added: false`.
#[instrument(skip(state))]
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    session: Session,
    Path(listing_id): Path<i64>,
) -> Result<Json<AddedResponse>> {
    let added = repo::add(&state.db, session.user_id(), listing_id).await?;
    Ok(Json(AddedResponse { added }))
}

#[instrument(skip(state))]
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    session: Session,
    Path(listing_id): Path<i64>,
) -> Result<Json<RemovedResponse>> {
    let removed = repo::remove(&state.db, session.user_id(), listing_id).await?;
    Ok(Json(RemovedResponse { removed }))
}

/// GET /watchlist/:listing_id — whether the caller watches this listing.
#[instrument(skip(state))]
pub async fn watch_status(
    State(state): State<AppState>,
    session: Session,
    Path(listing_id): Path<i64>,
) -> Result<Json<WatchStatus>> {
    let watched = repo::contains(&state.db, session.user_id(), listing_id).await?;
    Ok(Json(WatchStatus { watched }))
}
