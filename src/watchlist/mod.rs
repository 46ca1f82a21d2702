use crate::state::AppState;
use axum::{routing::get, Router};

mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(handlers::list_watchlist))
        .route(
            "/watchlist/:listing_id",
            get(handlers::watch_status)
                .put(handlers::add_to_watchlist)
                .delete(handlers::remove_from_watchlist),
        )
}
