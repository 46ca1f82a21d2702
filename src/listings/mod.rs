use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/listings",
            get(handlers::list_listings).post(handlers::create_listing),
        )
        .route("/listings/mine", get(handlers::my_listings))
        .route(
            "/listings/:id",
            get(handlers::get_listing)
                .put(handlers::update_listing)
                .delete(handlers::delete_listing),
        )
        .route(
            "/listings/:id/image",
            post(handlers::upload_image).get(handlers::get_image),
        )
}
