use axum::{
    extract::{FromRef, State},
    Json,
};
use tracing::{info, instrument, warn};

use crate::auth::{
    dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
    jwt::JwtKeys,
    repo_types::User,
    services,
    session::Session,
};
use crate::error::{ApiError, Result};
use crate::state::AppState;

fn token_pair(keys: &JwtKeys, user: User) -> Result<AuthResponse> {
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let user = services::register(
        &state.db,
        &payload.username,
        &payload.email,
        &payload.password,
    )
    .await?;
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(token_pair(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = services::authenticate(&state.db, &payload.identifier, &payload.password)
        .await?
        .ok_or_else(|| {
            // same rejection whether the identifier was unknown or the
            // password was wrong
            warn!("login failed");
            ApiError::Unauthorized
        })?;

    info!(user_id = user.id, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(token_pair(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(token_pair(&keys, user)?))
}

#[instrument(skip(state))]
pub async fn me(State(state): State<AppState>, session: Session) -> Result<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, session.user_id())
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(user.into()))
}
