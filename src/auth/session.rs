use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::{JwtKeys, TokenKind};
use crate::error::ApiError;

/// The acting identity for one request, decoded from the bearer access
/// token. Handlers take this by value and pass the id into the
/// ownership-scoped store calls; there is no process-wide current user.
/// A request without a valid token is rejected before any store is
/// reached, so "unauthenticated" can never match an owner predicate.
#[derive(Debug, Clone, Copy)]
pub struct Session(pub i64);

impl Session {
    pub fn user_id(&self) -> i64 {
        self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized
        })?;

        if claims.kind != TokenKind::Access {
            return Err(ApiError::Unauthorized);
        }

        Ok(Session(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    async fn extract(state: &AppState, auth: Option<&str>) -> Result<Session, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = auth {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Session::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn valid_access_token_yields_session() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_access(9).unwrap();
        let session = extract(&state, Some(&format!("Bearer {token}")))
            .await
            .expect("session");
        assert_eq!(session.user_id(), 9);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let state = AppState::fake();
        let err = extract(&state, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn refresh_token_is_not_a_session() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_refresh(9).unwrap();
        let err = extract(&state, Some(&format!("Bearer {token}")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }
}
