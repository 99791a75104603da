use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header::AUTHORIZATION, request::Parts},
};
use crate::state::AppState;
use crate::error::AppError;
use std::sync::Arc;
use tracing::Span;

/// Identity carried by a verified bearer token.
pub struct AuthUser {
    pub id: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts.headers.get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("No token, authorization denied".into()))?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = app_state.auth_service.verify_token(token)?;

        Span::current().record("user_id", claims.sub.as_str());

        Ok(AuthUser { id: claims.sub })
    }
}
