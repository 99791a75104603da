use axum::{extract::{State, rejection::JsonRejection}, response::IntoResponse, Json};
use crate::api::dtos::{requests::UpdateUserRequest, responses::{DataResponse, SuccessResponse}};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::auth::UserProfile;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let found = state.user_repo.find_by_id(&user.id).await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(DataResponse::new(UserProfile::from(found))))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let mut current = state.user_repo.find_by_id(&user.id).await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if let Some(username) = payload.username {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::Validation("Username cannot be empty".into()));
        }
        current.username = username;
    }
    if let Some(name) = payload.name {
        current.name = Some(name).filter(|n| !n.trim().is_empty());
    }

    let updated = state.user_repo.update(&current).await?;
    Ok(Json(SuccessResponse::with(UserProfile::from(updated))))
}

pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.user_repo.delete(&user.id).await?;
    info!("User deleted their account: {}", user.id);
    Ok(Json(SuccessResponse::empty()))
}
