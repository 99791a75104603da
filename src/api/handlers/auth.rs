use axum::{extract::{State, rejection::JsonRejection}, response::IntoResponse, Json};
use crate::api::dtos::requests::{LoginRequest, SignupRequest};
use crate::domain::models::{auth::AuthResponse, user::User};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let email = payload.email.trim().to_lowercase();
    let username = payload.username.trim().to_string();

    if !email.contains('@') {
        return Err(AppError::Validation("Please include a valid email".into()));
    }
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".into()));
    }
    if payload.password.len() < 6 {
        return Err(AppError::Validation("Password must be 6 or more characters".into()));
    }

    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Validation("User already exists".into()));
    }

    let password_hash = state.auth_service.hash_password(&payload.password)?;
    let name = payload.name.filter(|n| !n.trim().is_empty());
    let user = state.user_repo.create(&User::new(email, username, name, password_hash)).await?;

    let token = state.auth_service.issue_token(&user)?;
    info!("User signed up: {}", user.id);

    Ok(Json(AuthResponse { token, user: user.into() }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let email = payload.email.trim().to_lowercase();

    let user = state.user_repo.find_by_email(&email).await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    state.auth_service.verify_password(&payload.password, &user.password_hash)?;

    let token = state.auth_service.issue_token(&user)?;
    info!("User logged in: {}", user.id);

    Ok(Json(AuthResponse { token, user: user.into() }))
}
