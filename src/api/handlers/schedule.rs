use axum::{extract::{State, Path, rejection::JsonRejection}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::{
    requests::{CreateScheduleRequest, UpdateScheduleRequest},
    responses::{DataResponse, SuccessResponse},
};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::{
    availability::{Availability, AvailabilityScope},
    schedule::{Schedule, ScheduleDetail},
};
use crate::domain::services::defaults::{default_weekly_rules, DEFAULT_SCHEDULE_NAME};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn list_schedules(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let schedules = state.schedule_repo.list_by_user(&user.id).await?;

    let mut details = Vec::with_capacity(schedules.len());
    for schedule in schedules {
        let availability = state.availability_repo.list_by_schedule(&schedule.id).await?;
        details.push(ScheduleDetail { schedule, availability });
    }

    Ok(Json(DataResponse::new(details)))
}

pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateScheduleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let name = payload.name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_SCHEDULE_NAME.to_string());

    // First schedule of a user becomes the default.
    let is_default = state.schedule_repo.list_by_user(&user.id).await?.is_empty();
    let schedule = Schedule::new(user.id.clone(), name, is_default);

    let scope = AvailabilityScope::Schedule(schedule.id.clone());
    let rules: Vec<Availability> = default_weekly_rules().into_iter()
        .map(|rule| Availability::new(&user.id, &scope, rule))
        .collect();

    let created = state.schedule_repo.create_with_availability(&schedule, &rules).await?;
    info!("Created schedule {} (default: {})", created.id, created.is_default);

    let availability = state.availability_repo.list_by_schedule(&created.id).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::with(ScheduleDetail { schedule: created, availability }))))
}

pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = find_owned(&state, &user.id, &id).await?;
    let availability = state.availability_repo.list_by_schedule(&schedule.id).await?;
    Ok(Json(DataResponse::new(ScheduleDetail { schedule, availability })))
}

pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateScheduleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let mut schedule = find_owned(&state, &user.id, &id).await?;

    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name cannot be empty".into()));
        }
        schedule.name = name;
    }
    if let Some(is_default) = payload.is_default {
        if schedule.is_default && !is_default {
            return Err(AppError::Validation("Mark another schedule as default instead".into()));
        }
        schedule.is_default = is_default;
    }

    let updated = state.schedule_repo.update(&schedule).await?;
    Ok(Json(SuccessResponse::with(updated)))
}

pub async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.schedule_repo.delete(&user.id, &id).await?;
    info!("Deleted schedule {}", id);
    Ok(Json(SuccessResponse::empty()))
}

async fn find_owned(state: &AppState, user_id: &str, id: &str) -> Result<Schedule, AppError> {
    state.schedule_repo.find_by_id(user_id, id).await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".into()))
}
