use axum::{extract::{State, Path, Query, rejection::JsonRejection}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::{
    requests::{AvailabilityQuery, CreateAvailabilityRequest, ReplaceAvailabilityRequest, UpdateAvailabilityRequest},
    responses::{DataResponse, SuccessResponse},
};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::availability::{Availability, AvailabilityScope};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn list_availability(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rules = match (query.event_type_id, query.schedule_id) {
        (Some(event_type_id), _) => {
            let scope = AvailabilityScope::EventType(event_type_id);
            ensure_scope_owned(&state, &user.id, &scope).await?;
            list_scope(&state, &scope).await?
        }
        (None, Some(schedule_id)) => {
            let scope = AvailabilityScope::Schedule(schedule_id);
            ensure_scope_owned(&state, &user.id, &scope).await?;
            list_scope(&state, &scope).await?
        }
        (None, None) => state.availability_repo.list_by_user(&user.id).await?,
    };

    Ok(Json(DataResponse::new(rules)))
}

pub async fn create_availability(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateAvailabilityRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let scope = scope_of(payload.event_type_id, payload.schedule_id)?;
    ensure_scope_owned(&state, &user.id, &scope).await?;
    payload.rule.validate()?;

    let saved = state.availability_repo.upsert(&Availability::new(&user.id, &scope, payload.rule)).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::with(saved))))
}

pub async fn update_availability(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAvailabilityRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let mut rule = state.availability_repo.find_by_id(&user.id, &id).await?
        .ok_or_else(|| AppError::NotFound("Availability rule not found".into()))?;

    if let Some(day) = payload.day_of_week { rule.day_of_week = day; }
    if let Some(start) = payload.start_time { rule.start_time = start; }
    if let Some(end) = payload.end_time { rule.end_time = end; }
    if let Some(tz) = payload.timezone { rule.timezone = tz; }
    rule.rule().validate()?;

    let updated = state.availability_repo.update(&rule).await?;
    Ok(Json(SuccessResponse::with(updated)))
}

pub async fn delete_availability(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.availability_repo.delete(&user.id, &id).await?;
    Ok(Json(SuccessResponse::empty()))
}

/// Replaces every rule of one event type or schedule with the submitted set.
pub async fn replace_availability(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<ReplaceAvailabilityRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let scope = scope_of(payload.event_type_id, payload.schedule_id)?;
    ensure_scope_owned(&state, &user.id, &scope).await?;

    for rule in &payload.slots {
        rule.validate()?;
    }
    if let AvailabilityScope::EventType(_) = scope {
        let mut days: Vec<i32> = payload.slots.iter().map(|r| r.day_of_week).collect();
        days.sort_unstable();
        if days.windows(2).any(|w| w[0] == w[1]) {
            return Err(AppError::Validation("An event type can have only one window per day".into()));
        }
    }

    let rules: Vec<Availability> = payload.slots.into_iter()
        .map(|rule| Availability::new(&user.id, &scope, rule))
        .collect();

    let saved = state.availability_repo.replace(&scope, &rules).await?;
    info!("Replaced availability for {:?}: {} rules", scope, saved.len());
    Ok(Json(SuccessResponse::with(saved)))
}

fn scope_of(event_type_id: Option<String>, schedule_id: Option<String>) -> Result<AvailabilityScope, AppError> {
    match (event_type_id, schedule_id) {
        (Some(id), None) => Ok(AvailabilityScope::EventType(id)),
        (None, Some(id)) => Ok(AvailabilityScope::Schedule(id)),
        _ => Err(AppError::Validation("Provide exactly one of eventTypeId or scheduleId".into())),
    }
}

async fn ensure_scope_owned(state: &AppState, user_id: &str, scope: &AvailabilityScope) -> Result<(), AppError> {
    match scope {
        AvailabilityScope::EventType(id) => {
            state.event_type_repo.find_by_id(user_id, id).await?
                .ok_or_else(|| AppError::NotFound("Event type not found".into()))?;
        }
        AvailabilityScope::Schedule(id) => {
            state.schedule_repo.find_by_id(user_id, id).await?
                .ok_or_else(|| AppError::NotFound("Schedule not found".into()))?;
        }
    }
    Ok(())
}

async fn list_scope(state: &AppState, scope: &AvailabilityScope) -> Result<Vec<Availability>, AppError> {
    match scope {
        AvailabilityScope::EventType(id) => state.availability_repo.list_by_event_type(id).await,
        AvailabilityScope::Schedule(id) => state.availability_repo.list_by_schedule(id).await,
    }
}
