use axum::{extract::{State, Path, rejection::JsonRejection}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::{
    requests::{CreateEventTypeRequest, UpdateEventTypeRequest},
    responses::{DataResponse, SuccessResponse},
};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::{
    availability::{Availability, AvailabilityScope},
    event_type::{is_valid_slug, EventType, EventTypeDetail, NewEventTypeParams},
};
use crate::domain::services::{availability::effective_rules, defaults::default_weekly_rules};
use crate::error::AppError;
use crate::state::AppState;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub async fn list_event_types(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let event_types = state.event_type_repo.list_by_user(&user.id).await?;
    let rules = state.availability_repo.list_by_user(&user.id).await?;
    let counts: HashMap<String, i64> = state.event_type_repo.booking_counts(&user.id).await?
        .into_iter()
        .collect();

    let mut by_event_type: HashMap<&str, Vec<&Availability>> = HashMap::new();
    let mut by_schedule: HashMap<&str, Vec<&Availability>> = HashMap::new();
    for rule in &rules {
        if let Some(id) = rule.event_type_id.as_deref() {
            by_event_type.entry(id).or_default().push(rule);
        } else if let Some(id) = rule.schedule_id.as_deref() {
            by_schedule.entry(id).or_default().push(rule);
        }
    }

    let details: Vec<EventTypeDetail> = event_types.into_iter()
        .map(|event_type| {
            let source = match event_type.schedule_id.as_deref() {
                Some(schedule_id) => by_schedule.get(schedule_id),
                None => by_event_type.get(event_type.id.as_str()),
            };
            let availability: Vec<Availability> = source
                .map(|rows| rows.iter().map(|r| (*r).clone()).collect())
                .unwrap_or_default();
            let booking_count = counts.get(&event_type.id).copied().unwrap_or(0);

            EventTypeDetail { event_type, availability, booking_count: Some(booking_count) }
        })
        .collect();

    Ok(Json(DataResponse::new(details)))
}

pub async fn create_event_type(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateEventTypeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let (Some(title), Some(slug), Some(duration)) = (payload.title, payload.slug, payload.duration) else {
        return Err(AppError::Validation("Title, slug and duration are required".into()));
    };
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("Title, slug and duration are required".into()));
    }
    validate_slug(&slug)?;
    validate_duration(duration)?;

    if let Some(schedule_id) = &payload.schedule_id {
        ensure_schedule_owned(&state, &user.id, schedule_id).await?;
    }
    if state.event_type_repo.find_by_slug(&slug).await?.is_some() {
        return Err(AppError::Conflict("Slug is already taken".into()));
    }

    let event_type = EventType::new(NewEventTypeParams {
        user_id: user.id.clone(),
        title,
        slug,
        description: payload.description,
        duration,
        color: payload.color,
        schedule_id: payload.schedule_id,
    });

    let scope = AvailabilityScope::EventType(event_type.id.clone());
    let rules: Vec<Availability> = default_weekly_rules().into_iter()
        .map(|rule| Availability::new(&user.id, &scope, rule))
        .collect();

    let created = state.event_type_repo.create_with_availability(&event_type, &rules).await?;
    info!("Created event type {} ({})", created.id, created.slug);

    let availability = effective_rules(state.availability_repo.as_ref(), &created).await?;
    let detail = EventTypeDetail { event_type: created, availability, booking_count: Some(0) };

    Ok((StatusCode::CREATED, Json(SuccessResponse::with(detail))))
}

pub async fn get_event_type(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event_type = find_owned(&state, &user.id, &id).await?;
    let availability = effective_rules(state.availability_repo.as_ref(), &event_type).await?;
    let booking_count = state.booking_repo.count_by_event_type(&event_type.id).await?;

    Ok(Json(DataResponse::new(EventTypeDetail {
        event_type,
        availability,
        booking_count: Some(booking_count),
    })))
}

pub async fn update_event_type(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateEventTypeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let mut event_type = find_owned(&state, &user.id, &id).await?;

    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Title cannot be empty".into()));
        }
        event_type.title = title;
    }
    if let Some(slug) = payload.slug.filter(|s| *s != event_type.slug) {
        validate_slug(&slug)?;
        if state.event_type_repo.find_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict("Slug is already taken".into()));
        }
        event_type.slug = slug;
    }
    if let Some(duration) = payload.duration {
        validate_duration(duration)?;
        event_type.duration = duration;
    }
    if let Some(description) = payload.description {
        event_type.description = Some(description).filter(|d| !d.is_empty());
    }
    if let Some(color) = payload.color {
        event_type.color = color;
    }
    if let Some(schedule_id) = payload.schedule_id {
        if let Some(schedule_id) = &schedule_id {
            ensure_schedule_owned(&state, &user.id, schedule_id).await?;
        }
        event_type.schedule_id = schedule_id;
    }

    let updated = state.event_type_repo.update(&event_type).await?;
    Ok(Json(SuccessResponse::with(updated)))
}

pub async fn delete_event_type(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event_type = find_owned(&state, &user.id, &id).await?;

    if state.booking_repo.count_by_event_type(&event_type.id).await? > 0 {
        return Err(AppError::Conflict("Cannot delete an event type that has bookings".into()));
    }

    state.event_type_repo.delete(&user.id, &event_type.id).await?;
    info!("Deleted event type {}", event_type.id);
    Ok(Json(SuccessResponse::empty()))
}

async fn find_owned(state: &AppState, user_id: &str, id: &str) -> Result<EventType, AppError> {
    state.event_type_repo.find_by_id(user_id, id).await?
        .ok_or_else(|| AppError::NotFound("Event type not found".into()))
}

async fn ensure_schedule_owned(state: &AppState, user_id: &str, schedule_id: &str) -> Result<(), AppError> {
    state.schedule_repo.find_by_id(user_id, schedule_id).await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Schedule not found".into()))
}

fn validate_slug(slug: &str) -> Result<(), AppError> {
    if !is_valid_slug(slug) {
        return Err(AppError::Validation("Slug may only contain lowercase letters, numbers and dashes".into()));
    }
    Ok(())
}

fn validate_duration(duration: i32) -> Result<(), AppError> {
    if duration <= 0 {
        return Err(AppError::Validation("Duration must be a positive number of minutes".into()));
    }
    Ok(())
}
