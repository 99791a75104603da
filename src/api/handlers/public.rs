use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::api::dtos::responses::{DataResponse, SlotsResponse};
use crate::domain::models::event_type::{EventType, PublicEventType};
use crate::domain::services::availability::{booking_window, effective_rules, generate_slots};
use crate::error::AppError;
use crate::state::AppState;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub async fn get_public_event_type(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event_type = find_by_slug(&state, &slug).await?;
    let availability = effective_rules(state.availability_repo.as_ref(), &event_type).await?;

    let host_name = state.user_repo.find_by_id(&event_type.user_id).await?
        .map(|host| host.display_name().to_string())
        .unwrap_or_default();

    Ok(Json(DataResponse::new(PublicEventType {
        id: event_type.id,
        title: event_type.title,
        slug: event_type.slug,
        description: event_type.description,
        duration: event_type.duration,
        color: event_type.color,
        host_name,
        availability,
    })))
}

pub async fn get_public_slots(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let date_str = params.get("date")
        .ok_or_else(|| AppError::Validation("Date required".into()))?;
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format (YYYY-MM-DD)".into()))?;

    let display_tz = params.get("timezone")
        .filter(|tz| !tz.is_empty())
        .map(|tz| tz.parse::<Tz>().map_err(|_| AppError::Validation(format!("Invalid timezone: {}", tz))))
        .transpose()?;

    let event_type = find_by_slug(&state, &slug).await?;
    let rules = effective_rules(state.availability_repo.as_ref(), &event_type).await?;

    let (window_start, window_end) = booking_window(date);
    let bookings = state.booking_repo
        .list_confirmed_in_range(&event_type.id, window_start, window_end)
        .await?;

    let slots = generate_slots(event_type.duration, date, &rules, &bookings, display_tz);
    debug!("{} slots for {} on {}", slots.len(), slug, date);

    Ok(Json(SlotsResponse { date: date.to_string(), slots }))
}

async fn find_by_slug(state: &AppState, slug: &str) -> Result<EventType, AppError> {
    state.event_type_repo.find_by_slug(slug).await?
        .ok_or_else(|| AppError::NotFound("Event type not found".into()))
}
