use axum::{extract::{State, Path, Query, rejection::JsonRejection}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::{requests::CreateBookingRequest, responses::{DataResponse, SuccessResponse}};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::booking::{Booking, NewBookingParams};
use crate::error::AppError;
use crate::state::AppState;
use chrono::{DateTime, Datelike, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Public endpoint: guests book without an account.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let guest_name = payload.guest_name.trim().to_string();
    let guest_email = payload.guest_email.trim().to_string();
    if guest_name.is_empty() {
        return Err(AppError::Validation("Guest name is required".into()));
    }
    if !guest_email.contains('@') {
        return Err(AppError::Validation("A valid guest email is required".into()));
    }

    let event_type = state.event_type_repo.get(&payload.event_type_id).await?
        .ok_or_else(|| AppError::NotFound("Event type not found".into()))?;

    let start = payload.start_time;
    let end = match payload.end_time {
        Some(end) => end,
        None => start.checked_add_signed(Duration::minutes(event_type.duration as i64))
            .ok_or_else(|| AppError::Validation("startTime is out of range".into()))?,
    };
    if !within_storable_years(start) || !within_storable_years(end) {
        return Err(AppError::Validation("Booking times must fall between years 0000 and 9999".into()));
    }
    if end <= start {
        return Err(AppError::Validation("endTime must be after startTime".into()));
    }

    let booking = Booking::new(NewBookingParams {
        event_type_id: event_type.id.clone(),
        host_user_id: event_type.user_id.clone(),
        guest_name,
        guest_email,
        guest_phone: payload.guest_phone.filter(|p| !p.trim().is_empty()),
        start,
        end,
        notes: payload.notes.filter(|n| !n.trim().is_empty()),
    });

    let created = state.booking_repo.create_confirmed(&booking).await
        .inspect_err(|e| {
            if let AppError::Conflict(_) = e {
                warn!("Booking conflict for event type {} at {}", event_type.id, start);
            }
        })?;

    info!("Booking {} confirmed for event type {} at {}", created.id, event_type.id, created.start_time);
    Ok((StatusCode::CREATED, Json(SuccessResponse::with(created))))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let upcoming = params.get("upcoming").is_some_and(|v| v == "true");

    let bookings = if upcoming {
        state.booking_repo.list_upcoming(&user.id, Utc::now()).await?
    } else {
        state.booking_repo.list_by_user(&user.id).await?
    };

    Ok(Json(DataResponse::new(bookings)))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&user.id, &id).await?
        .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;
    Ok(Json(DataResponse::new(booking)))
}

/// Idempotent: cancelling a cancelled booking returns it unchanged.
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let cancelled = state.booking_repo.cancel(&user.id, &id).await?;
    info!("Booking {} cancelled by owner {}", cancelled.id, user.id);
    Ok(Json(SuccessResponse::with(cancelled)))
}

/// Instants are stored as RFC 3339 text; ordering stays lexicographic only for four-digit years.
fn within_storable_years(instant: DateTime<Utc>) -> bool {
    (0..=9999).contains(&instant.year())
}
