use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put, patch},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::error::AppError;
use crate::state::AppState;
use crate::api::handlers::{health, auth, user, event_type, availability, schedule, booking, public};
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info_span, Span, error, info, warn};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))

        // Account
        .route("/api/users/me", get(user::get_me).put(user::update_me).delete(user::delete_me))

        // Event types
        .route("/api/event-types", get(event_type::list_event_types).post(event_type::create_event_type))
        .route("/api/event-types/{id}", get(event_type::get_event_type).put(event_type::update_event_type).delete(event_type::delete_event_type))

        // Availability rules
        .route("/api/availability", get(availability::list_availability).post(availability::create_availability))
        .route("/api/availability/slots", post(availability::replace_availability))
        .route("/api/availability/{id}", put(availability::update_availability).delete(availability::delete_availability))

        // Schedules
        .route("/api/schedules", get(schedule::list_schedules).post(schedule::create_schedule))
        .route("/api/schedules/{id}", get(schedule::get_schedule).put(schedule::update_schedule).delete(schedule::delete_schedule))

        // Bookings
        .route("/api/bookings", post(booking::create_booking).get(booking::list_bookings))
        .route("/api/bookings/{id}", get(booking::get_booking))
        .route("/api/bookings/{id}/cancel", patch(booking::cancel_booking))

        // Public booking page
        .route("/api/public/{slug}", get(public::get_public_event_type))
        .route("/api/public/{slug}/availability", get(public::get_public_slots))

        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(middleware::map_response(timeout_body))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}

/// No handler answers 408, so any 408 here was produced by the timeout layer with an empty body.
async fn timeout_body(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        warn!("Request exceeded the configured timeout");
        return AppError::Timeout.into_response();
    }
    response
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!("FRONTEND_URL is not a valid origin, CORS stays closed: {}", frontend_url);
            layer
        }
    }
}
