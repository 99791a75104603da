use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::availability::Availability;

pub const DEFAULT_COLOR: &str = "#000000";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    pub id: String,
    pub user_id: String,
    pub schedule_id: Option<String>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub duration: i32,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewEventTypeParams {
    pub user_id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub duration: i32,
    pub color: Option<String>,
    pub schedule_id: Option<String>,
}

impl EventType {
    pub fn new(params: NewEventTypeParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: params.user_id,
            schedule_id: params.schedule_id,
            title: params.title,
            slug: params.slug,
            description: params.description,
            duration: params.duration,
            color: params.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            created_at: Utc::now(),
        }
    }
}

/// Slugs appear in public URLs: lowercase ASCII letters, digits and single dashes.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 64
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeDetail {
    #[serde(flatten)]
    pub event_type: EventType,
    pub availability: Vec<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_count: Option<i64>,
}

/// What a guest sees on the booking page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicEventType {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub duration: i32,
    pub color: String,
    pub host_name: String,
    pub availability: Vec<Availability>,
}
