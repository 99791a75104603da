use crate::domain::models::availability::WeeklyRule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventTypeRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub duration: Option<i32>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub schedule_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventTypeRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub duration: Option<i32>,
    pub description: Option<String>,
    pub color: Option<String>,
    /// Absent leaves the schedule alone, `null` detaches it.
    #[serde(default, deserialize_with = "present")]
    pub schedule_id: Option<Option<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub event_type_id: Option<String>,
    pub schedule_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvailabilityRequest {
    pub event_type_id: Option<String>,
    pub schedule_id: Option<String>,
    #[serde(flatten)]
    pub rule: WeeklyRule,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvailabilityRequest {
    pub day_of_week: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAvailabilityRequest {
    pub event_type_id: Option<String>,
    pub schedule_id: Option<String>,
    pub slots: Vec<WeeklyRule>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    pub name: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub event_type_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
