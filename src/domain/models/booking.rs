use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_CANCELLED: &str = "cancelled";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub event_type_id: String,
    pub user_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub event_type_id: String,
    pub host_user_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type_id: params.event_type_id,
            user_id: params.host_user_id,
            guest_name: params.guest_name,
            guest_email: params.guest_email,
            guest_phone: params.guest_phone,
            start_time: params.start,
            end_time: params.end,
            status: STATUS_CONFIRMED.to_string(),
            notes: params.notes,
            created_at: Utc::now(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == STATUS_CONFIRMED
    }

    /// Half-open interval test: `[start, end)` touching another interval's end does not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}
