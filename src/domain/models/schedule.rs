use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::availability::Availability;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(user_id: String, name: String, is_default: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            name,
            is_default,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDetail {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub availability: Vec<Availability>,
}
