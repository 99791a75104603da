use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::NaiveTime;
use chrono_tz::Tz;
use sqlx::FromRow;
use crate::error::AppError;

pub const DEFAULT_TIMEZONE: &str = "UTC";

/// A weekly recurring window. `day_of_week` counts from Sunday (0) to Saturday (6).
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub id: String,
    pub user_id: String,
    pub event_type_id: Option<String>,
    pub schedule_id: Option<String>,
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityScope {
    EventType(String),
    Schedule(String),
}

/// Wire shape of a rule as the dashboard sends it.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRule {
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// A rule with its times and timezone parsed.
#[derive(Debug, Clone, Copy)]
pub struct RuleWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub timezone: Tz,
}

impl WeeklyRule {
    pub fn new(day_of_week: i32, start_time: &str, end_time: &str, timezone: &str) -> Self {
        Self {
            day_of_week,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            timezone: timezone.to_string(),
        }
    }

    pub fn validate(&self) -> Result<RuleWindow, AppError> {
        if !(0..=6).contains(&self.day_of_week) {
            return Err(AppError::Validation("dayOfWeek must be between 0 (Sunday) and 6 (Saturday)".into()));
        }

        let start = parse_clock(&self.start_time)
            .ok_or_else(|| AppError::Validation("Invalid startTime format (HH:MM)".into()))?;
        let end = parse_clock(&self.end_time)
            .ok_or_else(|| AppError::Validation("Invalid endTime format (HH:MM)".into()))?;

        if start >= end {
            return Err(AppError::Validation("startTime must be before endTime".into()));
        }

        let timezone: Tz = self.timezone.parse()
            .map_err(|_| AppError::Validation(format!("Invalid timezone: {}", self.timezone)))?;

        Ok(RuleWindow { start, end, timezone })
    }
}

impl Availability {
    pub fn new(user_id: &str, scope: &AvailabilityScope, rule: WeeklyRule) -> Self {
        let (event_type_id, schedule_id) = match scope {
            AvailabilityScope::EventType(id) => (Some(id.clone()), None),
            AvailabilityScope::Schedule(id) => (None, Some(id.clone())),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            event_type_id,
            schedule_id,
            day_of_week: rule.day_of_week,
            start_time: rule.start_time,
            end_time: rule.end_time,
            timezone: rule.timezone,
        }
    }

    pub fn rule(&self) -> WeeklyRule {
        WeeklyRule {
            day_of_week: self.day_of_week,
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            timezone: self.timezone.clone(),
        }
    }

    /// Parsed window, or `None` for a row that no longer validates.
    pub fn window(&self) -> Option<RuleWindow> {
        self.rule().validate().ok()
    }
}

fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}
