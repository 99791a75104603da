use crate::domain::models::availability::{WeeklyRule, DEFAULT_TIMEZONE};

pub const DEFAULT_WINDOW_START: &str = "09:00";
pub const DEFAULT_WINDOW_END: &str = "17:00";
pub const DEFAULT_SCHEDULE_NAME: &str = "Working Hours";

/// Monday (1) through Friday (5), 09:00-17:00.
pub fn default_weekly_rules() -> Vec<WeeklyRule> {
    (1..=5)
        .map(|day| WeeklyRule::new(day, DEFAULT_WINDOW_START, DEFAULT_WINDOW_END, DEFAULT_TIMEZONE))
        .collect()
}
