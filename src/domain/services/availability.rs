use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use crate::domain::models::availability::Availability;
use crate::domain::models::booking::Booking;
use crate::domain::models::event_type::EventType;
use crate::domain::ports::AvailabilityRepository;
use crate::error::AppError;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub time: String,
    pub available: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// 0 = Sunday .. 6 = Saturday, the convention rules are stored in.
pub fn weekday_index(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

/// UTC span wide enough to hold `date` in any timezone, for loading the day's bookings.
pub fn booking_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = (date - Duration::days(1)).and_time(chrono::NaiveTime::MIN).and_utc();
    let end = (date + Duration::days(2)).and_time(chrono::NaiveTime::MIN).and_utc();
    (start, end)
}

/// Rules that apply to `event_type`: its schedule's rows when one is attached, else its own.
pub async fn effective_rules(
    repo: &dyn AvailabilityRepository,
    event_type: &EventType,
) -> Result<Vec<Availability>, AppError> {
    match &event_type.schedule_id {
        Some(schedule_id) => repo.list_by_schedule(schedule_id).await,
        None => repo.list_by_event_type(&event_type.id).await,
    }
}

pub fn generate_slots(
    duration_min: i32,
    date: NaiveDate,
    rules: &[Availability],
    existing_bookings: &[Booking],
    display_tz: Option<Tz>,
) -> Vec<Slot> {
    if duration_min <= 0 {
        return Vec::new();
    }

    let duration = Duration::minutes(duration_min as i64);
    let day = weekday_index(date);
    let mut slots = Vec::new();

    for rule in rules.iter().filter(|r| r.day_of_week == day) {
        let Some(window) = rule.window() else {
            tracing::warn!("Skipping malformed availability rule {}", rule.id);
            continue;
        };

        let tz = window.timezone;
        let window_start = resolve_local(tz, date.and_time(window.start));
        let window_end = resolve_local(tz, date.and_time(window.end));
        let label_tz = display_tz.unwrap_or(tz);

        let mut cursor = window_start;
        while cursor + duration <= window_end {
            let slot_end = cursor + duration;

            let taken = existing_bookings
                .iter()
                .any(|b| b.is_confirmed() && b.overlaps(cursor, slot_end));

            if !taken {
                slots.push(Slot {
                    time: cursor.with_timezone(&label_tz).format("%H:%M").to_string(),
                    available: true,
                    start_time: cursor,
                    end_time: slot_end,
                });
            }
            cursor = slot_end;
        }
    }

    slots.sort_by_key(|s| s.start_time);
    slots.dedup_by_key(|s| s.start_time);
    slots
}

/// Ambiguous wall-clock times take the earlier instant; times inside a DST gap move forward an hour.
fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::availability::{AvailabilityScope, WeeklyRule};
    use crate::domain::models::booking::{NewBookingParams, STATUS_CANCELLED};
    use crate::domain::services::defaults::default_weekly_rules;

    // 2030-01-07 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
    }

    fn rules(list: Vec<WeeklyRule>) -> Vec<Availability> {
        let scope = AvailabilityScope::EventType("ev".into());
        list.into_iter().map(|r| Availability::new("u", &scope, r)).collect()
    }

    fn booking(start: DateTime<Utc>, minutes: i64) -> Booking {
        Booking::new(NewBookingParams {
            event_type_id: "ev".into(),
            host_user_id: "u".into(),
            guest_name: "Guest".into(),
            guest_email: "guest@example.com".into(),
            guest_phone: None,
            start,
            end: start + Duration::minutes(minutes),
            notes: None,
        })
    }

    fn utc(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
        date.and_hms_opt(h, m, 0).unwrap().and_utc()
    }

    fn labels(slots: &[Slot]) -> Vec<String> {
        slots.iter().map(|s| s.time.clone()).collect()
    }

    #[test]
    fn test_working_day_yields_sixteen_half_hour_slots() {
        let slots = generate_slots(30, monday(), &rules(default_weekly_rules()), &[], None);

        assert_eq!(slots.len(), 16);
        assert_eq!(slots.first().unwrap().time, "09:00");
        assert_eq!(slots.last().unwrap().time, "16:30");
        assert!(slots.iter().all(|s| s.available));
        assert_eq!(slots[1].start_time, utc(monday(), 9, 30));
    }

    #[test]
    fn test_day_without_rule_is_empty() {
        let sunday = monday() - Duration::days(1);
        let saturday = monday() + Duration::days(5);
        let defaults = rules(default_weekly_rules());

        assert!(generate_slots(30, sunday, &defaults, &[], None).is_empty());
        assert!(generate_slots(30, saturday, &defaults, &[], None).is_empty());
    }

    #[test]
    fn test_no_slot_overruns_window_end() {
        let day_rules = rules(default_weekly_rules());
        let rule_end = utc(monday(), 17, 0);

        for duration in [7, 25, 45, 50, 60, 90, 480] {
            let slots = generate_slots(duration, monday(), &day_rules, &[], None);
            assert!(!slots.is_empty(), "duration {} must fit at least once", duration);
            assert!(slots.iter().all(|s| s.end_time <= rule_end), "duration {} overran", duration);
        }

        let slots = generate_slots(45, monday(), &day_rules, &[], None);
        assert_eq!(slots.len(), 10);
        assert_eq!(slots.last().unwrap().time, "15:45");

        assert!(generate_slots(481, monday(), &day_rules, &[], None).is_empty());
    }

    #[test]
    fn test_non_positive_duration_yields_nothing() {
        let day_rules = rules(default_weekly_rules());
        assert!(generate_slots(0, monday(), &day_rules, &[], None).is_empty());
        assert!(generate_slots(-30, monday(), &day_rules, &[], None).is_empty());
    }

    #[test]
    fn test_overlapping_bookings_are_excluded() {
        let day_rules = rules(default_weekly_rules());
        // Straddles 09:00 and 09:30 slots.
        let existing = vec![booking(utc(monday(), 9, 15), 30)];

        let slots = generate_slots(30, monday(), &day_rules, &existing, None);
        let times = labels(&slots);

        assert_eq!(slots.len(), 14);
        assert!(!times.contains(&"09:00".to_string()));
        assert!(!times.contains(&"09:30".to_string()));
        assert!(times.contains(&"10:00".to_string()));
    }

    #[test]
    fn test_cancelled_bookings_do_not_block() {
        let day_rules = rules(default_weekly_rules());
        let mut cancelled = booking(utc(monday(), 9, 0), 30);
        cancelled.status = STATUS_CANCELLED.to_string();

        let slots = generate_slots(30, monday(), &day_rules, &[cancelled], None);
        assert_eq!(slots.len(), 16);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let day_rules = rules(default_weekly_rules());
        let existing = vec![booking(utc(monday(), 11, 0), 30)];

        let first = generate_slots(30, monday(), &day_rules, &existing, None);
        let second = generate_slots(30, monday(), &day_rules, &existing, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rule_timezone_converts_to_utc() {
        // January: New York is UTC-5.
        let ny = rules(vec![WeeklyRule::new(1, "09:00", "10:00", "America/New_York")]);
        let slots = generate_slots(30, monday(), &ny, &[], None);

        assert_eq!(labels(&slots), vec!["09:00", "09:30"]);
        assert_eq!(slots[0].start_time, utc(monday(), 14, 0));

        let berlin: Tz = "Europe/Berlin".parse().unwrap();
        let relabelled = generate_slots(30, monday(), &ny, &[], Some(berlin));
        assert_eq!(labels(&relabelled), vec!["15:00", "15:30"]);
        assert_eq!(relabelled[0].start_time, slots[0].start_time);
    }

    #[test]
    fn test_multiple_windows_are_merged_in_order() {
        let split_day = rules(vec![
            WeeklyRule::new(1, "14:00", "15:00", "UTC"),
            WeeklyRule::new(1, "09:00", "10:00", "UTC"),
        ]);
        let slots = generate_slots(30, monday(), &split_day, &[], None);
        assert_eq!(labels(&slots), vec!["09:00", "09:30", "14:00", "14:30"]);
    }

    #[test]
    fn test_dst_spring_forward_day_stays_inside_window() {
        // 2030-03-10 is a Sunday; New York skips 02:00-03:00.
        let sunday = NaiveDate::from_ymd_opt(2030, 3, 10).unwrap();
        let ny = rules(vec![WeeklyRule::new(0, "01:00", "04:00", "America/New_York")]);
        let slots = generate_slots(60, sunday, &ny, &[], None);

        // 01:00 EST -> 04:00 EDT is two real hours.
        assert_eq!(labels(&slots), vec!["01:00", "03:00"]);
    }

    #[test]
    fn test_boundary_inside_dst_gap_moves_forward_an_hour() {
        // 02:30 does not exist in New York on 2030-03-10; it becomes 03:30 EDT.
        let sunday = NaiveDate::from_ymd_opt(2030, 3, 10).unwrap();
        let ny = rules(vec![WeeklyRule::new(0, "02:30", "05:00", "America/New_York")]);
        let slots = generate_slots(60, sunday, &ny, &[], None);

        assert_eq!(labels(&slots), vec!["03:30"]);
        assert_eq!(slots[0].start_time, utc(sunday, 7, 30));
        assert_eq!(slots[0].end_time, utc(sunday, 8, 30));
    }

    #[test]
    fn test_ambiguous_boundary_takes_earliest_instant() {
        // 01:30 happens twice in New York on 2030-11-03; the EDT reading wins.
        let sunday = NaiveDate::from_ymd_opt(2030, 11, 3).unwrap();
        let ny = rules(vec![WeeklyRule::new(0, "01:30", "03:00", "America/New_York")]);
        let slots = generate_slots(30, sunday, &ny, &[], None);

        assert_eq!(slots.len(), 5);
        assert_eq!(slots[0].time, "01:30");
        assert_eq!(slots[0].start_time, utc(sunday, 5, 30));
        assert_eq!(slots.last().unwrap().end_time, utc(sunday, 8, 0));
        assert_eq!(labels(&slots), vec!["01:30", "01:00", "01:30", "02:00", "02:30"]);
    }

    #[test]
    fn test_weekday_index_counts_from_sunday() {
        assert_eq!(weekday_index(monday()), 1);
        assert_eq!(weekday_index(monday() - Duration::days(1)), 0);
        assert_eq!(weekday_index(monday() + Duration::days(5)), 6);
    }
}
