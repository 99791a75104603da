use crate::domain::models::{
    user::User, event_type::EventType, booking::Booking, schedule::Schedule,
    availability::{Availability, AvailabilityScope},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn update(&self, user: &User) -> Result<User, AppError>;
    /// Removes the user together with everything they own, bookings included.
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait EventTypeRepository: Send + Sync {
    /// Inserts the event type and its initial rules in one transaction.
    async fn create_with_availability(&self, event_type: &EventType, rules: &[Availability]) -> Result<EventType, AppError>;
    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<EventType>, AppError>;
    /// Unscoped lookup for the public booking flow.
    async fn get(&self, id: &str) -> Result<Option<EventType>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<EventType>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<EventType>, AppError>;
    async fn booking_counts(&self, user_id: &str) -> Result<Vec<(String, i64)>, AppError>;
    async fn update(&self, event_type: &EventType) -> Result<EventType, AppError>;
    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Event-type rules upsert by (event type, day); schedule rules always insert.
    async fn upsert(&self, rule: &Availability) -> Result<Availability, AppError>;
    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<Availability>, AppError>;
    async fn list_by_event_type(&self, event_type_id: &str) -> Result<Vec<Availability>, AppError>;
    async fn list_by_schedule(&self, schedule_id: &str) -> Result<Vec<Availability>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Availability>, AppError>;
    async fn update(&self, rule: &Availability) -> Result<Availability, AppError>;
    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError>;
    /// Delete-then-recreate of every rule in `scope`, atomically.
    async fn replace(&self, scope: &AvailabilityScope, rules: &[Availability]) -> Result<Vec<Availability>, AppError>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create_with_availability(&self, schedule: &Schedule, rules: &[Availability]) -> Result<Schedule, AppError>;
    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<Schedule>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Schedule>, AppError>;
    /// When `schedule.is_default` is set, every other schedule of the user loses the flag.
    async fn update(&self, schedule: &Schedule) -> Result<Schedule, AppError>;
    /// Deleting the default promotes the user's oldest remaining schedule.
    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts a confirmed booking unless a confirmed booking of the same event type
    /// overlaps it. Check and insert are atomic; an overlap yields `AppError::Conflict`.
    async fn create_confirmed(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_upcoming(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;
    async fn list_confirmed_in_range(&self, event_type_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;
    async fn count_by_event_type(&self, event_type_id: &str) -> Result<i64, AppError>;
    async fn cancel(&self, user_id: &str, id: &str) -> Result<Booking, AppError>;
}
