pub mod sqlite_user_repo;
pub mod sqlite_event_type_repo;
pub mod sqlite_availability_repo;
pub mod sqlite_schedule_repo;
pub mod sqlite_booking_repo;

pub mod postgres_user_repo;
pub mod postgres_event_type_repo;
pub mod postgres_availability_repo;
pub mod postgres_schedule_repo;
pub mod postgres_booking_repo;
