pub mod auth;
pub mod availability;
pub mod booking;
pub mod event_type;
pub mod health;
pub mod public;
pub mod schedule;
pub mod user;
