use std::sync::Arc;
use crate::domain::ports::{
    AvailabilityRepository, BookingRepository, EventTypeRepository, ScheduleRepository,
    UserRepository,
};
use crate::domain::services::auth_service::AuthService;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub event_type_repo: Arc<dyn EventTypeRepository>,
    pub availability_repo: Arc<dyn AvailabilityRepository>,
    pub schedule_repo: Arc<dyn ScheduleRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub auth_service: Arc<AuthService>,
}
