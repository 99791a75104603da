use scheduling_backend::config::Config;
use scheduling_backend::domain::models::{
    availability::{Availability, AvailabilityScope},
    event_type::{EventType, NewEventTypeParams},
    user::User,
};
use scheduling_backend::domain::services::defaults::default_weekly_rules;
use scheduling_backend::infra::factory::bootstrap_state;
use tracing::info;

const DEMO_EMAIL: &str = "user@example.com";
const DEMO_PASSWORD: &str = "password123";
const DEMO_SLUG: &str = "30min";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let config = Config::from_env()?;
    let state = bootstrap_state(&config).await?;

    let user = match state.user_repo.find_by_email(DEMO_EMAIL).await? {
        Some(existing) => {
            info!("Demo user already present: {}", existing.id);
            existing
        }
        None => {
            let hash = state.auth_service.hash_password(DEMO_PASSWORD)?;
            let user = User::new(DEMO_EMAIL.into(), "user123".into(), Some("Demo User".into()), hash);
            state.user_repo.create(&user).await?
        }
    };

    if state.event_type_repo.find_by_slug(DEMO_SLUG).await?.is_some() {
        info!("Event type '{}' already seeded", DEMO_SLUG);
        return Ok(());
    }

    let event_type = EventType::new(NewEventTypeParams {
        user_id: user.id.clone(),
        title: "30 Minute Meeting".into(),
        slug: DEMO_SLUG.into(),
        description: Some("A quick introductory call".into()),
        duration: 30,
        color: None,
        schedule_id: None,
    });
    let scope = AvailabilityScope::EventType(event_type.id.clone());
    let rules: Vec<Availability> = default_weekly_rules().into_iter()
        .map(|rule| Availability::new(&user.id, &scope, rule))
        .collect();

    state.event_type_repo.create_with_availability(&event_type, &rules).await?;
    info!("Seeded {} / {} with event type '{}'", DEMO_EMAIL, DEMO_PASSWORD, DEMO_SLUG);
    Ok(())
}
