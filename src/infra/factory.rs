use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::error::AppError;
use crate::state::AppState;
use crate::domain::services::auth_service::AuthService;
use crate::infra::repositories::{
    postgres_availability_repo::PostgresAvailabilityRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_event_type_repo::PostgresEventTypeRepo, postgres_schedule_repo::PostgresScheduleRepo,
    postgres_user_repo::PostgresUserRepo,
    sqlite_availability_repo::SqliteAvailabilityRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_event_type_repo::SqliteEventTypeRepo, sqlite_schedule_repo::SqliteScheduleRepo,
    sqlite_user_repo::SqliteUserRepo,
};

pub fn is_postgres_url(database_url: &str) -> bool {
    database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")
}

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    if is_postgres_url(&config.database_url) {
        info!("Initializing PostgreSQL connection...");
        let pool = connect_postgres(&config.database_url).await?;
        Ok(postgres_state(pool, config))
    } else {
        info!("Initializing SQLite connection with WAL Mode...");
        let pool = connect_sqlite(&config.database_url).await?;
        Ok(sqlite_state(pool, config))
    }
}

/// Opens the pool and applies pending migrations.
pub async fn connect_postgres(database_url: &str) -> Result<PgPool, AppError> {
    let opts = PgConnectOptions::from_str(database_url)
        .map_err(AppError::Database)?
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(opts)
        .await
        .map_err(AppError::Database)?;

    sqlx::migrate!("./migrations/postgres")
        .run(&pool)
        .await
        .map_err(|e| AppError::Database(e.into()))?;

    Ok(pool)
}

/// Opens the pool and applies pending migrations. The file is created if missing.
pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)
        .map_err(AppError::Database)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .map_err(AppError::Database)?;

    sqlx::migrate!("./migrations/sqlite")
        .run(&pool)
        .await
        .map_err(|e| AppError::Database(e.into()))?;

    Ok(pool)
}

pub fn postgres_state(pool: PgPool, config: &Config) -> AppState {
    AppState {
        config: config.clone(),
        user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
        event_type_repo: Arc::new(PostgresEventTypeRepo::new(pool.clone())),
        availability_repo: Arc::new(PostgresAvailabilityRepo::new(pool.clone())),
        schedule_repo: Arc::new(PostgresScheduleRepo::new(pool.clone())),
        booking_repo: Arc::new(PostgresBookingRepo::new(pool)),
        auth_service: Arc::new(AuthService::new(config)),
    }
}

pub fn sqlite_state(pool: SqlitePool, config: &Config) -> AppState {
    AppState {
        config: config.clone(),
        user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
        event_type_repo: Arc::new(SqliteEventTypeRepo::new(pool.clone())),
        availability_repo: Arc::new(SqliteAvailabilityRepo::new(pool.clone())),
        schedule_repo: Arc::new(SqliteScheduleRepo::new(pool.clone())),
        booking_repo: Arc::new(SqliteBookingRepo::new(pool)),
        auth_service: Arc::new(AuthService::new(config)),
    }
}
