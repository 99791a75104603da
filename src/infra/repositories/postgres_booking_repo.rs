use crate::domain::{models::booking::Booking, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_IF_FREE_SQL: &str = r#"INSERT INTO bookings (id, event_type_id, user_id, guest_name, guest_email, guest_phone, start_time, end_time, status, notes, created_at)
    SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
    WHERE NOT EXISTS (
        SELECT 1 FROM bookings
        WHERE event_type_id = $2 AND status = 'confirmed' AND start_time < $8 AND end_time > $7
    )
    RETURNING *"#;

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create_confirmed(&self, booking: &Booking) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Held until commit or rollback: one writer per event type at a time.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(&booking.event_type_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Booking>(INSERT_IF_FREE_SQL)
            .bind(&booking.id).bind(&booking.event_type_id).bind(&booking.user_id)
            .bind(&booking.guest_name).bind(&booking.guest_email).bind(&booking.guest_phone)
            .bind(booking.start_time).bind(booking.end_time).bind(&booking.status)
            .bind(&booking.notes).bind(booking.created_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        match created {
            Some(booking) => {
                tx.commit().await.map_err(AppError::Database)?;
                Ok(booking)
            }
            None => {
                tx.rollback().await.map_err(AppError::Database)?;
                Err(AppError::Conflict("Time slot already booked".into()))
            }
        }
    }

    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE user_id = $1 AND id = $2").bind(user_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE user_id = $1 ORDER BY start_time DESC").bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_upcoming(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE user_id = $1 AND status = 'confirmed' AND start_time >= $2 ORDER BY start_time ASC")
            .bind(user_id).bind(now).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_confirmed_in_range(&self, event_type_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE event_type_id = $1 AND status = 'confirmed' AND start_time < $2 AND end_time > $3 ORDER BY start_time ASC")
            .bind(event_type_id).bind(end).bind(start).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn count_by_event_type(&self, event_type_id: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM bookings WHERE event_type_id = $1").bind(event_type_id).fetch_one(&self.pool).await.map_err(AppError::Database)?;
        row.try_get::<i64, _>("total").map_err(AppError::Database)
    }

    async fn cancel(&self, user_id: &str, id: &str) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = 'cancelled' WHERE id = $1 AND user_id = $2 RETURNING *")
            .bind(id).bind(user_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))
    }
}
