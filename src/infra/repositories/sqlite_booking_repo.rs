use crate::domain::{models::booking::Booking, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// SQLite takes the write lock before the statement reads, so the overlap
// probe and the insert cannot interleave with another writer.
const INSERT_IF_FREE_SQL: &str = r#"INSERT INTO bookings (id, event_type_id, user_id, guest_name, guest_email, guest_phone, start_time, end_time, status, notes, created_at)
    SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
    WHERE NOT EXISTS (
        SELECT 1 FROM bookings
        WHERE event_type_id = ? AND status = 'confirmed' AND start_time < ? AND end_time > ?
    )
    RETURNING *"#;

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create_confirmed(&self, booking: &Booking) -> Result<Booking, AppError> {
        let created = sqlx::query_as::<_, Booking>(INSERT_IF_FREE_SQL)
            .bind(&booking.id).bind(&booking.event_type_id).bind(&booking.user_id)
            .bind(&booking.guest_name).bind(&booking.guest_email).bind(&booking.guest_phone)
            .bind(booking.start_time).bind(booking.end_time).bind(&booking.status)
            .bind(&booking.notes).bind(booking.created_at)
            .bind(&booking.event_type_id).bind(booking.end_time).bind(booking.start_time)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        created.ok_or_else(|| AppError::Conflict("Time slot already booked".into()))
    }

    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE user_id = ? AND id = ?").bind(user_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE user_id = ? ORDER BY start_time DESC").bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_upcoming(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = ? AND status = 'confirmed' AND start_time >= ? ORDER BY start_time ASC"
        )
            .bind(user_id)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_confirmed_in_range(&self, event_type_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE event_type_id = ? AND status = 'confirmed' AND start_time < ? AND end_time > ? ORDER BY start_time ASC"
        )
            .bind(event_type_id)
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_by_event_type(&self, event_type_id: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM bookings WHERE event_type_id = ?")
            .bind(event_type_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        row.try_get::<i64, _>("total").map_err(AppError::Database)
    }

    async fn cancel(&self, user_id: &str, id: &str) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'cancelled' WHERE id = ? AND user_id = ? RETURNING *"
        )
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))
    }
}
