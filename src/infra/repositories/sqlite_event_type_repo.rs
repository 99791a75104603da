use crate::domain::{models::{availability::Availability, event_type::EventType}, ports::EventTypeRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteEventTypeRepo {
    pool: SqlitePool,
}

impl SqliteEventTypeRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventTypeRepository for SqliteEventTypeRepo {
    async fn create_with_availability(&self, event_type: &EventType, rules: &[Availability]) -> Result<EventType, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, EventType>(
            r#"INSERT INTO event_types (id, user_id, schedule_id, title, slug, description, duration, color, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#
        )
            .bind(&event_type.id)
            .bind(&event_type.user_id)
            .bind(&event_type.schedule_id)
            .bind(&event_type.title)
            .bind(&event_type.slug)
            .bind(&event_type.description)
            .bind(event_type.duration)
            .bind(&event_type.color)
            .bind(event_type.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for rule in rules {
            sqlx::query(
                "INSERT INTO availability (id, user_id, event_type_id, schedule_id, day_of_week, start_time, end_time, timezone) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
            )
                .bind(&rule.id).bind(&rule.user_id).bind(&rule.event_type_id).bind(&rule.schedule_id)
                .bind(rule.day_of_week).bind(&rule.start_time).bind(&rule.end_time).bind(&rule.timezone)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<EventType>, AppError> {
        sqlx::query_as::<_, EventType>("SELECT * FROM event_types WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn get(&self, id: &str) -> Result<Option<EventType>, AppError> {
        sqlx::query_as::<_, EventType>("SELECT * FROM event_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<EventType>, AppError> {
        sqlx::query_as::<_, EventType>("SELECT * FROM event_types WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<EventType>, AppError> {
        sqlx::query_as::<_, EventType>("SELECT * FROM event_types WHERE user_id = ? ORDER BY created_at ASC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn booking_counts(&self, user_id: &str) -> Result<Vec<(String, i64)>, AppError> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT event_type_id, COUNT(*) FROM bookings WHERE user_id = ? GROUP BY event_type_id"
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, event_type: &EventType) -> Result<EventType, AppError> {
        sqlx::query_as::<_, EventType>(
            r#"UPDATE event_types SET
                title=?, slug=?, description=?, duration=?, color=?, schedule_id=?
               WHERE id=? AND user_id=? RETURNING *"#
        )
            .bind(&event_type.title)
            .bind(&event_type.slug)
            .bind(&event_type.description)
            .bind(event_type.duration)
            .bind(&event_type.color)
            .bind(&event_type.schedule_id)
            .bind(&event_type.id)
            .bind(&event_type.user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Event type not found".into()))
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM event_types WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event type not found".into()));
        }
        Ok(())
    }
}
