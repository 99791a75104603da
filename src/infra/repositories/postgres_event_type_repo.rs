use crate::domain::{models::{availability::Availability, event_type::EventType}, ports::EventTypeRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresEventTypeRepo {
    pool: PgPool,
}

impl PostgresEventTypeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventTypeRepository for PostgresEventTypeRepo {
    async fn create_with_availability(&self, event_type: &EventType, rules: &[Availability]) -> Result<EventType, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let created = sqlx::query_as::<_, EventType>(
            "INSERT INTO event_types (id, user_id, schedule_id, title, slug, description, duration, color, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *"
        )
            .bind(&event_type.id).bind(&event_type.user_id).bind(&event_type.schedule_id).bind(&event_type.title)
            .bind(&event_type.slug).bind(&event_type.description).bind(event_type.duration).bind(&event_type.color)
            .bind(event_type.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        for rule in rules {
            sqlx::query("INSERT INTO availability (id, user_id, event_type_id, schedule_id, day_of_week, start_time, end_time, timezone) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
                .bind(&rule.id).bind(&rule.user_id).bind(&rule.event_type_id).bind(&rule.schedule_id)
                .bind(rule.day_of_week).bind(&rule.start_time).bind(&rule.end_time).bind(&rule.timezone)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<EventType>, AppError> {
        sqlx::query_as::<_, EventType>("SELECT * FROM event_types WHERE user_id = $1 AND id = $2").bind(user_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn get(&self, id: &str) -> Result<Option<EventType>, AppError> {
        sqlx::query_as::<_, EventType>("SELECT * FROM event_types WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<EventType>, AppError> {
        sqlx::query_as::<_, EventType>("SELECT * FROM event_types WHERE slug = $1").bind(slug).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<EventType>, AppError> {
        sqlx::query_as::<_, EventType>("SELECT * FROM event_types WHERE user_id = $1 ORDER BY created_at ASC").bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn booking_counts(&self, user_id: &str) -> Result<Vec<(String, i64)>, AppError> {
        sqlx::query_as::<_, (String, i64)>("SELECT event_type_id, COUNT(*) FROM bookings WHERE user_id = $1 GROUP BY event_type_id")
            .bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, event_type: &EventType) -> Result<EventType, AppError> {
        sqlx::query_as::<_, EventType>(
            "UPDATE event_types SET title=$1, slug=$2, description=$3, duration=$4, color=$5, schedule_id=$6 WHERE id=$7 AND user_id=$8 RETURNING *"
        )
            .bind(&event_type.title).bind(&event_type.slug).bind(&event_type.description).bind(event_type.duration)
            .bind(&event_type.color).bind(&event_type.schedule_id).bind(&event_type.id).bind(&event_type.user_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Event type not found".into()))
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM event_types WHERE id = $1 AND user_id = $2").bind(id).bind(user_id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event type not found".into()));
        }
        Ok(())
    }
}
