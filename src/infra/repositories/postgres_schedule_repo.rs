use crate::domain::{models::{availability::Availability, schedule::Schedule}, ports::ScheduleRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresScheduleRepo {
    pool: PgPool,
}

impl PostgresScheduleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PostgresScheduleRepo {
    async fn create_with_availability(&self, schedule: &Schedule, rules: &[Availability]) -> Result<Schedule, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        if schedule.is_default {
            sqlx::query("UPDATE schedules SET is_default = FALSE WHERE user_id = $1").bind(&schedule.user_id).execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        let created = sqlx::query_as::<_, Schedule>("INSERT INTO schedules (id, user_id, name, is_default, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING *")
            .bind(&schedule.id).bind(&schedule.user_id).bind(&schedule.name).bind(schedule.is_default).bind(schedule.created_at)
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

    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<Schedule>, AppError> {
        sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE user_id = $1 AND id = $2").bind(user_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Schedule>, AppError> {
        sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE user_id = $1 ORDER BY is_default DESC, created_at ASC").bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, schedule: &Schedule) -> Result<Schedule, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        if schedule.is_default {
            sqlx::query("UPDATE schedules SET is_default = FALSE WHERE user_id = $1 AND id <> $2").bind(&schedule.user_id).bind(&schedule.id).execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        let updated = sqlx::query_as::<_, Schedule>("UPDATE schedules SET name = $1, is_default = $2 WHERE id = $3 AND user_id = $4 RETURNING *")
            .bind(&schedule.name).bind(schedule.is_default).bind(&schedule.id).bind(&schedule.user_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Schedule not found".into()))?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let (was_default,) = sqlx::query_as::<_, (bool,)>("DELETE FROM schedules WHERE id = $1 AND user_id = $2 RETURNING is_default")
            .bind(id).bind(user_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Schedule not found".into()))?;
        if was_default {
            sqlx::query("UPDATE schedules SET is_default = TRUE WHERE id = (SELECT id FROM schedules WHERE user_id = $1 ORDER BY created_at ASC, id ASC LIMIT 1)")
                .bind(user_id).execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}
