use crate::domain::{models::availability::{Availability, AvailabilityScope}, ports::AvailabilityRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresAvailabilityRepo {
    pool: PgPool,
}

impl PostgresAvailabilityRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_SQL: &str = "INSERT INTO availability (id, user_id, event_type_id, schedule_id, day_of_week, start_time, end_time, timezone) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

#[async_trait]
impl AvailabilityRepository for PostgresAvailabilityRepo {
    async fn upsert(&self, rule: &Availability) -> Result<Availability, AppError> {
        let sql = format!(
            "{} ON CONFLICT (event_type_id, day_of_week) WHERE event_type_id IS NOT NULL DO UPDATE SET start_time = EXCLUDED.start_time, end_time = EXCLUDED.end_time, timezone = EXCLUDED.timezone RETURNING *",
            INSERT_SQL
        );
        sqlx::query_as::<_, Availability>(&sql)
            .bind(&rule.id).bind(&rule.user_id).bind(&rule.event_type_id).bind(&rule.schedule_id)
            .bind(rule.day_of_week).bind(&rule.start_time).bind(&rule.end_time).bind(&rule.timezone)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<Availability>, AppError> {
        sqlx::query_as::<_, Availability>("SELECT * FROM availability WHERE user_id = $1 AND id = $2").bind(user_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event_type(&self, event_type_id: &str) -> Result<Vec<Availability>, AppError> {
        sqlx::query_as::<_, Availability>("SELECT * FROM availability WHERE event_type_id = $1 ORDER BY day_of_week ASC, start_time ASC").bind(event_type_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_schedule(&self, schedule_id: &str) -> Result<Vec<Availability>, AppError> {
        sqlx::query_as::<_, Availability>("SELECT * FROM availability WHERE schedule_id = $1 ORDER BY day_of_week ASC, start_time ASC").bind(schedule_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Availability>, AppError> {
        sqlx::query_as::<_, Availability>("SELECT * FROM availability WHERE user_id = $1 ORDER BY day_of_week ASC, start_time ASC").bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, rule: &Availability) -> Result<Availability, AppError> {
        sqlx::query_as::<_, Availability>(
            "UPDATE availability SET day_of_week=$1, start_time=$2, end_time=$3, timezone=$4 WHERE id=$5 AND user_id=$6 RETURNING *"
        )
            .bind(rule.day_of_week).bind(&rule.start_time).bind(&rule.end_time).bind(&rule.timezone)
            .bind(&rule.id).bind(&rule.user_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Availability rule not found".into()))
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM availability WHERE id = $1 AND user_id = $2").bind(id).bind(user_id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Availability rule not found".into()));
        }
        Ok(())
    }

    async fn replace(&self, scope: &AvailabilityScope, rules: &[Availability]) -> Result<Vec<Availability>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let (clear_sql, scope_id) = match scope {
            AvailabilityScope::EventType(id) => ("DELETE FROM availability WHERE event_type_id = $1", id),
            AvailabilityScope::Schedule(id) => ("DELETE FROM availability WHERE schedule_id = $1", id),
        };
        sqlx::query(clear_sql).bind(scope_id).execute(&mut *tx).await.map_err(AppError::Database)?;

        let insert_returning = format!("{} RETURNING *", INSERT_SQL);
        let mut created = Vec::with_capacity(rules.len());
        for rule in rules {
            let row = sqlx::query_as::<_, Availability>(&insert_returning)
                .bind(&rule.id).bind(&rule.user_id).bind(&rule.event_type_id).bind(&rule.schedule_id)
                .bind(rule.day_of_week).bind(&rule.start_time).bind(&rule.end_time).bind(&rule.timezone)
                .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
            created.push(row);
        }
        tx.commit().await.map_err(AppError::Database)?;

        created.sort_by(|a, b| (a.day_of_week, &a.start_time).cmp(&(b.day_of_week, &b.start_time)));
        Ok(created)
    }
}
