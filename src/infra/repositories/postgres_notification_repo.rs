use crate::domain::ports::NotificationService;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresNotificationRepo {
    pool: PgPool,
}

impl PostgresNotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationService for PostgresNotificationRepo {
    async fn notify(
        &self,
        user_id: Option<i64>,
        title: &str,
        message: &str,
        kind: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notifications (user_id, title, message, type, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(kind)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(())
    }
}
