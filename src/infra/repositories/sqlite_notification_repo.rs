use crate::domain::ports::NotificationService;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteNotificationRepo {
    pool: SqlitePool,
}

impl SqliteNotificationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationService for SqliteNotificationRepo {
    async fn notify(
        &self,
        user_id: Option<i64>,
        title: &str,
        message: &str,
        kind: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notifications (user_id, title, message, type, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(kind)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(())
    }
}
