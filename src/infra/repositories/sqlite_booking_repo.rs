use crate::domain::models::booking::{Booking, BookingPatch, NewBooking, STATUS_CONFIRMED, STATUS_PENDING};
use crate::domain::ports::BookingRepository;
use crate::error::AppError;
use crate::infra::schema::BookingColumns;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

enum SqlValue {
    Int(Option<i64>),
    Text(Option<String>),
    Real(Option<f64>),
}

fn q(col: &str) -> String {
    format!("\"{}\"", col)
}

pub struct SqliteBookingRepo {
    pool: SqlitePool,
    schema: Arc<BookingColumns>,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool, schema: Arc<BookingColumns>) -> Self {
        Self { pool, schema }
    }

    /// Cancelled rows never count toward duplicate or conflict checks. Only
    /// applicable when the table actually has a status column.
    fn active_filter(&self) -> &'static str {
        if self.schema.has("status") {
            " AND \"status\" NOT IN ('cancelled', 'Cancelled')"
        } else {
            ""
        }
    }

    fn booking_from_row(&self, row: &SqliteRow) -> Result<Booking, AppError> {
        let id: i64 = row.try_get(self.schema.id_column()).map_err(AppError::Database)?;

        // Dates live in TEXT columns on sqlite; tolerate a trailing time part.
        let raw: String = row.try_get(self.schema.date_column()).map_err(AppError::Database)?;
        let date = NaiveDate::parse_from_str(&raw[..raw.len().min(10)], "%Y-%m-%d")
            .map_err(|_| AppError::Schema(format!("unparseable booking date: {}", raw)))?;

        Ok(Booking {
            id,
            date,
            student_id: row.try_get::<Option<i64>, _>("student_id").ok().flatten(),
            instructor_id: row.try_get::<Option<i64>, _>("instructor_id").ok().flatten(),
            lesson_type: row.try_get::<Option<String>, _>("lesson_type").ok().flatten(),
            start_time: row.try_get::<Option<String>, _>("start_time").ok().flatten(),
            end_time: row.try_get::<Option<String>, _>("end_time").ok().flatten(),
            notes: row.try_get::<Option<String>, _>("notes").ok().flatten(),
            client_name: row
                .try_get::<Option<String>, _>("client_name")
                .ok()
                .flatten()
                .or_else(|| row.try_get::<Option<String>, _>("name").ok().flatten()),
            hours: row.try_get::<Option<f64>, _>("hours").ok().flatten(),
            status: row.try_get::<Option<String>, _>("status").ok().flatten(),
            qr_code: row.try_get::<Option<String>, _>("qr_code").ok().flatten(),
            check_in_time: row.try_get::<Option<String>, _>("check_in_time").ok().flatten(),
        })
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        binds: Vec<SqlValue>,
    ) -> Result<Option<Booking>, AppError> {
        let sql = format!("SELECT * FROM bookings WHERE {} LIMIT 1", condition);
        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = match value {
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
                SqlValue::Real(v) => query.bind(*v),
            };
        }
        let row = query.fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(|r| self.booking_from_row(&r)).transpose()
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &NewBooking) -> Result<i64, AppError> {
        let mut columns: Vec<String> = Vec::new();
        let mut binds: Vec<SqlValue> = Vec::new();

        if self.schema.has("student_id") {
            columns.push("student_id".into());
            binds.push(SqlValue::Int(booking.student_id));
        }
        if self.schema.has("instructor_id") {
            columns.push("instructor_id".into());
            binds.push(SqlValue::Int(booking.instructor_id));
        }
        if self.schema.has("lesson_type") {
            columns.push("lesson_type".into());
            binds.push(SqlValue::Text(Some(
                booking.lesson_type.clone().unwrap_or_else(|| "Recording Studio".to_string()),
            )));
        }

        // The resolved date column is always written.
        columns.push(self.schema.date_column().to_string());
        binds.push(SqlValue::Text(booking.date.map(|d| d.format("%Y-%m-%d").to_string())));

        if self.schema.has("start_time") {
            columns.push("start_time".into());
            binds.push(SqlValue::Text(booking.start_time.clone()));
        }
        if self.schema.has("end_time") {
            columns.push("end_time".into());
            binds.push(SqlValue::Text(booking.end_time.clone()));
        }
        if self.schema.has("status") {
            columns.push("status".into());
            binds.push(SqlValue::Text(Some(STATUS_PENDING.to_string())));
        }

        // Prefer a structured client column; otherwise the notes marker is
        // the only thing identifying the client.
        if let Some(col) = self.schema.pick(&["client_name", "name"]) {
            columns.push(col.into());
            binds.push(SqlValue::Text(booking.client_name.clone()));
        } else if self.schema.has("notes") {
            columns.push("notes".into());
            binds.push(SqlValue::Text(booking.notes.clone()));
        }

        if self.schema.has("hours") {
            columns.push("hours".into());
            binds.push(SqlValue::Real(booking.hours));
        }
        if self.schema.has("qr_code") {
            columns.push("qr_code".into());
            binds.push(SqlValue::Text(booking.qr_code.clone()));
        }

        if columns.is_empty() {
            return Err(AppError::Schema(
                "no writable columns found for bookings table".to_string(),
            ));
        }

        if self.schema.has("created_at") {
            columns.push("created_at".into());
            binds.push(SqlValue::Text(Some(Utc::now().to_rfc3339())));
        }

        let col_list = columns.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!("INSERT INTO bookings ({}) VALUES ({})", col_list, placeholders);

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = match value {
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
                SqlValue::Real(v) => query.bind(*v),
            };
        }
        let result = query.execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.last_insert_rowid())
    }

    async fn find_duplicate(&self, name: &str, date: NaiveDate) -> Result<Option<Booking>, AppError> {
        let date_text = date.format("%Y-%m-%d").to_string();
        let date_col = q(self.schema.date_column());

        if let Some(col) = self.schema.pick(&["client_name", "name"]) {
            let condition = format!("{} = ? AND {} = ?{}", date_col, q(col), self.active_filter());
            return self
                .fetch_one_where(
                    &condition,
                    vec![SqlValue::Text(Some(date_text)), SqlValue::Text(Some(name.to_string()))],
                )
                .await;
        }

        if self.schema.has("notes") {
            // Low-confidence fallback: the minimal flow embeds
            // "Name:<name>; Hours:<n>" into notes.
            let condition = format!("{} = ? AND \"notes\" LIKE ?{}", date_col, self.active_filter());
            return self
                .fetch_one_where(
                    &condition,
                    vec![
                        SqlValue::Text(Some(date_text)),
                        SqlValue::Text(Some(format!("Name:{}%", name))),
                    ],
                )
                .await;
        }

        // Nothing identifies the client in this schema; allow the booking.
        Ok(None)
    }

    async fn check_conflict(&self, date: NaiveDate) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM bookings WHERE {} = ?{}",
            q(self.schema.date_column()),
            self.active_filter()
        );
        let row = sqlx::query(&sql)
            .bind(date.format("%Y-%m-%d").to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn conflict_excluding(&self, date: NaiveDate, exclude_id: i64) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM bookings WHERE {} = ? AND {} != ?{}",
            q(self.schema.date_column()),
            q(self.schema.id_column()),
            self.active_filter()
        );
        let row = sqlx::query(&sql)
            .bind(date.format("%Y-%m-%d").to_string())
            .bind(exclude_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn update(&self, id: i64, patch: &BookingPatch) -> Result<(), AppError> {
        let mut sets: Vec<String> = Vec::new();
        let mut binds: Vec<SqlValue> = Vec::new();

        if let Some(date) = patch.date {
            sets.push(format!("{} = ?", q(self.schema.date_column())));
            binds.push(SqlValue::Text(Some(date.format("%Y-%m-%d").to_string())));
        }
        if let Some(start) = &patch.start_time {
            if self.schema.has("start_time") {
                sets.push("\"start_time\" = ?".into());
                binds.push(SqlValue::Text(Some(start.clone())));
            }
        }
        if let Some(end) = &patch.end_time {
            if self.schema.has("end_time") {
                sets.push("\"end_time\" = ?".into());
                binds.push(SqlValue::Text(Some(end.clone())));
            }
        }
        if let Some(status) = &patch.status {
            if self.schema.has("status") {
                sets.push("\"status\" = ?".into());
                binds.push(SqlValue::Text(Some(status.clone())));
            }
        }
        if self.schema.has("updated_at") {
            sets.push("\"updated_at\" = ?".into());
            binds.push(SqlValue::Text(Some(Utc::now().to_rfc3339())));
        }

        if sets.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE bookings SET {} WHERE {} = ?",
            sets.join(", "),
            q(self.schema.id_column())
        );
        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = match value {
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
                SqlValue::Real(v) => query.bind(*v),
            };
        }
        query.bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let sql = format!("DELETE FROM bookings WHERE {} = ?", q(self.schema.id_column()));
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".into()));
        }
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Booking>, AppError> {
        let condition = format!("{} = ?", q(self.schema.id_column()));
        self.fetch_one_where(&condition, vec![SqlValue::Int(Some(id))]).await
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Vec<Booking>, AppError> {
        let mut conditions: Vec<String> = Vec::new();
        if self.schema.has("student_id") {
            conditions.push("\"student_id\" = ?".into());
        }
        if self.schema.has("instructor_id") {
            conditions.push("\"instructor_id\" = ?".into());
        }
        if conditions.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT * FROM bookings WHERE {} ORDER BY {} DESC",
            conditions.join(" OR "),
            q(self.schema.date_column())
        );
        let mut query = sqlx::query(&sql);
        for _ in &conditions {
            query = query.bind(user_id);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(AppError::Database)?;
        rows.iter().map(|r| self.booking_from_row(r)).collect()
    }

    async fn get_by_qr(&self, qr_code: &str) -> Result<Option<Booking>, AppError> {
        if !self.schema.has("qr_code") {
            return Ok(None);
        }
        self.fetch_one_where(
            "\"qr_code\" = ?",
            vec![SqlValue::Text(Some(qr_code.to_string()))],
        )
        .await
    }

    async fn mark_checked_in(&self, id: i64) -> Result<(), AppError> {
        if !self.schema.has("status") {
            return Err(AppError::Schema(
                "bookings table has no status column, cannot check in".to_string(),
            ));
        }

        let mut sets = vec!["\"status\" = ?".to_string()];
        if self.schema.has("check_in_time") {
            sets.push("\"check_in_time\" = ?".into());
        }
        let sql = format!(
            "UPDATE bookings SET {} WHERE {} = ?",
            sets.join(", "),
            q(self.schema.id_column())
        );

        let mut query = sqlx::query(&sql).bind(STATUS_CONFIRMED);
        if self.schema.has("check_in_time") {
            query = query.bind(Utc::now().to_rfc3339());
        }
        query.bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
