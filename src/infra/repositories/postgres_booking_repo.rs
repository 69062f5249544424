use crate::domain::models::booking::{Booking, BookingPatch, NewBooking, STATUS_CONFIRMED, STATUS_PENDING};
use crate::domain::ports::BookingRepository;
use crate::error::AppError;
use crate::infra::schema::BookingColumns;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

enum SqlValue {
    Int(Option<i64>),
    Text(Option<String>),
    Real(Option<f64>),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
}

fn q(col: &str) -> String {
    format!("\"{}\"", col)
}

fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("${}", i)).collect::<Vec<_>>().join(", ")
}

fn bind_all<'a>(
    mut query: sqlx::query::Query<'a, sqlx::Postgres, sqlx::postgres::PgArguments>,
    binds: &'a [SqlValue],
) -> sqlx::query::Query<'a, sqlx::Postgres, sqlx::postgres::PgArguments> {
    for value in binds {
        query = match value {
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.clone()),
            SqlValue::Real(v) => query.bind(*v),
            SqlValue::Date(v) => query.bind(*v),
            SqlValue::Timestamp(v) => query.bind(*v),
        };
    }
    query
}

pub struct PostgresBookingRepo {
    pool: PgPool,
    schema: Arc<BookingColumns>,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool, schema: Arc<BookingColumns>) -> Self {
        Self { pool, schema }
    }

    fn active_filter(&self) -> &'static str {
        if self.schema.has("status") {
            " AND \"status\" NOT IN ('cancelled', 'Cancelled')"
        } else {
            ""
        }
    }

    fn booking_from_row(&self, row: &PgRow) -> Result<Booking, AppError> {
        let id: i64 = match row.try_get::<i64, _>(self.schema.id_column()) {
            Ok(v) => v,
            Err(_) => row
                .try_get::<i32, _>(self.schema.id_column())
                .map(i64::from)
                .map_err(AppError::Database)?,
        };

        // A drifted schema may hold the date as TEXT instead of DATE.
        let date = match row.try_get::<NaiveDate, _>(self.schema.date_column()) {
            Ok(d) => d,
            Err(_) => {
                let raw: String = row
                    .try_get(self.schema.date_column())
                    .map_err(AppError::Database)?;
                NaiveDate::parse_from_str(&raw[..raw.len().min(10)], "%Y-%m-%d")
                    .map_err(|_| AppError::Schema(format!("unparseable booking date: {}", raw)))?
            }
        };

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
            check_in_time: row
                .try_get::<Option<DateTime<Utc>>, _>("check_in_time")
                .ok()
                .flatten()
                .map(|t| t.to_rfc3339()),
        })
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        binds: Vec<SqlValue>,
    ) -> Result<Option<Booking>, AppError> {
        let sql = format!("SELECT * FROM bookings WHERE {} LIMIT 1", condition);
        let query = bind_all(sqlx::query(&sql), &binds);
        let row = query.fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(|r| self.booking_from_row(&r)).transpose()
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
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

        columns.push(self.schema.date_column().to_string());
        binds.push(SqlValue::Date(booking.date));

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
            binds.push(SqlValue::Timestamp(Some(Utc::now())));
        }

        let col_list = columns.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ");
        let sql = format!(
            "INSERT INTO bookings ({}) VALUES ({}) RETURNING {}",
            col_list,
            placeholders(columns.len()),
            q(self.schema.id_column())
        );

        let query = bind_all(sqlx::query(&sql), &binds);
        let row = query.fetch_one(&self.pool).await.map_err(AppError::Database)?;
        match row.try_get::<i64, _>(0) {
            Ok(id) => Ok(id),
            Err(_) => row.try_get::<i32, _>(0).map(i64::from).map_err(AppError::Database),
        }
    }

    async fn find_duplicate(&self, name: &str, date: NaiveDate) -> Result<Option<Booking>, AppError> {
        let date_col = q(self.schema.date_column());

        if let Some(col) = self.schema.pick(&["client_name", "name"]) {
            let condition = format!("{} = $1 AND {} = $2{}", date_col, q(col), self.active_filter());
            return self
                .fetch_one_where(
                    &condition,
                    vec![SqlValue::Date(Some(date)), SqlValue::Text(Some(name.to_string()))],
                )
                .await;
        }

        if self.schema.has("notes") {
            let condition = format!("{} = $1 AND \"notes\" LIKE $2{}", date_col, self.active_filter());
            return self
                .fetch_one_where(
                    &condition,
                    vec![
                        SqlValue::Date(Some(date)),
                        SqlValue::Text(Some(format!("Name:{}%", name))),
                    ],
                )
                .await;
        }

        Ok(None)
    }

    async fn check_conflict(&self, date: NaiveDate) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM bookings WHERE {} = $1{}",
            q(self.schema.date_column()),
            self.active_filter()
        );
        let row = sqlx::query(&sql)
            .bind(date)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn conflict_excluding(&self, date: NaiveDate, exclude_id: i64) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM bookings WHERE {} = $1 AND {} != $2{}",
            q(self.schema.date_column()),
            q(self.schema.id_column()),
            self.active_filter()
        );
        let row = sqlx::query(&sql)
            .bind(date)
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
            binds.push(SqlValue::Date(Some(date)));
            sets.push(format!("{} = ${}", q(self.schema.date_column()), binds.len()));
        }
        if let Some(start) = &patch.start_time {
            if self.schema.has("start_time") {
                binds.push(SqlValue::Text(Some(start.clone())));
                sets.push(format!("\"start_time\" = ${}", binds.len()));
            }
        }
        if let Some(end) = &patch.end_time {
            if self.schema.has("end_time") {
                binds.push(SqlValue::Text(Some(end.clone())));
                sets.push(format!("\"end_time\" = ${}", binds.len()));
            }
        }
        if let Some(status) = &patch.status {
            if self.schema.has("status") {
                binds.push(SqlValue::Text(Some(status.clone())));
                sets.push(format!("\"status\" = ${}", binds.len()));
            }
        }
        if self.schema.has("updated_at") {
            binds.push(SqlValue::Timestamp(Some(Utc::now())));
            sets.push(format!("\"updated_at\" = ${}", binds.len()));
        }

        if sets.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE bookings SET {} WHERE {} = ${}",
            sets.join(", "),
            q(self.schema.id_column()),
            binds.len() + 1
        );
        let query = bind_all(sqlx::query(&sql), &binds);
        query.bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let sql = format!("DELETE FROM bookings WHERE {} = $1", q(self.schema.id_column()));
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
        let condition = format!("{} = $1", q(self.schema.id_column()));
        self.fetch_one_where(&condition, vec![SqlValue::Int(Some(id))]).await
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Vec<Booking>, AppError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut binds: Vec<SqlValue> = Vec::new();
        if self.schema.has("student_id") {
            binds.push(SqlValue::Int(Some(user_id)));
            conditions.push(format!("\"student_id\" = ${}", binds.len()));
        }
        if self.schema.has("instructor_id") {
            binds.push(SqlValue::Int(Some(user_id)));
            conditions.push(format!("\"instructor_id\" = ${}", binds.len()));
        }
        if conditions.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT * FROM bookings WHERE {} ORDER BY {} DESC",
            conditions.join(" OR "),
            q(self.schema.date_column())
        );
        let query = bind_all(sqlx::query(&sql), &binds);
        let rows = query.fetch_all(&self.pool).await.map_err(AppError::Database)?;
        rows.iter().map(|r| self.booking_from_row(r)).collect()
    }

    async fn get_by_qr(&self, qr_code: &str) -> Result<Option<Booking>, AppError> {
        if !self.schema.has("qr_code") {
            return Ok(None);
        }
        self.fetch_one_where(
            "\"qr_code\" = $1",
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

        let mut sets = vec!["\"status\" = $1".to_string()];
        let mut next = 2;
        if self.schema.has("check_in_time") {
            sets.push(format!("\"check_in_time\" = ${}", next));
            next += 1;
        }
        let sql = format!(
            "UPDATE bookings SET {} WHERE {} = ${}",
            sets.join(", "),
            q(self.schema.id_column()),
            next
        );

        let mut query = sqlx::query(&sql).bind(STATUS_CONFIRMED);
        if self.schema.has("check_in_time") {
            query = query.bind(Utc::now());
        }
        query.bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
