use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo,
    postgres_notification_repo::PostgresNotificationRepo,
    sqlite_booking_repo::SqliteBookingRepo,
    sqlite_notification_repo::SqliteNotificationRepo,
};
use crate::infra::schema::BookingColumns;
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        sqlx::migrate!("./migrations/postgres")
            .run(&pool)
            .await
            .expect("Failed to run Postgres migrations");

        // Column snapshot taken once; everything downstream resolves column
        // names through it.
        let schema = Arc::new(BookingColumns::load_postgres(&pool).await);
        info!(
            "Resolved bookings columns: id={}, date={}",
            schema.id_column(),
            schema.date_column()
        );

        AppState {
            config: config.clone(),
            booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone(), schema.clone())),
            notifier: Arc::new(PostgresNotificationRepo::new(pool)),
            schema,
        }
    } else {
        info!("Initializing SQLite connection...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite URL")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to run SQLite migrations");

        let schema = Arc::new(BookingColumns::load_sqlite(&pool).await);
        info!(
            "Resolved bookings columns: id={}, date={}",
            schema.id_column(),
            schema.date_column()
        );

        AppState {
            config: config.clone(),
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone(), schema.clone())),
            notifier: Arc::new(SqliteNotificationRepo::new(pool)),
            schema,
        }
    }
}
