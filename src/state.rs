use crate::config::Config;
use crate::domain::ports::{BookingRepository, NotificationService};
use crate::infra::schema::BookingColumns;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub schema: Arc<BookingColumns>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub notifier: Arc<dyn NotificationService>,
}
