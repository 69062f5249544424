use crate::domain::models::booking::{Booking, BookingPatch, NewBooking};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts a row using only the columns the resolved schema actually
    /// has. Returns the generated id. Fails with `AppError::Schema` when no
    /// writable column can be resolved at all.
    async fn create(&self, booking: &NewBooking) -> Result<i64, AppError>;

    /// First non-cancelled booking on `date` identified by the client's
    /// name, preferring structured columns (`client_name`, then `name`)
    /// over the notes-marker fallback. `None` when the schema offers no way
    /// to identify the client, which deliberately allows the booking.
    async fn find_duplicate(&self, name: &str, date: NaiveDate) -> Result<Option<Booking>, AppError>;

    /// Whether any non-cancelled booking exists on `date`.
    async fn check_conflict(&self, date: NaiveDate) -> Result<bool, AppError>;

    /// Whether a non-cancelled booking other than `exclude_id` occupies `date`.
    async fn conflict_excluding(&self, date: NaiveDate, exclude_id: i64) -> Result<bool, AppError>;

    async fn update(&self, id: i64, patch: &BookingPatch) -> Result<(), AppError>;

    /// Hard delete. Cancellation is destructive in this design.
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Booking>, AppError>;

    /// Bookings where the user is the student or the instructor, newest
    /// date first.
    async fn get_by_user(&self, user_id: i64) -> Result<Vec<Booking>, AppError>;

    async fn get_by_qr(&self, qr_code: &str) -> Result<Option<Booking>, AppError>;

    /// Sets status to confirmed and stamps the check-in time.
    async fn mark_checked_in(&self, id: i64) -> Result<(), AppError>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Records a booking-lifecycle notification for a user. Callers treat
    /// failures as best-effort and never roll back booking state.
    async fn notify(
        &self,
        user_id: Option<i64>,
        title: &str,
        message: &str,
        kind: &str,
    ) -> Result<(), AppError>;
}
