use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRMED: &str = "confirmed";

/// A studio/lesson reservation for one client on one calendar date.
///
/// Fields are optional wherever the live table may simply not have the
/// column; rows are assembled by the repositories from whatever the resolved
/// schema provides.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    pub id: i64,
    pub student_id: Option<i64>,
    pub instructor_id: Option<i64>,
    pub lesson_type: Option<String>,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Option<String>,
    pub client_name: Option<String>,
    pub hours: Option<f64>,
    pub status: Option<String>,
    pub qr_code: Option<String>,
    pub check_in_time: Option<String>,
}

impl Booking {
    /// Check-in overloads the `confirmed` status; some legacy rows carry the
    /// literal "Checked In" instead.
    pub fn is_checked_in(&self) -> bool {
        matches!(self.status.as_deref(), Some(STATUS_CONFIRMED) | Some("Checked In"))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.status.as_deref(), Some("cancelled") | Some("Cancelled"))
    }
}

/// Field set for a dynamic insert. Only columns present in the resolved
/// schema are written; the date is the one mandatory attribute.
#[derive(Debug, Clone, Default)]
pub struct NewBooking {
    pub student_id: Option<i64>,
    pub instructor_id: Option<i64>,
    pub lesson_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Option<String>,
    pub client_name: Option<String>,
    pub hours: Option<f64>,
    pub qr_code: Option<String>,
}

/// Partial update for reschedule and lifecycle transitions. Absent fields
/// are left untouched.
#[derive(Debug, Clone, Default)]
pub struct BookingPatch {
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: Option<String>,
}
