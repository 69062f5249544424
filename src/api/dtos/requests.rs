use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub name: Option<String>,
    pub date: Option<String>,
    /// Accepted as a JSON number or a numeric string.
    pub hours: Option<Value>,
}

/// Reschedule accepts both the old and the new field names.
#[derive(Deserialize)]
pub struct RescheduleBookingRequest {
    pub date: Option<String>,
    pub booking_date: Option<String>,
    pub time: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Deserialize)]
pub struct CheckInRequest {
    pub booking_id: Option<i64>,
    pub qr_code: Option<String>,
}
