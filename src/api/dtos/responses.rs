use crate::domain::models::booking::Booking;
use serde::Serialize;

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub message: String,
    pub booking_id: i64,
    pub qr_code: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct QrCodeResponse {
    pub booking_id: i64,
    pub qr_code: Option<String>,
}

#[derive(Serialize)]
pub struct UserBookingsResponse {
    pub message: String,
    pub bookings: Vec<Booking>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct CheckInResponse {
    pub message: String,
    pub booking_id: i64,
}
