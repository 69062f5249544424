use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::dtos::requests::{CheckInRequest, CreateBookingRequest, RescheduleBookingRequest};
use crate::api::dtos::responses::{
    BookingCreatedResponse, CheckInResponse, MessageResponse, QrCodeResponse, UserBookingsResponse,
};
use crate::domain::models::booking::{BookingPatch, NewBooking};
use crate::domain::services::qr;
use crate::error::AppError;
use crate::state::AppState;

/// Accepts `YYYY-MM-DD`, a full RFC 3339 datetime, or `MM/DD/YYYY`; the
/// stored form is always the plain calendar date.
fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%m/%d/%Y") {
        return Some(d);
    }
    None
}

/// Hours arrive as a JSON number or a numeric string; anything that is not
/// finite and positive is rejected.
fn parse_hours(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() && n > 0.0 {
        Some(n)
    } else {
        None
    }
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let (name, date_raw, hours_raw) = match (name, &payload.date, &payload.hours) {
        (Some(n), Some(d), Some(h)) => (n.to_string(), d, h),
        _ => return Err(AppError::Validation("name, date and hours are required".into())),
    };

    let date = parse_date(date_raw).ok_or_else(|| {
        AppError::Validation("Invalid date format. Use YYYY-MM-DD or a parseable date.".into())
    })?;
    let hours = parse_hours(hours_raw)
        .ok_or_else(|| AppError::Validation("Invalid hours value".into()))?;

    // Only an exact (name, date) repeat is blocked; different clients may
    // share a date. Check-then-insert is not transactional.
    if state.booking_repo.find_duplicate(&name, date).await?.is_some() {
        return Err(AppError::Conflict("Time slot already booked".into()));
    }

    let qr_data = qr::identifier(&name, date);
    let qr_code = qr::render(&qr_data)?;

    let new_booking = NewBooking {
        lesson_type: Some("Session".to_string()),
        date: Some(date),
        notes: Some(format!("Name:{}; Hours:{}", name, hours)),
        client_name: Some(name.clone()),
        hours: Some(hours),
        qr_code: Some(qr_code.clone()),
        ..Default::default()
    };

    let booking_id = state.booking_repo.create(&new_booking).await?;
    info!("Booking created: {} for {} on {}", booking_id, name, date);

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            message: "Booking created".to_string(),
            booking_id,
            qr_code,
            status: "pending".to_string(),
        }),
    ))
}

pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RescheduleBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date_raw = payload.date.or(payload.booking_date);
    let start_time = payload.time.or(payload.start_time);

    let booking = state
        .booking_repo
        .get_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    let mut new_date = None;
    if let Some(raw) = &date_raw {
        let date = parse_date(raw).ok_or_else(|| {
            AppError::Validation("Invalid date format. Use YYYY-MM-DD or a parseable date.".into())
        })?;
        // A collision only counts when some other non-cancelled booking
        // holds the target date; moving within the own slot is fine.
        if state.booking_repo.check_conflict(date).await?
            && state.booking_repo.conflict_excluding(date, id).await?
        {
            return Err(AppError::Conflict("Time slot already booked".into()));
        }
        new_date = Some(date);
    }

    let patch = BookingPatch {
        date: new_date,
        start_time,
        end_time: payload.end_time,
        status: None,
    };
    state.booking_repo.update(id, &patch).await?;
    info!("Booking rescheduled: {}", id);

    let effective_date = new_date.unwrap_or(booking.date);
    if let Err(e) = state
        .notifier
        .notify(
            booking.student_id,
            "Booking Rescheduled",
            &format!("Your booking has been rescheduled to {}", effective_date),
            "booking",
        )
        .await
    {
        warn!("notification insert failed after reschedule: {}", e);
    }

    Ok(Json(MessageResponse {
        message: "Booking rescheduled".to_string(),
    }))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .booking_repo
        .get_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    state.booking_repo.delete(id).await?;
    info!("Booking cancelled: {}", id);

    if let Err(e) = state
        .notifier
        .notify(
            booking.student_id,
            "Booking Cancelled",
            &format!("Your booking on {} has been canceled", booking.date),
            "booking",
        )
        .await
    {
        warn!("notification insert failed after cancel: {}", e);
    }

    Ok(Json(MessageResponse {
        message: "Booking canceled".to_string(),
    }))
}

pub async fn get_qr_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .booking_repo
        .get_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    Ok(Json(QrCodeResponse {
        booking_id: booking.id,
        qr_code: booking.qr_code,
    }))
}

pub async fn get_bookings_by_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.get_by_user(user_id).await?;
    let count = bookings.len();

    Ok(Json(UserBookingsResponse {
        message: "Bookings retrieved successfully".to_string(),
        bookings,
        count,
    }))
}

pub async fn check_in_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckInRequest>,
) -> Result<impl IntoResponse, AppError> {
    // The numeric id wins when both are supplied.
    let booking = if let Some(id) = payload.booking_id {
        state.booking_repo.get_by_id(id).await?
    } else if let Some(qr) = &payload.qr_code {
        state.booking_repo.get_by_qr(qr).await?
    } else {
        None
    };

    let booking = booking.ok_or(AppError::NotFound("Booking not found".into()))?;

    if booking.is_checked_in() {
        return Ok(Json(CheckInResponse {
            message: "Already checked in".to_string(),
            booking_id: booking.id,
        }));
    }

    state.booking_repo.mark_checked_in(booking.id).await?;
    info!("Booking checked in: {}", booking.id);

    let lesson = booking.lesson_type.clone().unwrap_or_else(|| "booking".to_string());
    if let Err(e) = state
        .notifier
        .notify(
            booking.student_id,
            "Check-in Successful",
            &format!("Checked in for your {} on {}", lesson, booking.date),
            "booking",
        )
        .await
    {
        warn!("notification insert failed after check-in: {}", e);
    }

    Ok(Json(CheckInResponse {
        message: "Check-in successful".to_string(),
        booking_id: booking.id,
    }))
}
