use crate::error::AppError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use image::Luma;
use qrcode::QrCode;
use std::io::Cursor;

/// Deterministic scannable token for a booking: `booking:<name>-<YYYY-MM-DD>`
/// with whitespace runs collapsed to `_` so the token stays URL-safe.
/// Uniqueness across bookings is guaranteed by the duplicate invariant on
/// (name, date), not by this function.
pub fn identifier(name: &str, date: NaiveDate) -> String {
    let sanitized = name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("booking:{}-{}", sanitized, date.format("%Y-%m-%d"))
}

/// Encodes the identifier as a PNG data URI suitable for embedding directly
/// in a JSON payload. Pure; a render failure is fatal for the request.
pub fn render(identifier: &str) -> Result<String, AppError> {
    let code = QrCode::new(identifier.as_bytes())
        .map_err(|e| AppError::Encoding(format!("QR payload rejected: {}", e)))?;

    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(200, 200)
        .build();

    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| AppError::Encoding(format!("PNG encoding failed: {}", e)))?;

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}
