mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use serde_json::json;
use studio_booking_backend::domain::ports::BookingRepository;

async fn create(app: &TestApp, name: &str, date: &str) -> (i64, String) {
    let res = app
        .send("POST", "/bookings", Some(json!({"name": name, "date": date, "hours": 2})))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;
    (
        body["booking_id"].as_i64().unwrap(),
        body["qr_code"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_check_in_by_id() {
    let app = TestApp::new().await;
    let (id, _) = create(&app, "Jane", "2030-03-10").await;

    let res = app
        .send("POST", "/bookings/checkin", Some(json!({"booking_id": id})))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["message"], "Check-in successful");
    assert_eq!(body["booking_id"].as_i64().unwrap(), id);

    let booking = app.state.booking_repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(booking.status.as_deref(), Some("confirmed"));
    assert!(booking.check_in_time.is_some());
}

#[tokio::test]
async fn test_second_check_in_short_circuits() {
    let app = TestApp::new().await;
    let (id, _) = create(&app, "Jane", "2030-03-10").await;

    let first = app
        .send("POST", "/bookings/checkin", Some(json!({"booking_id": id})))
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    let stamped = app.state.booking_repo.get_by_id(id).await.unwrap().unwrap();
    let first_time = stamped.check_in_time.clone().unwrap();

    let second = app
        .send("POST", "/bookings/checkin", Some(json!({"booking_id": id})))
        .await;
    assert_eq!(second.status(), StatusCode::OK);
    let body = parse_body(second).await;
    assert_eq!(body["message"], "Already checked in");
    assert_eq!(body["booking_id"].as_i64().unwrap(), id);

    // The original stamp survives the repeat call.
    let after = app.state.booking_repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(after.check_in_time.unwrap(), first_time);
}

#[tokio::test]
async fn test_check_in_by_qr_payload() {
    let app = TestApp::new().await;
    let (id, qr) = create(&app, "Jane", "2030-03-10").await;

    let res = app
        .send("POST", "/bookings/checkin", Some(json!({"qr_code": qr})))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["message"], "Check-in successful");
    assert_eq!(body["booking_id"].as_i64().unwrap(), id);
}

#[tokio::test]
async fn test_booking_id_takes_precedence_over_qr() {
    let app = TestApp::new().await;
    let (id_a, _) = create(&app, "Jane", "2030-03-10").await;
    let (_, qr_b) = create(&app, "Bob", "2030-03-11").await;

    let res = app
        .send("POST", "/bookings/checkin", Some(json!({"booking_id": id_a, "qr_code": qr_b})))
        .await;
    let body = parse_body(res).await;
    assert_eq!(body["booking_id"].as_i64().unwrap(), id_a);
}

#[tokio::test]
async fn test_check_in_unknown_booking_is_404() {
    let app = TestApp::new().await;

    let res = app
        .send("POST", "/bookings/checkin", Some(json!({"booking_id": 424242})))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .send("POST", "/bookings/checkin", Some(json!({"qr_code": "no-such-payload"})))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Neither identifier supplied resolves nothing.
    let res = app.send("POST", "/bookings/checkin", Some(json!({}))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
