// libs/scheduling-cell/tests/handlers_test.rs
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use directory_cell::{Doctor, Patient, StaffRole, StaticDirectory};
use notification_cell::EventBus;
use scheduling_cell::{appointment_routes, AppointmentBookingService, ValidationRules};
use shared_store::FixedClock;

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc()
}

fn test_app() -> (Router, Uuid, Uuid) {
    let directory = Arc::new(StaticDirectory::new());
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    directory.add_doctor(Doctor {
        id: doctor_id,
        role: StaffRole::Doctor,
        active: true,
    });
    directory.add_patient(Patient { id: patient_id });

    let (events, _rx) = EventBus::new();
    let service = Arc::new(AppointmentBookingService::new(
        directory,
        Arc::new(FixedClock::new(at(7, 0))),
        events,
        ValidationRules::default(),
    ));
    (appointment_routes(service), doctor_id, patient_id)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn book_endpoint_returns_created_appointment() {
    let (app, doctor_id, patient_id) = test_app();

    let response = app
        .oneshot(post_json(
            "/",
            json!({
                "patient_id": patient_id,
                "doctor_id": doctor_id,
                "appointment_date": at(10, 0),
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["appointment"]["status"], json!("scheduled"));
    assert_eq!(body["appointment"]["duration_minutes"], json!(30));
}

#[tokio::test]
async fn double_booking_returns_conflict() {
    let (app, doctor_id, patient_id) = test_app();
    let request_body = json!({
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "appointment_date": at(10, 0),
    });

    let first = app
        .clone()
        .oneshot(post_json("/", request_body.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(post_json("/", request_body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_appointment_returns_not_found() {
    let (app, _, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn slots_endpoint_lists_working_day_grid() {
    let (app, doctor_id, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/doctors/{}/slots?date=2025-06-02", doctor_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["slots"].as_array().unwrap().len(), 18);
}

#[tokio::test]
async fn slots_endpoint_rejects_zero_slot_width() {
    let (app, doctor_id, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/doctors/{}/slots?date=2025-06-02&slot_minutes=0",
                    doctor_id
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reschedule_endpoint_moves_appointment() {
    let (app, doctor_id, patient_id) = test_app();

    let booked = app
        .clone()
        .oneshot(post_json(
            "/",
            json!({
                "patient_id": patient_id,
                "doctor_id": doctor_id,
                "appointment_date": at(10, 0),
            }),
        ))
        .await
        .unwrap();
    let booked_body = response_json(booked).await;
    let id = booked_body["appointment"]["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{}/reschedule", id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "new_start_time": at(14, 0) }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["appointment"]["status"], json!("rescheduled"));
}
