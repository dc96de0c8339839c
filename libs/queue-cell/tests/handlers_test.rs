// libs/queue-cell/tests/handlers_test.rs
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
use queue_cell::{queue_routes, QueueCellState, QueueCoordinator, WaitTimeEstimator};
use scheduling_cell::{AppointmentBookingService, BookAppointmentRequest, ValidationRules};
use shared_store::FixedClock;

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc()
}

struct TestApp {
    app: Router,
    scheduling: Arc<AppointmentBookingService>,
    directory: Arc<StaticDirectory>,
    doctor_id: Uuid,
    patient_id: Uuid,
}

impl TestApp {
    fn add_patient(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.directory.add_patient(Patient { id });
        id
    }

    async fn booked_appointment(&self, start: DateTime<Utc>) -> Uuid {
        self.scheduling
            .book(BookAppointmentRequest {
                patient_id: self.patient_id,
                doctor_id: self.doctor_id,
                appointment_date: start,
                duration_minutes: None,
            })
            .await
            .unwrap()
            .id
    }
}

fn test_app() -> TestApp {
    let directory = Arc::new(StaticDirectory::new());
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    directory.add_doctor(Doctor {
        id: doctor_id,
        role: StaffRole::Doctor,
        active: true,
    });
    directory.add_patient(Patient { id: patient_id });

    let clock = Arc::new(FixedClock::new(at(7, 0)));
    let (events, _rx) = EventBus::new();
    let scheduling = Arc::new(AppointmentBookingService::new(
        directory.clone(),
        clock.clone(),
        events.clone(),
        ValidationRules::default(),
    ));
    let coordinator = Arc::new(QueueCoordinator::new(
        scheduling.clone(),
        directory.clone(),
        clock,
        events,
    ));
    let wait_times = Arc::new(WaitTimeEstimator::new(
        coordinator.clone(),
        scheduling.clone(),
        30,
    ));
    let app = queue_routes(QueueCellState {
        coordinator,
        wait_times,
    });
    TestApp {
        app,
        scheduling,
        directory,
        doctor_id,
        patient_id,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn check_in_endpoint_issues_ticket() {
    let fx = test_app();
    let appointment_id = fx.booked_appointment(at(10, 0)).await;

    let response = fx
        .app
        .oneshot(post_empty(&format!("/check-in/{}", appointment_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["queue_entry"]["queue_number"], json!(1));
    assert_eq!(body["queue_entry"]["status"], json!("waiting"));
}

#[tokio::test]
async fn walk_in_endpoint_adds_entry() {
    let fx = test_app();

    let response = fx
        .app
        .oneshot(post_json(
            "/walk-in",
            json!({
                "doctor_id": fx.doctor_id,
                "patient_id": fx.patient_id,
                "department": "cardiology",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["queue_entry"]["entry_type"], json!("walk_in"));
    assert_eq!(body["queue_entry"]["department"], json!("cardiology"));
}

#[tokio::test]
async fn call_next_endpoint_accepts_missing_body() {
    let fx = test_app();
    let appointment_id = fx.booked_appointment(at(10, 0)).await;
    fx.app
        .clone()
        .oneshot(post_empty(&format!("/check-in/{}", appointment_id)))
        .await
        .unwrap();

    let response = fx
        .app
        .oneshot(post_empty(&format!("/doctors/{}/call-next", fx.doctor_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["queue_entry"]["status"], json!("in_consultation"));
    assert_eq!(body["queue_entry"]["called_by"], json!(null));
}

#[tokio::test]
async fn call_next_on_empty_queue_returns_not_found() {
    let fx = test_app();

    let response = fx
        .app
        .oneshot(post_empty(&format!("/doctors/{}/call-next", fx.doctor_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn skip_then_recall_round_trips_through_routes() {
    let fx = test_app();
    let appointment_id = fx.booked_appointment(at(10, 0)).await;
    let checked_in = fx
        .app
        .clone()
        .oneshot(post_empty(&format!("/check-in/{}", appointment_id)))
        .await
        .unwrap();
    let queue_id = response_json(checked_in).await["queue_entry"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let staff_id = Uuid::new_v4();
    let skipped = fx
        .app
        .clone()
        .oneshot(post_json(
            &format!("/{}/skip", queue_id),
            json!({ "reason": "Patient stepped out", "actor_id": staff_id }),
        ))
        .await
        .unwrap();
    assert_eq!(skipped.status(), StatusCode::OK);
    let skipped_body = response_json(skipped).await;
    assert_eq!(skipped_body["queue_entry"]["status"], json!("skipped"));
    assert_eq!(skipped_body["queue_entry"]["skipped_by"], json!(staff_id));

    let recalled = fx
        .app
        .oneshot(post_empty(&format!("/{}/recall", queue_id)))
        .await
        .unwrap();
    assert_eq!(recalled.status(), StatusCode::OK);
    let recalled_body = response_json(recalled).await;
    assert_eq!(
        recalled_body["queue_entry"]["status"],
        json!("in_consultation")
    );
    assert_eq!(recalled_body["queue_entry"]["recall_count"], json!(1));
}

#[tokio::test]
async fn completing_a_waiting_entry_returns_conflict() {
    let fx = test_app();
    let appointment_id = fx.booked_appointment(at(10, 0)).await;
    let checked_in = fx
        .app
        .clone()
        .oneshot(post_empty(&format!("/check-in/{}", appointment_id)))
        .await
        .unwrap();
    let queue_id = response_json(checked_in).await["queue_entry"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = fx
        .app
        .oneshot(post_empty(&format!("/{}/complete", queue_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn queue_listing_filters_by_status_and_date() {
    let fx = test_app();
    let first = fx.booked_appointment(at(10, 0)).await;
    fx.app
        .clone()
        .oneshot(post_empty(&format!("/check-in/{}", first)))
        .await
        .unwrap();
    let second_patient = fx.add_patient();
    fx.app
        .clone()
        .oneshot(post_json(
            "/walk-in",
            json!({ "doctor_id": fx.doctor_id, "patient_id": second_patient }),
        ))
        .await
        .unwrap();
    fx.app
        .clone()
        .oneshot(post_empty(&format!("/doctors/{}/call-next", fx.doctor_id)))
        .await
        .unwrap();

    let response = fx
        .app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/?doctor_id={}&date=2025-06-02&status=waiting",
                    fx.doctor_id
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["queue"][0]["status"], json!("waiting"));
}

#[tokio::test]
async fn unknown_entry_returns_not_found() {
    let fx = test_app();

    let response = fx
        .app
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
async fn wait_time_endpoint_reports_estimate() {
    let fx = test_app();
    fx.app
        .clone()
        .oneshot(post_json(
            "/walk-in",
            json!({ "doctor_id": fx.doctor_id, "patient_id": fx.patient_id }),
        ))
        .await
        .unwrap();

    let response = fx
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/doctors/{}/wait-time", fx.doctor_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["wait_time"]["waiting_count"], json!(1));
    assert_eq!(body["wait_time"]["estimated_wait_minutes"], json!(30));
}
