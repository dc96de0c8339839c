// libs/queue-cell/tests/wait_time_test.rs
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use directory_cell::{Doctor, Patient, StaffRole, StaticDirectory};
use notification_cell::EventBus;
use queue_cell::{QueueCoordinator, WaitTimeEstimator, WalkInRequest};
use scheduling_cell::{
    AppointmentBookingService, AppointmentStatus, BookAppointmentRequest, ValidationRules,
};
use shared_store::FixedClock;

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc()
}

struct Fixture {
    scheduling: Arc<AppointmentBookingService>,
    queue: Arc<QueueCoordinator>,
    estimator: WaitTimeEstimator,
    directory: Arc<StaticDirectory>,
    doctor_id: Uuid,
}

fn fixture() -> Fixture {
    let directory = Arc::new(StaticDirectory::new());
    let doctor_id = Uuid::new_v4();
    directory.add_doctor(Doctor {
        id: doctor_id,
        role: StaffRole::Doctor,
        active: true,
    });

    let clock = Arc::new(FixedClock::new(at(7, 0)));
    let (events, _rx) = EventBus::new();
    let scheduling = Arc::new(AppointmentBookingService::new(
        directory.clone(),
        clock.clone(),
        events.clone(),
        ValidationRules::default(),
    ));
    let queue = Arc::new(QueueCoordinator::new(
        scheduling.clone(),
        directory.clone(),
        clock,
        events,
    ));
    let estimator = WaitTimeEstimator::new(queue.clone(), scheduling.clone(), 30);
    Fixture {
        scheduling,
        queue,
        estimator,
        directory,
        doctor_id,
    }
}

impl Fixture {
    fn add_patient(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.directory.add_patient(Patient { id });
        id
    }

    async fn add_waiting(&self) {
        let patient_id = self.add_patient();
        self.queue
            .add_walk_in(WalkInRequest {
                doctor_id: self.doctor_id,
                patient_id,
                department: None,
            })
            .await
            .unwrap();
    }

    async fn completed_visit(&self, start: DateTime<Utc>, duration_minutes: i64) {
        let patient_id = self.add_patient();
        let appointment = self
            .scheduling
            .book(BookAppointmentRequest {
                patient_id,
                doctor_id: self.doctor_id,
                appointment_date: start,
                duration_minutes: Some(duration_minutes),
            })
            .await
            .unwrap();
        for status in [
            AppointmentStatus::Confirmed,
            AppointmentStatus::InProgress,
            AppointmentStatus::Completed,
        ] {
            self.scheduling
                .update_status(appointment.id, status, None)
                .await
                .unwrap();
        }
    }
}

#[tokio::test]
async fn empty_queue_estimates_zero_wait() {
    let fx = fixture();

    let estimate = fx.estimator.estimate(fx.doctor_id).await;
    assert_eq!(estimate.waiting_count, 0);
    assert_eq!(estimate.estimated_wait_minutes, 0);
}

#[tokio::test]
async fn default_average_applies_without_history() {
    let fx = fixture();
    fx.add_waiting().await;
    fx.add_waiting().await;

    let estimate = fx.estimator.estimate(fx.doctor_id).await;
    assert_eq!(estimate.waiting_count, 2);
    assert_eq!(estimate.avg_consultation_minutes, 30);
    assert_eq!(estimate.estimated_wait_minutes, 60);
}

#[tokio::test]
async fn completed_history_drives_the_average() {
    let fx = fixture();
    fx.completed_visit(at(8, 0), 20).await;
    fx.completed_visit(at(9, 0), 40).await;

    for _ in 0..3 {
        fx.add_waiting().await;
    }

    let estimate = fx.estimator.estimate(fx.doctor_id).await;
    assert_eq!(estimate.waiting_count, 3);
    assert_eq!(estimate.avg_consultation_minutes, 30);
    assert_eq!(estimate.estimated_wait_minutes, 90);
}

#[tokio::test]
async fn called_and_skipped_entries_do_not_count_as_waiting() {
    let fx = fixture();
    fx.add_waiting().await;
    fx.add_waiting().await;
    fx.add_waiting().await;

    let called = fx.queue.call_next(fx.doctor_id, None).await.unwrap();
    assert_eq!(called.queue_number, 1);
    let second = fx.queue.call_next(fx.doctor_id, None).await.unwrap();
    fx.queue
        .skip(second.id, "No response".to_string(), None)
        .await
        .unwrap();

    let estimate = fx.estimator.estimate(fx.doctor_id).await;
    assert_eq!(estimate.waiting_count, 1);
    assert_eq!(estimate.estimated_wait_minutes, 30);
}
