// libs/queue-cell/src/services/wait_time.rs
use std::sync::Arc;

use uuid::Uuid;

use scheduling_cell::AppointmentBookingService;

use crate::models::WaitTimeEstimate;
use crate::services::queue::QueueCoordinator;

/// Front-desk wait estimate: waiting headcount times the doctor's
/// historical average consultation length. No history means the
/// configured default length.
pub struct WaitTimeEstimator {
    queue: Arc<QueueCoordinator>,
    scheduling: Arc<AppointmentBookingService>,
    default_consultation_minutes: i64,
}

impl WaitTimeEstimator {
    pub fn new(
        queue: Arc<QueueCoordinator>,
        scheduling: Arc<AppointmentBookingService>,
        default_consultation_minutes: i64,
    ) -> Self {
        Self {
            queue,
            scheduling,
            default_consultation_minutes,
        }
    }

    pub async fn estimate(&self, doctor_id: Uuid) -> WaitTimeEstimate {
        let waiting_count = self.queue.waiting_count(doctor_id).await;
        let avg_consultation_minutes = self
            .scheduling
            .avg_consultation_minutes(doctor_id)
            .await
            .unwrap_or(self.default_consultation_minutes);

        WaitTimeEstimate {
            doctor_id,
            waiting_count,
            avg_consultation_minutes,
            estimated_wait_minutes: waiting_count as i64 * avg_consultation_minutes,
        }
    }
}
