use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::AvailableSlot;
use crate::services::repository::AppointmentRepository;

/// Pure queries over the doctor's calendar: overlap detection for a
/// candidate window and deterministic slot enumeration for a working
/// day. Callers that mutate (booking, reschedule) must hold the doctor's
/// lock around the conflict check and the write.
pub struct SlotCalendar {
    repo: Arc<AppointmentRepository>,
}

impl SlotCalendar {
    pub fn new(repo: Arc<AppointmentRepository>) -> Self {
        Self { repo }
    }

    /// True when any active appointment for the doctor overlaps
    /// `[start, start + duration)`. `exclude_appointment_id` lets a
    /// reschedule ignore the appointment being moved.
    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: i64,
        exclude_appointment_id: Option<Uuid>,
    ) -> bool {
        let end = start + Duration::minutes(duration_minutes);
        let active = self.repo.active_for_doctor(doctor_id).await;

        let conflict = active.iter().any(|appointment| {
            if Some(appointment.id) == exclude_appointment_id {
                return false;
            }
            windows_overlap(
                start,
                end,
                appointment.appointment_date,
                appointment.scheduled_end_time(),
            )
        });

        if conflict {
            debug!(
                "Conflict detected for doctor {} in window {} - {}",
                doctor_id, start, end
            );
        }
        conflict
    }

    /// Enumerate fixed-width slots across the working day and mark each
    /// one unavailable if it overlaps an active appointment. Pure
    /// function of current appointment state.
    pub async fn generate_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        slot_minutes: i64,
        work_start_hour: u32,
        work_end_hour: u32,
    ) -> Vec<AvailableSlot> {
        let day_start = date
            .and_hms_opt(work_start_hour, 0, 0)
            .expect("valid work start hour")
            .and_utc();
        let day_end = date
            .and_hms_opt(work_end_hour, 0, 0)
            .expect("valid work end hour")
            .and_utc();

        let active = self.repo.active_for_doctor(doctor_id).await;
        let width = Duration::minutes(slot_minutes);

        let mut slots = Vec::new();
        let mut slot_start = day_start;
        while slot_start + width <= day_end {
            let slot_end = slot_start + width;
            let available = !active.iter().any(|appointment| {
                windows_overlap(
                    slot_start,
                    slot_end,
                    appointment.appointment_date,
                    appointment.scheduled_end_time(),
                )
            });
            slots.push(AvailableSlot {
                start: slot_start,
                end: slot_end,
                available,
            });
            slot_start = slot_end;
        }
        slots
    }
}

/// Half-open interval test: `[a0, a1)` and `[b0, b1)` overlap iff
/// `a0 < b1 && b0 < a1`. Back-to-back windows do not overlap.
pub fn windows_overlap(
    a0: DateTime<Utc>,
    a1: DateTime<Utc>,
    b0: DateTime<Utc>,
    b1: DateTime<Utc>,
) -> bool {
    a0 < b1 && b0 < a1
}
