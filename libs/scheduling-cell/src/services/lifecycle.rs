// libs/scheduling-cell/src/services/lifecycle.rs
//
// The appointment state machine lives here and nowhere else: every
// mutator consults this table, so an illegal transition is refused in
// one place.
use tracing::{debug, warn};

use crate::models::{AppointmentStatus, SchedulingError};

/// Legal next statuses for a given current status. Completed and
/// Cancelled are terminal. Rescheduled behaves like Scheduled - the
/// appointment is still active, only its time changed.
pub fn allowed_next(current: &AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        AppointmentStatus::Scheduled => {
            &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
        }
        AppointmentStatus::Confirmed => {
            &[AppointmentStatus::InProgress, AppointmentStatus::Cancelled]
        }
        AppointmentStatus::InProgress => {
            &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
        }
        AppointmentStatus::Rescheduled => {
            &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
        }
        AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
    }
}

pub fn validate_transition(
    current: &AppointmentStatus,
    target: &AppointmentStatus,
) -> Result<(), SchedulingError> {
    debug!("Validating status transition {} -> {}", current, target);

    if !allowed_next(current).contains(target) {
        warn!("Invalid status transition attempted: {} -> {}", current, target);
        return Err(SchedulingError::InvalidStatusTransition(*current));
    }
    Ok(())
}

/// Reschedule is only legal while the appointment is still pending
/// service; Rescheduled is included since it behaves like Scheduled.
pub fn reschedule_allowed(current: &AppointmentStatus) -> bool {
    matches!(
        current,
        AppointmentStatus::Scheduled
            | AppointmentStatus::Confirmed
            | AppointmentStatus::Rescheduled
    )
}

/// Check-in converts a pending appointment into a queue entry on the
/// day of service.
pub fn check_in_allowed(current: &AppointmentStatus) -> bool {
    matches!(
        current,
        AppointmentStatus::Scheduled
            | AppointmentStatus::Confirmed
            | AppointmentStatus::Rescheduled
    )
}
