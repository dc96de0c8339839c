// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use directory_cell::Directory;
use notification_cell::{DomainEvent, EventBus};
use shared_store::{Clock, DoctorLockRegistry};

use crate::models::{
    Appointment, AppointmentSearchQuery, AppointmentStatus, AvailableSlot,
    BookAppointmentRequest, CancelAppointmentRequest, CancellationRecord, SchedulingError,
    ValidationRules,
};
use crate::services::calendar::SlotCalendar;
use crate::services::lifecycle;
use crate::services::repository::AppointmentRepository;

/// Owns the appointment lifecycle: booking, status transitions,
/// reschedule, cancellation and check-in stamping. All same-doctor
/// mutations serialize on the doctor's lock so "check conflict, then
/// insert" is atomic per doctor; different doctors proceed in parallel.
pub struct AppointmentBookingService {
    repo: Arc<AppointmentRepository>,
    calendar: SlotCalendar,
    directory: Arc<dyn Directory>,
    locks: DoctorLockRegistry,
    clock: Arc<dyn Clock>,
    events: EventBus,
    rules: ValidationRules,
}

impl AppointmentBookingService {
    pub fn new(
        directory: Arc<dyn Directory>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        rules: ValidationRules,
    ) -> Self {
        let repo = Arc::new(AppointmentRepository::new());
        let calendar = SlotCalendar::new(Arc::clone(&repo));
        Self {
            repo,
            calendar,
            directory,
            locks: DoctorLockRegistry::new(),
            clock,
            events,
            rules,
        }
    }

    // ==========================================================================
    // BOOKING
    // ==========================================================================

    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking appointment for patient {} with doctor {}",
            request.patient_id, request.doctor_id
        );

        let duration_minutes = request
            .duration_minutes
            .unwrap_or(self.rules.default_duration_minutes);
        self.validate_timing(request.appointment_date, duration_minutes)?;

        self.verify_doctor(request.doctor_id).await?;
        self.verify_patient(request.patient_id).await?;

        // Conflict check and insert are one atomic section per doctor.
        let lock = self.locks.lock_for(request.doctor_id);
        let _held = lock.lock().await;

        if self
            .calendar
            .has_conflict(request.doctor_id, request.appointment_date, duration_minutes, None)
            .await
        {
            warn!(
                "Booking conflict for doctor {} at {}",
                request.doctor_id, request.appointment_date
            );
            return Err(SchedulingError::ConflictDetected);
        }

        let now = self.clock.now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            appointment_date: request.appointment_date,
            duration_minutes,
            status: AppointmentStatus::Scheduled,
            cancellation: None,
            checked_in_at: None,
            actual_start_time: None,
            actual_end_time: None,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(appointment.clone()).await;

        self.events.publish(DomainEvent::AppointmentBooked {
            appointment_id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            start: appointment.appointment_date,
        });

        // The reminder request is on the bus; delivery is fire-and-forget.
        let appointment = self
            .repo
            .update(appointment.id, |a| a.reminder_sent = true)
            .await
            .ok_or(SchedulingError::AppointmentNotFound)?;

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub async fn get(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        self.repo
            .get(id)
            .await
            .ok_or(SchedulingError::AppointmentNotFound)
    }

    pub async fn search(&self, query: AppointmentSearchQuery) -> Vec<Appointment> {
        self.repo.search(&query).await
    }

    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        slot_minutes: Option<i64>,
    ) -> Result<Vec<AvailableSlot>, SchedulingError> {
        let slot_minutes = slot_minutes.unwrap_or(self.rules.slot_minutes);
        // The grid walk advances by the slot width; a zero or negative
        // width would never terminate.
        if slot_minutes < self.rules.min_duration_minutes
            || slot_minutes > self.rules.max_duration_minutes
        {
            return Err(SchedulingError::ValidationError(format!(
                "Slot width must be between {} and {} minutes",
                self.rules.min_duration_minutes, self.rules.max_duration_minutes
            )));
        }

        self.verify_doctor(doctor_id).await?;
        Ok(self
            .calendar
            .generate_slots(
                doctor_id,
                date,
                slot_minutes,
                self.rules.work_start_hour,
                self.rules.work_end_hour,
            )
            .await)
    }

    /// Mean scheduled duration of the doctor's completed consultations.
    /// None when no history exists; the caller picks the fallback.
    pub async fn avg_consultation_minutes(&self, doctor_id: Uuid) -> Option<i64> {
        let durations = self.repo.completed_durations(doctor_id).await;
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<i64>() / durations.len() as i64)
    }

    // ==========================================================================
    // LIFECYCLE TRANSITIONS
    // ==========================================================================

    pub async fn update_status(
        &self,
        id: Uuid,
        target: AppointmentStatus,
        actor_id: Option<Uuid>,
    ) -> Result<Appointment, SchedulingError> {
        if target == AppointmentStatus::Cancelled {
            return Err(SchedulingError::ValidationError(
                "Cancellation requires a cancellation record; use the cancel operation".to_string(),
            ));
        }
        if target == AppointmentStatus::Rescheduled {
            return Err(SchedulingError::ValidationError(
                "Rescheduling requires a new start time; use the reschedule operation".to_string(),
            ));
        }
        self.apply_transition(id, target, actor_id, None).await
    }

    pub async fn cancel(
        &self,
        id: Uuid,
        request: CancelAppointmentRequest,
        actor_id: Option<Uuid>,
    ) -> Result<Appointment, SchedulingError> {
        let record = CancellationRecord {
            cancelled_by: request.cancelled_by,
            cancelled_at: self.clock.now(),
            reason: request.reason,
            notes: request.notes,
        };
        self.apply_transition(id, AppointmentStatus::Cancelled, actor_id, Some(record))
            .await
    }

    pub async fn reschedule(
        &self,
        id: Uuid,
        new_start: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        let current = self.get(id).await?;

        let lock = self.locks.lock_for(current.doctor_id);
        let _held = lock.lock().await;

        // Re-read under the lock; a racing transition may have landed.
        let current = self.get(id).await?;
        if !lifecycle::reschedule_allowed(&current.status) {
            return Err(SchedulingError::InvalidStatusTransition(current.status));
        }
        self.validate_timing(new_start, current.duration_minutes)?;

        // On conflict the appointment is left untouched.
        if self
            .calendar
            .has_conflict(current.doctor_id, new_start, current.duration_minutes, Some(id))
            .await
        {
            warn!(
                "Reschedule conflict for appointment {} at {}",
                id, new_start
            );
            return Err(SchedulingError::ConflictDetected);
        }

        let now = self.clock.now();
        let updated = self
            .repo
            .update(id, |a| {
                a.appointment_date = new_start;
                a.status = AppointmentStatus::Rescheduled;
                a.updated_at = now;
            })
            .await
            .ok_or(SchedulingError::AppointmentNotFound)?;

        self.events.publish(DomainEvent::AppointmentRescheduled {
            appointment_id: id,
            doctor_id: updated.doctor_id,
            new_start,
        });

        info!("Appointment {} rescheduled to {}", id, new_start);
        Ok(updated)
    }

    /// Stamp the day-of-service arrival. Queue entry creation is the
    /// queue coordinator's side of check-in.
    pub async fn mark_checked_in(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        let current = self.get(id).await?;

        let lock = self.locks.lock_for(current.doctor_id);
        let _held = lock.lock().await;

        let current = self.get(id).await?;
        if !lifecycle::check_in_allowed(&current.status) {
            return Err(SchedulingError::InvalidStatusTransition(current.status));
        }
        if current.checked_in_at.is_some() {
            return Err(SchedulingError::AlreadyCheckedIn);
        }

        let now = self.clock.now();
        self.repo
            .update(id, |a| {
                a.checked_in_at = Some(now);
                a.updated_at = now;
            })
            .await
            .ok_or(SchedulingError::AppointmentNotFound)
    }

    /// Mirror path for the queue's call-next: a checked-in but
    /// unconfirmed appointment is confirmed first, then started, so both
    /// steps stay inside the transition table.
    pub async fn mark_in_progress(
        &self,
        id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<Appointment, SchedulingError> {
        let current = self.get(id).await?;
        if matches!(
            current.status,
            AppointmentStatus::Scheduled | AppointmentStatus::Rescheduled
        ) {
            self.apply_transition(id, AppointmentStatus::Confirmed, actor_id, None)
                .await?;
        }
        self.apply_transition(id, AppointmentStatus::InProgress, actor_id, None)
            .await
    }

    pub async fn mark_completed(
        &self,
        id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<Appointment, SchedulingError> {
        self.apply_transition(id, AppointmentStatus::Completed, actor_id, None)
            .await
    }

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    async fn apply_transition(
        &self,
        id: Uuid,
        target: AppointmentStatus,
        actor_id: Option<Uuid>,
        cancellation: Option<CancellationRecord>,
    ) -> Result<Appointment, SchedulingError> {
        let current = self.get(id).await?;

        let lock = self.locks.lock_for(current.doctor_id);
        let _held = lock.lock().await;

        let current = self.get(id).await?;
        lifecycle::validate_transition(&current.status, &target)?;

        let now = self.clock.now();
        let updated = self
            .repo
            .update(id, |a| {
                a.status = target;
                a.updated_at = now;
                match target {
                    AppointmentStatus::InProgress => a.actual_start_time = Some(now),
                    AppointmentStatus::Completed => a.actual_end_time = Some(now),
                    AppointmentStatus::Cancelled => a.cancellation = cancellation,
                    _ => {}
                }
            })
            .await
            .ok_or(SchedulingError::AppointmentNotFound)?;

        self.events.publish(DomainEvent::AppointmentStatusChanged {
            appointment_id: id,
            doctor_id: updated.doctor_id,
            from: current.status.to_string(),
            to: target.to_string(),
            actor_id,
        });

        debug!("Appointment {} moved {} -> {}", id, current.status, target);
        Ok(updated)
    }

    fn validate_timing(
        &self,
        start: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Result<(), SchedulingError> {
        if duration_minutes < self.rules.min_duration_minutes
            || duration_minutes > self.rules.max_duration_minutes
        {
            return Err(SchedulingError::ValidationError(format!(
                "Duration must be between {} and {} minutes",
                self.rules.min_duration_minutes, self.rules.max_duration_minutes
            )));
        }
        if start <= self.clock.now() {
            return Err(SchedulingError::InvalidTime(
                "Appointment must be scheduled for a future time".to_string(),
            ));
        }
        Ok(())
    }

    async fn verify_doctor(&self, doctor_id: Uuid) -> Result<(), SchedulingError> {
        let doctor = self
            .directory
            .get_doctor(doctor_id)
            .await
            .map_err(|e| SchedulingError::DirectoryError(e.to_string()))?
            .ok_or(SchedulingError::DoctorNotFound)?;
        if !doctor.is_bookable() {
            return Err(SchedulingError::DoctorNotBookable);
        }
        Ok(())
    }

    async fn verify_patient(&self, patient_id: Uuid) -> Result<(), SchedulingError> {
        self.directory
            .get_patient(patient_id)
            .await
            .map_err(|e| SchedulingError::DirectoryError(e.to_string()))?
            .ok_or(SchedulingError::PatientNotFound)?;
        Ok(())
    }
}
