// libs/queue-cell/src/services/queue.rs
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use directory_cell::Directory;
use notification_cell::{DomainEvent, EventBus};
use scheduling_cell::{AppointmentBookingService, AppointmentStatus};
use shared_store::{Clock, DoctorLockRegistry, TicketCounters};

use crate::error::QueueError;
use crate::models::{
    QueueEntry, QueueEntryType, QueuePosition, QueueQuery, QueueStatus, WalkInRequest,
};

/// Runs the per-doctor day queues: check-in and walk-in intake, the
/// call-next claim, skip/recall/complete, and the mirror back onto
/// appointment statuses. Each doctor's queue mutations serialize on that
/// doctor's lock; ticket numbers come from the shared atomic counters so
/// numbering stays dense even across concurrent arrivals.
///
/// Lock order is queue lock first, then any scheduling call; the
/// scheduling service never calls back into the queue.
pub struct QueueCoordinator {
    entries: RwLock<HashMap<Uuid, QueueEntry>>,
    tickets: TicketCounters,
    locks: DoctorLockRegistry,
    scheduling: Arc<AppointmentBookingService>,
    directory: Arc<dyn Directory>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl QueueCoordinator {
    pub fn new(
        scheduling: Arc<AppointmentBookingService>,
        directory: Arc<dyn Directory>,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            tickets: TicketCounters::new(),
            locks: DoctorLockRegistry::new(),
            scheduling,
            directory,
            clock,
            events,
        }
    }

    // ==========================================================================
    // INTAKE
    // ==========================================================================

    /// Day-of-service arrival for a booked appointment: stamp the
    /// appointment's check-in, then issue a ticket and join the doctor's
    /// queue. The check-in stamp guards against double entry - a second
    /// call fails before any queue state is touched.
    pub async fn check_in(&self, appointment_id: Uuid) -> Result<QueueEntry, QueueError> {
        let appointment = self.scheduling.mark_checked_in(appointment_id).await?;

        let lock = self.locks.lock_for(appointment.doctor_id);
        let _held = lock.lock().await;

        if self
            .entry_exists_for_appointment(appointment.id)
            .await
        {
            return Err(QueueError::DuplicateEntry);
        }

        let entry = self
            .insert_entry(
                appointment.doctor_id,
                appointment.patient_id,
                Some(appointment.id),
                None,
                QueueEntryType::Appointment,
            )
            .await;
        info!(
            "Appointment {} checked in as ticket {} for doctor {}",
            appointment.id, entry.queue_number, entry.doctor_id
        );
        Ok(entry)
    }

    /// Walk-in with no appointment. The doctor and patient still have to
    /// exist in the directory.
    pub async fn add_walk_in(&self, request: WalkInRequest) -> Result<QueueEntry, QueueError> {
        let doctor = self
            .directory
            .get_doctor(request.doctor_id)
            .await
            .map_err(|e| QueueError::DirectoryError(e.to_string()))?
            .ok_or(QueueError::DoctorNotFound)?;
        if !doctor.is_bookable() {
            return Err(QueueError::DoctorNotBookable);
        }
        self.directory
            .get_patient(request.patient_id)
            .await
            .map_err(|e| QueueError::DirectoryError(e.to_string()))?
            .ok_or(QueueError::PatientNotFound)?;

        let lock = self.locks.lock_for(request.doctor_id);
        let _held = lock.lock().await;

        if self
            .unserved_entry_exists(request.doctor_id, request.patient_id)
            .await
        {
            return Err(QueueError::DuplicateEntry);
        }

        let entry = self
            .insert_entry(
                request.doctor_id,
                request.patient_id,
                None,
                request.department,
                QueueEntryType::WalkIn,
            )
            .await;
        info!(
            "Walk-in ticket {} issued for doctor {}",
            entry.queue_number, entry.doctor_id
        );
        Ok(entry)
    }

    // ==========================================================================
    // QUEUE PROGRESSION
    // ==========================================================================

    /// Claim the next waiting patient for the doctor's current day:
    /// lowest ticket number, earliest arrival on a tie. The claim and the
    /// status flip happen under the doctor's lock, so two stations
    /// calling at once get different patients.
    pub async fn call_next(
        &self,
        doctor_id: Uuid,
        called_by: Option<Uuid>,
    ) -> Result<QueueEntry, QueueError> {
        let lock = self.locks.lock_for(doctor_id);
        let _held = lock.lock().await;

        let today = self.clock.today();
        let next = {
            let entries = self.entries.read().await;
            entries
                .values()
                .filter(|e| {
                    e.doctor_id == doctor_id && e.queue_date == today && e.status.is_waiting()
                })
                .min_by_key(|e| (e.queue_number, e.queued_at))
                .cloned()
        };
        let next = next.ok_or(QueueError::QueueEmpty)?;

        let now = self.clock.now();
        let called = self
            .update_entry(next.id, |e| {
                e.status = QueueStatus::InConsultation;
                e.called_at = Some(now);
                e.called_by = called_by;
            })
            .await?;

        self.events.publish(DomainEvent::QueueEntryCalled {
            queue_id: called.id,
            doctor_id,
            patient_id: called.patient_id,
            queue_number: called.queue_number,
        });

        self.mirror_in_progress(&called).await;

        info!(
            "Ticket {} called for doctor {}",
            called.queue_number, doctor_id
        );
        Ok(called)
    }

    /// Set aside a patient who did not respond to the call. Waiting and
    /// in-consultation entries can be skipped; a skipped entry keeps its
    /// ticket number for recall.
    pub async fn skip(
        &self,
        queue_id: Uuid,
        reason: String,
        skipped_by: Option<Uuid>,
    ) -> Result<QueueEntry, QueueError> {
        let entry = self.get(queue_id).await?;

        let lock = self.locks.lock_for(entry.doctor_id);
        let _held = lock.lock().await;

        let entry = self.get(queue_id).await?;
        if !matches!(
            entry.status,
            QueueStatus::Waiting | QueueStatus::InConsultation
        ) {
            return Err(QueueError::InvalidState(entry.status));
        }

        let now = self.clock.now();
        let skipped = self
            .update_entry(queue_id, |e| {
                e.status = QueueStatus::Skipped;
                e.skipped_at = Some(now);
                e.skipped_by = skipped_by;
                e.skip_reason = Some(reason);
            })
            .await?;

        self.publish_status_change(&entry, &skipped, skipped_by);
        Ok(skipped)
    }

    /// Bring a skipped patient straight back into consultation. The
    /// original ticket number is kept; recalls are counted, not limited.
    pub async fn recall(
        &self,
        queue_id: Uuid,
        recalled_by: Option<Uuid>,
    ) -> Result<QueueEntry, QueueError> {
        let entry = self.get(queue_id).await?;

        let lock = self.locks.lock_for(entry.doctor_id);
        let _held = lock.lock().await;

        let entry = self.get(queue_id).await?;
        if entry.status != QueueStatus::Skipped {
            return Err(QueueError::InvalidState(entry.status));
        }

        let now = self.clock.now();
        let recalled = self
            .update_entry(queue_id, |e| {
                e.status = QueueStatus::InConsultation;
                e.recall_count += 1;
                e.last_recalled_at = Some(now);
                e.last_recalled_by = recalled_by;
            })
            .await?;

        self.publish_status_change(&entry, &recalled, recalled_by);
        self.mirror_in_progress(&recalled).await;

        info!(
            "Ticket {} recalled for doctor {} (recall #{})",
            recalled.queue_number, recalled.doctor_id, recalled.recall_count
        );
        Ok(recalled)
    }

    /// Close out a consultation and mirror completion onto the
    /// appointment when one backs the entry.
    pub async fn complete(
        &self,
        queue_id: Uuid,
        completed_by: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<QueueEntry, QueueError> {
        let entry = self.get(queue_id).await?;

        let lock = self.locks.lock_for(entry.doctor_id);
        let _held = lock.lock().await;

        let entry = self.get(queue_id).await?;
        if entry.status != QueueStatus::InConsultation {
            return Err(QueueError::InvalidState(entry.status));
        }

        let now = self.clock.now();
        let completed = self
            .update_entry(queue_id, |e| {
                e.status = QueueStatus::Completed;
                e.completed_at = Some(now);
                e.completed_by = completed_by;
                e.notes = notes;
            })
            .await?;

        self.publish_status_change(&entry, &completed, completed_by);

        if let Some(appointment_id) = completed.appointment_id {
            if let Err(e) = self
                .scheduling
                .mark_completed(appointment_id, completed_by)
                .await
            {
                warn!(
                    "Queue entry {} completed but appointment {} mirror failed: {}",
                    completed.id, appointment_id, e
                );
            }
        }

        info!(
            "Ticket {} completed for doctor {}",
            completed.queue_number, completed.doctor_id
        );
        Ok(completed)
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub async fn get(&self, queue_id: Uuid) -> Result<QueueEntry, QueueError> {
        self.entries
            .read()
            .await
            .get(&queue_id)
            .cloned()
            .ok_or(QueueError::EntryNotFound)
    }

    pub async fn get_queue(&self, query: &QueueQuery) -> Vec<QueueEntry> {
        let entries = self.entries.read().await;
        let mut matches: Vec<QueueEntry> = entries
            .values()
            .filter(|e| query.doctor_id.map_or(true, |id| e.doctor_id == id))
            .filter(|e| query.date.map_or(true, |d| e.queue_date == d))
            .filter(|e| query.status.map_or(true, |s| e.status == s))
            .filter(|e| {
                query
                    .department
                    .as_deref()
                    .map_or(true, |d| e.department.as_deref() == Some(d))
            })
            .cloned()
            .collect();
        matches.sort_by_key(|e| (e.doctor_id, e.queue_number, e.queued_at));
        matches
    }

    /// One ticket plus the number of still-waiting entries ahead of it
    /// in its doctor's day queue.
    pub async fn position(&self, queue_id: Uuid) -> Result<QueuePosition, QueueError> {
        let entry = self.get(queue_id).await?;
        let ahead = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| {
                e.doctor_id == entry.doctor_id
                    && e.queue_date == entry.queue_date
                    && e.status.is_waiting()
                    && (e.queue_number, e.queued_at) < (entry.queue_number, entry.queued_at)
            })
            .count();
        Ok(QueuePosition { entry, ahead })
    }

    /// Headcount ahead of a hypothetical new arrival for the doctor today.
    pub async fn waiting_count(&self, doctor_id: Uuid) -> usize {
        let today = self.clock.today();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.doctor_id == doctor_id && e.queue_date == today && e.status.is_waiting())
            .count()
    }

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    async fn entry_exists_for_appointment(&self, appointment_id: Uuid) -> bool {
        self.entries
            .read()
            .await
            .values()
            .any(|e| e.appointment_id == Some(appointment_id))
    }

    async fn unserved_entry_exists(&self, doctor_id: Uuid, patient_id: Uuid) -> bool {
        let today = self.clock.today();
        self.entries.read().await.values().any(|e| {
            e.doctor_id == doctor_id
                && e.patient_id == patient_id
                && e.queue_date == today
                && e.status != QueueStatus::Completed
        })
    }

    /// Caller must hold the doctor's lock.
    async fn insert_entry(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        appointment_id: Option<Uuid>,
        department: Option<String>,
        entry_type: QueueEntryType,
    ) -> QueueEntry {
        let now = self.clock.now();
        let today = self.clock.today();
        let entry = QueueEntry {
            id: Uuid::new_v4(),
            doctor_id,
            patient_id,
            appointment_id,
            department,
            queue_number: self.tickets.next(doctor_id, today),
            entry_type,
            status: QueueStatus::Waiting,
            queue_date: today,
            queued_at: now,
            called_at: None,
            called_by: None,
            skipped_at: None,
            skipped_by: None,
            skip_reason: None,
            last_recalled_at: None,
            last_recalled_by: None,
            recall_count: 0,
            completed_at: None,
            completed_by: None,
            notes: None,
        };
        self.entries.write().await.insert(entry.id, entry.clone());

        self.events.publish(DomainEvent::QueueEntryAdded {
            queue_id: entry.id,
            doctor_id,
            queue_number: entry.queue_number,
            entry_type: entry.entry_type.to_string(),
        });
        entry
    }

    async fn update_entry<F>(&self, queue_id: Uuid, mutate: F) -> Result<QueueEntry, QueueError>
    where
        F: FnOnce(&mut QueueEntry),
    {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&queue_id).ok_or(QueueError::EntryNotFound)?;
        mutate(entry);
        Ok(entry.clone())
    }

    fn publish_status_change(&self, before: &QueueEntry, after: &QueueEntry, actor: Option<Uuid>) {
        self.events.publish(DomainEvent::QueueEntryStatusChanged {
            queue_id: after.id,
            doctor_id: after.doctor_id,
            from: before.status.to_string(),
            to: after.status.to_string(),
            actor_id: actor,
        });
    }

    /// Mirror "being attended" onto the backing appointment. The queue
    /// claim stands even if the mirror fails; the discrepancy is
    /// surfaced in the logs.
    async fn mirror_in_progress(&self, entry: &QueueEntry) {
        let Some(appointment_id) = entry.appointment_id else {
            return;
        };
        let already_started = matches!(
            self.scheduling.get(appointment_id).await,
            Ok(a) if a.status == AppointmentStatus::InProgress
        );
        if already_started {
            return;
        }
        if let Err(e) = self
            .scheduling
            .mark_in_progress(appointment_id, entry.called_by)
            .await
        {
            warn!(
                "Queue entry {} claimed but appointment {} mirror failed: {}",
                entry.id, appointment_id, e
            );
        }
    }
}
