use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentSearchQuery, AppointmentStatus};

/// In-memory appointment store. Appointments are never deleted, only
/// moved to a terminal status; the map is the durable record for the
/// process lifetime. All mutation goes through the booking service,
/// which holds the per-doctor lock around its check-then-write sections.
#[derive(Default)]
pub struct AppointmentRepository {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl AppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, appointment: Appointment) {
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment);
    }

    pub async fn get(&self, id: Uuid) -> Option<Appointment> {
        self.appointments.read().await.get(&id).cloned()
    }

    /// Apply a closure to the stored appointment and return the updated
    /// copy. Returns None when the id is unknown.
    pub async fn update<F>(&self, id: Uuid, mutate: F) -> Option<Appointment>
    where
        F: FnOnce(&mut Appointment),
    {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments.get_mut(&id)?;
        mutate(appointment);
        Some(appointment.clone())
    }

    /// Appointments currently holding a window on the doctor's calendar.
    pub async fn active_for_doctor(&self, doctor_id: Uuid) -> Vec<Appointment> {
        self.appointments
            .read()
            .await
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.is_active())
            .cloned()
            .collect()
    }

    pub async fn search(&self, query: &AppointmentSearchQuery) -> Vec<Appointment> {
        let appointments = self.appointments.read().await;
        let mut matches: Vec<Appointment> = appointments
            .values()
            .filter(|a| query.patient_id.map_or(true, |id| a.patient_id == id))
            .filter(|a| query.doctor_id.map_or(true, |id| a.doctor_id == id))
            .filter(|a| query.status.map_or(true, |s| a.status == s))
            .filter(|a| query.from_date.map_or(true, |d| a.appointment_date >= d))
            .filter(|a| query.to_date.map_or(true, |d| a.appointment_date <= d))
            .cloned()
            .collect();
        matches.sort_by_key(|a| a.appointment_date);

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        matches.into_iter().skip(offset).take(limit).collect()
    }

    /// Scheduled durations of the doctor's completed consultations, the
    /// input to the wait-time average.
    pub async fn completed_durations(&self, doctor_id: Uuid) -> Vec<i64> {
        self.appointments
            .read()
            .await
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.status == AppointmentStatus::Completed)
            .map(|a| a.duration_minutes)
            .collect()
    }
}
