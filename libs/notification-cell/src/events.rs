use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Internal events emitted by the scheduling and queue cells after a
/// successful state change. Notification and audit delivery hang off
/// these events so their latency and failures never touch the core's
/// transactional path. Statuses travel as plain strings to keep this
/// cell free of the domain enums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    AppointmentBooked {
        appointment_id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        start: DateTime<Utc>,
    },
    AppointmentStatusChanged {
        appointment_id: Uuid,
        doctor_id: Uuid,
        from: String,
        to: String,
        actor_id: Option<Uuid>,
    },
    AppointmentRescheduled {
        appointment_id: Uuid,
        doctor_id: Uuid,
        new_start: DateTime<Utc>,
    },
    QueueEntryAdded {
        queue_id: Uuid,
        doctor_id: Uuid,
        queue_number: u32,
        entry_type: String,
    },
    QueueEntryCalled {
        queue_id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
        queue_number: u32,
    },
    QueueEntryStatusChanged {
        queue_id: Uuid,
        doctor_id: Uuid,
        from: String,
        to: String,
        actor_id: Option<Uuid>,
    },
}

/// One write-once audit line per state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: String,
    pub actor_id: Option<Uuid>,
    pub entity_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

impl DomainEvent {
    pub fn audit_record(&self, timestamp: DateTime<Utc>) -> AuditRecord {
        match self {
            DomainEvent::AppointmentBooked {
                appointment_id,
                patient_id,
                doctor_id,
                start,
            } => AuditRecord {
                action: "appointment.booked".to_string(),
                actor_id: Some(*patient_id),
                entity_id: *appointment_id,
                timestamp,
                metadata: json!({ "doctor_id": doctor_id, "start": start }),
            },
            DomainEvent::AppointmentStatusChanged {
                appointment_id,
                doctor_id,
                from,
                to,
                actor_id,
            } => AuditRecord {
                action: format!("appointment.{}", to),
                actor_id: *actor_id,
                entity_id: *appointment_id,
                timestamp,
                metadata: json!({ "doctor_id": doctor_id, "from": from, "to": to }),
            },
            DomainEvent::AppointmentRescheduled {
                appointment_id,
                doctor_id,
                new_start,
            } => AuditRecord {
                action: "appointment.rescheduled".to_string(),
                actor_id: None,
                entity_id: *appointment_id,
                timestamp,
                metadata: json!({ "doctor_id": doctor_id, "new_start": new_start }),
            },
            DomainEvent::QueueEntryAdded {
                queue_id,
                doctor_id,
                queue_number,
                entry_type,
            } => AuditRecord {
                action: "queue.added".to_string(),
                actor_id: None,
                entity_id: *queue_id,
                timestamp,
                metadata: json!({
                    "doctor_id": doctor_id,
                    "queue_number": queue_number,
                    "entry_type": entry_type
                }),
            },
            DomainEvent::QueueEntryCalled {
                queue_id,
                doctor_id,
                patient_id,
                queue_number,
            } => AuditRecord {
                action: "queue.called".to_string(),
                actor_id: None,
                entity_id: *queue_id,
                timestamp,
                metadata: json!({
                    "doctor_id": doctor_id,
                    "patient_id": patient_id,
                    "queue_number": queue_number
                }),
            },
            DomainEvent::QueueEntryStatusChanged {
                queue_id,
                doctor_id,
                from,
                to,
                actor_id,
            } => AuditRecord {
                action: format!("queue.{}", to),
                actor_id: *actor_id,
                entity_id: *queue_id,
                timestamp,
                metadata: json!({ "doctor_id": doctor_id, "from": from, "to": to }),
            },
        }
    }
}
