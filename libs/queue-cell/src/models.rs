// libs/queue-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// CORE QUEUE MODELS
// ==============================================================================

/// One patient's position in a doctor's day queue. Created at check-in
/// (appointment-backed) or walk-in registration, and never deleted - the
/// full day's queue is the audit trail of who was served when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub department: Option<String>,
    pub queue_number: u32,
    pub entry_type: QueueEntryType,
    pub status: QueueStatus,
    pub queue_date: NaiveDate,
    pub queued_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    pub called_by: Option<Uuid>,
    pub skipped_at: Option<DateTime<Utc>>,
    pub skipped_by: Option<Uuid>,
    pub skip_reason: Option<String>,
    pub last_recalled_at: Option<DateTime<Utc>>,
    pub last_recalled_by: Option<Uuid>,
    pub recall_count: u32,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    InConsultation,
    Skipped,
    Completed,
}

impl QueueStatus {
    /// Entries still unserved and eligible for call-next. Skipped stays
    /// recallable but is no longer servable in order.
    pub fn is_waiting(&self) -> bool {
        matches!(self, QueueStatus::Waiting)
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::InConsultation => "in_consultation",
            QueueStatus::Skipped => "skipped",
            QueueStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueEntryType {
    Appointment,
    WalkIn,
}

impl std::fmt::Display for QueueEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueueEntryType::Appointment => "appointment",
            QueueEntryType::WalkIn => "walk_in",
        };
        write!(f, "{}", s)
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkInRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallNextRequest {
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkipRequest {
    pub reason: String,
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecallRequest {
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteRequest {
    pub actor_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueQuery {
    pub doctor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub status: Option<QueueStatus>,
    pub department: Option<String>,
}

/// Front-desk board view of one entry: the ticket plus how many people
/// are still waiting ahead of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuePosition {
    pub entry: QueueEntry,
    pub ahead: usize,
}

/// Coarse front-desk estimate: people ahead times the doctor's average
/// completed consultation length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitTimeEstimate {
    pub doctor_id: Uuid,
    pub waiting_count: usize,
    pub avg_consultation_minutes: i64,
    pub estimated_wait_minutes: i64,
}
