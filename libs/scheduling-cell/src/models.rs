// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub cancellation: Option<CancellationRecord>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Scheduled end of the booked window, exclusive.
    pub fn scheduled_end_time(&self) -> DateTime<Utc> {
        self.appointment_date + chrono::Duration::minutes(self.duration_minutes)
    }

    /// Active appointments hold their time window against new bookings.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    /// Statuses that occupy the doctor's calendar for conflict purposes.
    /// Rescheduled is an active marker, not a terminal state.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled
                | AppointmentStatus::Confirmed
                | AppointmentStatus::InProgress
                | AppointmentStatus::Rescheduled
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub cancelled_by: CancelActor,
    pub cancelled_at: DateTime<Utc>,
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancelActor {
    Patient,
    Doctor,
    Staff,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub cancelled_by: CancelActor,
    pub actor_id: Option<Uuid>,
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub slot_minutes: Option<i64>,
}

/// One fixed-width candidate window within the working day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

// ==============================================================================
// VALIDATION RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub default_duration_minutes: i64,
    pub min_duration_minutes: i64,
    pub max_duration_minutes: i64,
    pub slot_minutes: i64,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            default_duration_minutes: 30,
            min_duration_minutes: 5,
            max_duration_minutes: 240,
            slot_minutes: 30,
            work_start_hour: 8,
            work_end_hour: 17,
        }
    }
}

impl ValidationRules {
    /// Builds rules from the environment-backed config, falling back to the
    /// defaults for values the slot calendar cannot work with: hours must be
    /// an ascending pair within 0..=23, and the slot width must be positive.
    pub fn from_config(config: &AppConfig) -> Self {
        let defaults = Self::default();

        let (work_start_hour, work_end_hour) =
            if config.work_start_hour < config.work_end_hour && config.work_end_hour <= 23 {
                (config.work_start_hour, config.work_end_hour)
            } else {
                tracing::warn!(
                    work_start_hour = config.work_start_hour,
                    work_end_hour = config.work_end_hour,
                    "Invalid working hours in config, using defaults"
                );
                (defaults.work_start_hour, defaults.work_end_hour)
            };

        let slot_minutes = if config.slot_minutes > 0 {
            config.slot_minutes
        } else {
            tracing::warn!(
                slot_minutes = config.slot_minutes,
                "Invalid slot width in config, using default"
            );
            defaults.slot_minutes
        };

        Self {
            default_duration_minutes: config.default_consultation_minutes,
            slot_minutes,
            work_start_hour,
            work_end_hour,
            ..defaults
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor is not an active doctor")]
    DoctorNotBookable,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment conflicts with existing booking")]
    ConflictDetected,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Appointment already checked in")]
    AlreadyCheckedIn,

    #[error("Directory error: {0}")]
    DirectoryError(String),
}

impl From<SchedulingError> for AppError {
    fn from(e: SchedulingError) -> Self {
        match e {
            SchedulingError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            SchedulingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            SchedulingError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
            SchedulingError::DoctorNotBookable => {
                AppError::ValidationError("Doctor is not an active doctor".to_string())
            }
            SchedulingError::InvalidTime(msg) => AppError::BadRequest(msg),
            SchedulingError::ValidationError(msg) => AppError::ValidationError(msg),
            SchedulingError::ConflictDetected => {
                AppError::Conflict("Appointment slot conflicts with existing booking".to_string())
            }
            SchedulingError::InvalidStatusTransition(status) => AppError::Conflict(format!(
                "Cannot transition appointment from current status: {}",
                status
            )),
            SchedulingError::AlreadyCheckedIn => {
                AppError::Conflict("Appointment already checked in".to_string())
            }
            SchedulingError::DirectoryError(msg) => AppError::ExternalService(msg),
        }
    }
}
