// libs/queue-cell/src/error.rs
use thiserror::Error;

use scheduling_cell::SchedulingError;
use shared_models::error::AppError;

use crate::models::QueueStatus;

#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error("Queue entry not found")]
    EntryNotFound,

    #[error("No patients waiting in this queue")]
    QueueEmpty,

    #[error("Patient is already in this queue")]
    DuplicateEntry,

    #[error("Queue entry cannot be modified in current status: {0}")]
    InvalidState(QueueStatus),

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor is not an active doctor")]
    DoctorNotBookable,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Directory error: {0}")]
    DirectoryError(String),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

impl From<QueueError> for AppError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::EntryNotFound => AppError::NotFound("Queue entry not found".to_string()),
            QueueError::QueueEmpty => {
                AppError::NotFound("No patients waiting in this queue".to_string())
            }
            QueueError::DuplicateEntry => {
                AppError::Conflict("Patient is already in this queue".to_string())
            }
            QueueError::InvalidState(status) => AppError::Conflict(format!(
                "Queue entry cannot be modified in current status: {}",
                status
            )),
            QueueError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            QueueError::DoctorNotBookable => {
                AppError::ValidationError("Doctor is not an active doctor".to_string())
            }
            QueueError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
            QueueError::DirectoryError(msg) => AppError::ExternalService(msg),
            QueueError::Scheduling(inner) => AppError::from(inner),
        }
    }
}
