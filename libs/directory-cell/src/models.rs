use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Staff record as published by the hospital directory. The scheduling
/// core only reads identity, role and active flag; everything else about
/// staff lives in the directory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub role: StaffRole,
    pub active: bool,
}

impl Doctor {
    pub fn is_bookable(&self) -> bool {
        self.active && self.role == StaffRole::Doctor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Doctor,
    Nurse,
    FrontDesk,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed directory response: {0}")]
    Malformed(String),
}
