use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{Doctor, DirectoryError, Patient};

/// Read-only view onto the hospital staff/patient directory. The core
/// never stores identities, it only asks "does this doctor exist and are
/// they active" and "does this patient exist".
#[async_trait]
pub trait Directory: Send + Sync {
    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>, DirectoryError>;
    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>, DirectoryError>;
}

pub struct HttpDirectory {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.directory_base_url.clone(),
            api_key: config.directory_api_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !self.api_key.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&self.api_key) {
                headers.insert("apikey", value);
            }
        }
        headers
    }

    async fn fetch<T>(&self, path: &str) -> Result<Option<T>, DirectoryError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Directory lookup {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.get_headers())
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Directory error ({}): {}", status, error_text);
            return Err(DirectoryError::Unavailable(format!(
                "directory returned {}: {}",
                status, error_text
            )));
        }

        let record = response
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::Malformed(e.to_string()))?;
        Ok(Some(record))
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>, DirectoryError> {
        self.fetch(&format!("/directory/v1/doctors/{}", id)).await
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>, DirectoryError> {
        self.fetch(&format!("/directory/v1/patients/{}", id)).await
    }
}

/// In-process directory used by tests and by deployments without a
/// configured directory endpoint.
#[derive(Default)]
pub struct StaticDirectory {
    doctors: Mutex<HashMap<Uuid, Doctor>>,
    patients: Mutex<HashMap<Uuid, Patient>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_doctor(&self, doctor: Doctor) {
        self.doctors.lock().unwrap().insert(doctor.id, doctor);
    }

    pub fn add_patient(&self, patient: Patient) {
        self.patients.lock().unwrap().insert(patient.id, patient);
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>, DirectoryError> {
        Ok(self.doctors.lock().unwrap().get(&id).cloned())
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>, DirectoryError> {
        Ok(self.patients.lock().unwrap().get(&id).cloned())
    }
}
