use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;

use crate::events::AuditRecord;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Outbound notification collaborator. Failures are the dispatcher's
/// problem (logged and dropped), never the core's.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reminder(&self, appointment_id: Uuid) -> Result<(), SinkError>;
    async fn queue_called(
        &self,
        queue_id: Uuid,
        patient_id: Uuid,
        queue_number: u32,
    ) -> Result<(), SinkError>;
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<(), SinkError>;
}

/// Posts notification requests to the configured webhook.
pub struct HttpNotifier {
    client: Client,
    webhook_url: String,
}

impl HttpNotifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            webhook_url: config.notification_webhook_url.clone(),
        }
    }

    async fn post(&self, body: serde_json::Value) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SinkError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::Delivery(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_reminder(&self, appointment_id: Uuid) -> Result<(), SinkError> {
        self.post(json!({
            "kind": "appointment_reminder",
            "appointment_id": appointment_id,
        }))
        .await
    }

    async fn queue_called(
        &self,
        queue_id: Uuid,
        patient_id: Uuid,
        queue_number: u32,
    ) -> Result<(), SinkError> {
        self.post(json!({
            "kind": "queue_called",
            "queue_id": queue_id,
            "patient_id": patient_id,
            "queue_number": queue_number,
        }))
        .await
    }
}

/// Log-only notifier for deployments without a webhook.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reminder(&self, appointment_id: Uuid) -> Result<(), SinkError> {
        info!("Reminder requested for appointment {}", appointment_id);
        Ok(())
    }

    async fn queue_called(
        &self,
        queue_id: Uuid,
        patient_id: Uuid,
        queue_number: u32,
    ) -> Result<(), SinkError> {
        info!(
            "Queue call notification: entry {} (ticket {}) for patient {}",
            queue_id, queue_number, patient_id
        );
        Ok(())
    }
}

pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), SinkError> {
        info!(
            action = %record.action,
            entity_id = %record.entity_id,
            "audit: {}",
            record.metadata
        );
        Ok(())
    }
}

/// Collects audit records in memory so tests can assert on emission.
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}
