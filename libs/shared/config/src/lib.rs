use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directory_base_url: String,
    pub directory_api_key: String,
    pub notification_webhook_url: String,
    pub bind_port: u16,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    pub slot_minutes: i64,
    pub default_consultation_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            directory_base_url: env::var("DIRECTORY_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("DIRECTORY_BASE_URL not set, using empty value");
                    String::new()
                }),
            directory_api_key: env::var("DIRECTORY_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("DIRECTORY_API_KEY not set, using empty value");
                    String::new()
                }),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL")
                .unwrap_or_else(|_| {
                    warn!("NOTIFICATION_WEBHOOK_URL not set, notifications will be log-only");
                    String::new()
                }),
            bind_port: env::var("BIND_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            work_start_hour: env::var("WORK_START_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
            work_end_hour: env::var("WORK_END_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(17),
            slot_minutes: env::var("SLOT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            default_consultation_minutes: env::var("DEFAULT_CONSULTATION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        };

        if !config.is_configured() {
            warn!("Directory collaborator not configured - falling back to the static directory");
        }

        config
    }

    /// True when the external directory collaborator can be reached.
    pub fn is_configured(&self) -> bool {
        !self.directory_base_url.is_empty()
    }

    pub fn has_notification_webhook(&self) -> bool {
        !self.notification_webhook_url.is_empty()
    }
}
