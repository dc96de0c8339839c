use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::events::DomainEvent;
use crate::sinks::{AuditSink, Notifier};

/// Publish side of the internal event stream. `publish` never blocks and
/// never fails the caller; if the dispatcher has gone away the event is
/// logged and dropped, matching the fire-and-forget contract for
/// notification and audit side effects.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DomainEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, event: DomainEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!("Event dropped, dispatcher not running: {:?}", e.0);
        }
    }
}

/// Consumes the event stream: one audit record per event, plus the
/// patient-facing notifications (booking reminder, queue call).
/// Sink failures are logged and swallowed.
pub fn spawn_dispatcher(
    mut rx: mpsc::UnboundedReceiver<DomainEvent>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            debug!("Dispatching event {:?}", event);

            if let Err(e) = audit.record(event.audit_record(Utc::now())).await {
                warn!("Audit sink rejected record: {}", e);
            }

            match &event {
                DomainEvent::AppointmentBooked { appointment_id, .. } => {
                    if let Err(e) = notifier.send_reminder(*appointment_id).await {
                        warn!(
                            "Reminder delivery failed for appointment {}: {}",
                            appointment_id, e
                        );
                    }
                }
                DomainEvent::QueueEntryCalled {
                    queue_id,
                    patient_id,
                    queue_number,
                    ..
                } => {
                    if let Err(e) = notifier
                        .queue_called(*queue_id, *patient_id, *queue_number)
                        .await
                    {
                        warn!("Queue call notification failed for {}: {}", queue_id, e);
                    }
                }
                _ => {}
            }
        }
        debug!("Event dispatcher stopped");
    })
}
