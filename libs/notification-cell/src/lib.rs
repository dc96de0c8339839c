pub mod dispatch;
pub mod events;
pub mod sinks;

pub use dispatch::{spawn_dispatcher, EventBus};
pub use events::{AuditRecord, DomainEvent};
pub use sinks::{
    AuditSink, HttpNotifier, LogAuditSink, LogNotifier, MemoryAuditSink, Notifier, SinkError,
};
