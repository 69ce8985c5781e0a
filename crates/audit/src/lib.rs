//! Audit trail: structured, append-only records of every state-changing
//! warehouse operation.
//!
//! Domain crates describe *what happened* as typed [`AuditEvent`]s; the
//! infrastructure layer wraps them into [`AuditRecord`]s (operator + time) and
//! hands them to an [`AuditSink`].

pub mod event;
pub mod in_memory_sink;
pub mod query;
pub mod record;
pub mod sink;

pub use event::AuditEvent;
pub use in_memory_sink::{InMemoryAuditSink, InMemorySinkError};
pub use query::AuditQuery;
pub use record::AuditRecord;
pub use sink::{AuditReader, AuditSink};
