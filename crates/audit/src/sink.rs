//! Audit sink abstraction.
//!
//! The core treats the sink as **best effort, append-only**: it never assumes a
//! write is synchronous or durable, and a failed append never rolls back the
//! operation that produced it. Callers log the failure and move on.

use std::sync::Arc;

use crate::record::AuditRecord;

/// Append-only destination for audit records.
pub trait AuditSink: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    /// Append one batch of records. A batch belongs to a single operation.
    fn append(&self, batch: Vec<AuditRecord>) -> Result<(), Self::Error>;
}

/// Read access to a sink's history (audit log views).
pub trait AuditReader: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    /// All records in append order.
    fn read_all(&self) -> Result<Vec<AuditRecord>, Self::Error>;
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    type Error = S::Error;

    fn append(&self, batch: Vec<AuditRecord>) -> Result<(), Self::Error> {
        (**self).append(batch)
    }
}

impl<S> AuditReader for Arc<S>
where
    S: AuditReader + ?Sized,
{
    type Error = S::Error;

    fn read_all(&self) -> Result<Vec<AuditRecord>, Self::Error> {
        (**self).read_all()
    }
}
