//! In-memory audit sink for tests/dev.

use std::sync::Mutex;

use thiserror::Error;

use crate::record::AuditRecord;
use crate::sink::{AuditReader, AuditSink};

#[derive(Debug, Error)]
pub enum InMemorySinkError {
    /// Internal lock poisoning.
    #[error("audit sink lock poisoned")]
    Poisoned,
}

/// In-memory append-only audit log.
///
/// - No IO
/// - Records kept in append order
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far (empty if the lock is poisoned).
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditSink {
    type Error = InMemorySinkError;

    fn append(&self, batch: Vec<AuditRecord>) -> Result<(), Self::Error> {
        let mut records = self.records.lock().map_err(|_| InMemorySinkError::Poisoned)?;
        records.extend(batch);
        Ok(())
    }
}

impl AuditReader for InMemoryAuditSink {
    type Error = InMemorySinkError;

    fn read_all(&self) -> Result<Vec<AuditRecord>, Self::Error> {
        let records = self.records.lock().map_err(|_| InMemorySinkError::Poisoned)?;
        Ok(records.clone())
    }
}
