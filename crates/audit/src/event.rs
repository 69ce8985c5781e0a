use chrono::{DateTime, Utc};
use serde::Serialize;

/// A domain fact worth auditing.
///
/// Audit events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (payload schema evolution)
/// - designed to be **append-only**
pub trait AuditEvent: Clone + core::fmt::Debug + Serialize + Send + Sync + 'static {
    /// Stable operation name (e.g. `"inventory.stock.reconciled"`).
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the operation happened (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
