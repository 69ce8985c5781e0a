//! Audit log query interface (filtering + pagination over stored records).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cargobay_core::page::paginate;
use cargobay_core::{OperatorId, Pagination};

use crate::record::AuditRecord;

/// Filter criteria for audit log views. Every field is optional; an empty
/// query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditQuery {
    /// Records at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Records at or before this time.
    pub to: Option<DateTime<Utc>>,
    /// Only records performed by this operator.
    pub performed_by: Option<OperatorId>,
    /// Only records whose operation starts with this prefix
    /// (e.g. `"crossdock."` or `"inventory.stock.reconciled"`).
    pub operation_prefix: Option<String>,
}

impl AuditQuery {
    pub fn matches(&self, record: &AuditRecord) -> bool {
        let after_start = self.from.is_none_or(|from| record.timestamp() >= from);
        let before_end = self.to.is_none_or(|to| record.timestamp() <= to);
        let by_operator = self
            .performed_by
            .as_ref()
            .is_none_or(|op| record.performed_by() == op);
        let by_operation = self
            .operation_prefix
            .as_deref()
            .is_none_or(|prefix| record.operation().starts_with(prefix));

        after_start && before_end && by_operator && by_operation
    }

    /// Filter then paginate, preserving append order.
    pub fn run(&self, records: Vec<AuditRecord>, page: Option<Pagination>) -> Vec<AuditRecord> {
        let matching = records.into_iter().filter(|r| self.matches(r)).collect();
        paginate(matching, page)
    }
}
