//! ReconciliationEngine: apply a physical count to the ledger.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use cargobay_audit::AuditSink;
use cargobay_auth::{Permission, PermissionCheck};
use cargobay_core::{OperatorId, StockRecordId};
use cargobay_inventory::{
    DiscrepancyRecord, LocationCounts, PhysicalCounts, StockEvent, StockReconciled, StockRecord,
    counted_total, reconcile_record,
};

use super::{ServiceContext, StockReconciler};
use crate::error::{ServiceResult, StoreError};
use crate::locks::EntityLocks;
use crate::store::EntityStore;

pub struct ReconciliationEngine<S, P, A> {
    records: S,
    locks: Arc<EntityLocks<StockRecordId>>,
    ctx: ServiceContext<P, A>,
}

impl<S, P, A> ReconciliationEngine<S, P, A>
where
    S: EntityStore<StockRecord>,
    P: PermissionCheck,
    A: AuditSink,
{
    /// `locks` should be the ones the ledger over the same store uses
    /// (see [`super::StockLedger::locks`]).
    pub fn new(records: S, locks: Arc<EntityLocks<StockRecordId>>, ctx: ServiceContext<P, A>) -> Self {
        Self { records, locks, ctx }
    }

    /// Reconcile one record under its lock. Never fails: anything that
    /// prevents applying the counts is reported as a discrepancy.
    fn reconcile_one(&self, record_id: StockRecordId, counts: &LocationCounts) -> Vec<DiscrepancyRecord> {
        self.locks.with(&record_id, || {
            let now = Utc::now();
            let mut record = match self.records.get(&record_id) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    warn!(record = %record_id, "counted stock record not found, skipping");
                    return vec![DiscrepancyRecord::record_not_found(
                        record_id,
                        counted_total(counts),
                        now,
                    )];
                }
                Err(err) => return vec![not_applied(record_id, &err)],
            };

            let found = match reconcile_record(&mut record, counts, now) {
                Ok(found) => found,
                Err(err) => {
                    warn!(record = %record_id, error = %err, "physical count could not be applied");
                    return vec![DiscrepancyRecord::not_applied(record_id, err.to_string(), now)];
                }
            };
            if found.is_empty() {
                return found;
            }

            match self.records.put(record) {
                Ok(()) => {
                    warn!(record = %record_id, discrepancies = found.len(), "ledger corrected from physical count");
                    found
                }
                Err(err) => vec![not_applied(record_id, &err)],
            }
        })
    }
}

fn not_applied(record_id: StockRecordId, err: &StoreError) -> DiscrepancyRecord {
    warn!(record = %record_id, error = %err, "storage failure during reconciliation");
    DiscrepancyRecord::not_applied(record_id, format!("storage failure: {err}"), Utc::now())
}

impl<S, P, A> StockReconciler for ReconciliationEngine<S, P, A>
where
    S: EntityStore<StockRecord>,
    P: PermissionCheck,
    A: AuditSink,
{
    /// Records are processed in ascending id order; per-record failures are
    /// part of the report and never abort the batch.
    #[instrument(skip(self, counts), fields(records = counts.len()))]
    fn reconcile(
        &self,
        operator: &OperatorId,
        counts: PhysicalCounts,
    ) -> ServiceResult<Vec<DiscrepancyRecord>> {
        self.ctx.authorize(operator, &Permission::INVENTORY_AUDIT)?;

        let mut discrepancies = Vec::new();
        for (record_id, location_counts) in counts.iter() {
            discrepancies.extend(self.reconcile_one(*record_id, location_counts));
        }

        info!(
            records_checked = counts.len(),
            discrepancies = discrepancies.len(),
            "reconciliation finished"
        );
        self.ctx.record(
            operator,
            &StockEvent::StockReconciled(StockReconciled {
                records_checked: counts.len(),
                audit_data: counts,
                discrepancies: discrepancies.clone(),
                occurred_at: Utc::now(),
            }),
        );
        Ok(discrepancies)
    }
}
