//! Service layer: permission check → lock → load → pure domain step →
//! persist → audit.
//!
//! Services compose an [`EntityStore`](crate::store::EntityStore) per entity
//! type, a [`PermissionCheck`] and an [`AuditSink`]. The capabilities callers
//! depend on are the [`StockReconciler`], [`ShipmentMatcher`] and
//! [`BackorderTracker`] traits.

pub mod audit_trail;
pub mod backorder;
pub mod crossdock;
pub mod ledger;
pub mod reconciliation;

use tracing::warn;

use cargobay_audit::{AuditEvent, AuditRecord, AuditSink};
use cargobay_auth::{Permission, PermissionCheck};
use cargobay_core::{OperatorId, OrderId, Pagination, ShipmentId};
use cargobay_inventory::{DiscrepancyRecord, PhysicalCounts};
use cargobay_shipping::{ItemFulfillment, MatchResult, Order, Shipment};

use crate::error::ServiceResult;

pub use audit_trail::AuditTrail;
pub use backorder::BackorderDetector;
pub use crossdock::CrossDockMatcher;
pub use ledger::StockLedger;
pub use reconciliation::ReconciliationEngine;

/// Reconcile physical counts against the ledger.
pub trait StockReconciler {
    fn reconcile(
        &self,
        operator: &OperatorId,
        counts: PhysicalCounts,
    ) -> ServiceResult<Vec<DiscrepancyRecord>>;
}

/// Cross-dock shipment handling.
pub trait ShipmentMatcher {
    fn receive_shipment(&self, operator: &OperatorId, shipment_id: ShipmentId) -> ServiceResult<Shipment>;

    fn ship_items(&self, operator: &OperatorId, shipment_id: ShipmentId) -> ServiceResult<Vec<MatchResult>>;

    /// Preview what shipping would match, without changing anything.
    ///
    /// Delivered shipments are left out: their lines were settled by
    /// `ship_items`, so leftovers on them never appear as `Pending`.
    /// Naming a delivered shipment in `shipment_id` yields an empty list.
    fn match_items(
        &self,
        operator: &OperatorId,
        shipment_id: Option<ShipmentId>,
        page: Option<Pagination>,
    ) -> ServiceResult<Vec<MatchResult>>;
}

/// Order backorder tracking.
pub trait BackorderTracker {
    fn update_backorder_status(&self, operator: &OperatorId, order_id: OrderId) -> ServiceResult<Order>;

    fn fulfillment_summary(
        &self,
        operator: &OperatorId,
        order_id: OrderId,
    ) -> ServiceResult<Vec<ItemFulfillment>>;
}

/// Collaborators shared by every service.
#[derive(Debug, Clone)]
pub struct ServiceContext<P, A> {
    permissions: P,
    audit: A,
}

impl<P, A> ServiceContext<P, A>
where
    P: PermissionCheck,
    A: AuditSink,
{
    pub fn new(permissions: P, audit: A) -> Self {
        Self { permissions, audit }
    }

    pub fn permissions(&self) -> &P {
        &self.permissions
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub(crate) fn authorize(&self, operator: &OperatorId, required: &Permission) -> ServiceResult<()> {
        self.permissions.check(operator, required).map_err(|err| {
            warn!(operator = %operator, permission = %required, error = %err, "permission denied");
            err.into()
        })
    }

    /// Best-effort audit append: failures are logged, never returned.
    pub(crate) fn record<E: AuditEvent>(&self, operator: &OperatorId, event: &E) {
        let record = match AuditRecord::from_event(operator.clone(), event) {
            Ok(record) => record,
            Err(err) => {
                warn!(operation = event.event_type(), error = %err, "failed to encode audit record");
                return;
            }
        };

        if let Err(err) = self.audit.append(vec![record]) {
            warn!(operation = event.event_type(), error = %err, "audit sink append failed");
        }
    }
}
