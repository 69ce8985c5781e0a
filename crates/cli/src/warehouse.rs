//! Wiring: file-backed stores, audit log and services for one data directory.

use std::sync::Arc;

use anyhow::Context;

use cargobay_auth::{Operator, Permission, PermissionTable};
use cargobay_core::OperatorId;
use cargobay_infra::{
    AuditTrail, BackorderDetector, Config, CrossDockMatcher, JsonFileStore, JsonLinesAuditSink,
    ReconciliationEngine, ServiceContext, StockLedger,
};
use cargobay_inventory::StockRecord;
use cargobay_shipping::{Order, Shipment};

type Records = Arc<JsonFileStore<StockRecord>>;
type Shipments = Arc<JsonFileStore<Shipment>>;
type Orders = Arc<JsonFileStore<Order>>;
type Permissions = Arc<PermissionTable>;
type Sink = Arc<JsonLinesAuditSink>;

pub struct Warehouse {
    pub ledger: StockLedger<Records, Permissions, Sink>,
    pub reconciliation: ReconciliationEngine<Records, Permissions, Sink>,
    pub crossdock: CrossDockMatcher<Shipments, Orders, Permissions, Sink>,
    pub backorders: BackorderDetector<Shipments, Orders, Permissions, Sink>,
    pub audit_trail: AuditTrail<Sink, Permissions>,
}

impl Warehouse {
    /// Open the stores under `config.data_dir` on behalf of `operator`.
    ///
    /// Whoever runs the binary owns the data directory, so the operator is
    /// granted every permission.
    pub fn open(config: &Config, operator: &OperatorId) -> anyhow::Result<Self> {
        let permissions = Arc::new(PermissionTable::new());
        permissions.register(Operator::new(operator.clone(), [Permission::WILDCARD]));

        let sink = Arc::new(JsonLinesAuditSink::new(&config.audit_log));
        let ctx = ServiceContext::new(permissions.clone(), sink.clone());

        let records: Records = Arc::new(
            JsonFileStore::open(config.stock_records_path())
                .with_context(|| format!("opening {}", config.stock_records_path().display()))?,
        );
        let shipments: Shipments = Arc::new(
            JsonFileStore::open(config.shipments_path())
                .with_context(|| format!("opening {}", config.shipments_path().display()))?,
        );
        let orders: Orders = Arc::new(
            JsonFileStore::open(config.orders_path())
                .with_context(|| format!("opening {}", config.orders_path().display()))?,
        );

        let ledger = StockLedger::new(records.clone(), ctx.clone());
        let reconciliation = ReconciliationEngine::new(records, ledger.locks(), ctx.clone());
        let crossdock = CrossDockMatcher::new(shipments.clone(), orders.clone(), ctx.clone());
        let backorders = BackorderDetector::new(shipments, orders, crossdock.order_locks(), ctx);
        let audit_trail = AuditTrail::new(sink, permissions);

        Ok(Self {
            ledger,
            reconciliation,
            crossdock,
            backorders,
            audit_trail,
        })
    }
}
