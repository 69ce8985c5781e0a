use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cargobay_audit::AuditEvent;
use cargobay_core::{ItemId, LocationId, StockRecordId};

use crate::discrepancy::DiscrepancyRecord;
use crate::reconcile::PhysicalCounts;
use crate::record::StockCounters;

/// Event: StockRecordCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecordCreated {
    pub stock_record_id: StockRecordId,
    pub item_id: ItemId,
    pub total_on_hand: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockRecordRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecordRemoved {
    pub stock_record_id: StockRecordId,
    pub item_id: ItemId,
    /// On-hand quantity at the moment of removal.
    pub total_on_hand: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LocationAdjusted (delta or absolute set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAdjusted {
    pub stock_record_id: StockRecordId,
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub previous: u64,
    pub current: u64,
    pub total_on_hand: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockTransferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransferred {
    pub stock_record_id: StockRecordId,
    pub item_id: ItemId,
    pub from: LocationId,
    pub to: LocationId,
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CountersUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountersUpdated {
    pub stock_record_id: StockRecordId,
    pub counters: StockCounters,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReconciled.
///
/// One per reconciliation call: the audited input plus the full discrepancy
/// report, so a log reader can replay what was counted and what changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReconciled {
    pub audit_data: PhysicalCounts,
    pub discrepancies: Vec<DiscrepancyRecord>,
    pub records_checked: usize,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    StockRecordCreated(StockRecordCreated),
    StockRecordRemoved(StockRecordRemoved),
    LocationAdjusted(LocationAdjusted),
    StockTransferred(StockTransferred),
    CountersUpdated(CountersUpdated),
    StockReconciled(StockReconciled),
}

impl AuditEvent for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::StockRecordCreated(_) => "inventory.stock.created",
            StockEvent::StockRecordRemoved(_) => "inventory.stock.removed",
            StockEvent::LocationAdjusted(_) => "inventory.stock.location_adjusted",
            StockEvent::StockTransferred(_) => "inventory.stock.transferred",
            StockEvent::CountersUpdated(_) => "inventory.stock.counters_updated",
            StockEvent::StockReconciled(_) => "inventory.stock.reconciled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::StockRecordCreated(e) => e.occurred_at,
            StockEvent::StockRecordRemoved(e) => e.occurred_at,
            StockEvent::LocationAdjusted(e) => e.occurred_at,
            StockEvent::StockTransferred(e) => e.occurred_at,
            StockEvent::CountersUpdated(e) => e.occurred_at,
            StockEvent::StockReconciled(e) => e.occurred_at,
        }
    }
}
