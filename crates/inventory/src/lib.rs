//! Inventory domain module: per-location stock and physical-count
//! reconciliation.
//!
//! This crate contains business rules for stock, implemented purely as
//! deterministic domain logic (no IO, no storage, no locking).

pub mod discrepancy;
pub mod event;
pub mod reconcile;
pub mod record;

pub use discrepancy::{DiscrepancyKind, DiscrepancyRecord};
pub use event::{
    CountersUpdated, LocationAdjusted, StockEvent, StockReconciled, StockRecordCreated,
    StockRecordRemoved, StockTransferred,
};
pub use reconcile::{LocationCounts, PhysicalCounts, counted_total, reconcile_record};
pub use record::{StockCounters, StockRecord};
