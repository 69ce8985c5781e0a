use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cargobay_core::{LocationId, StockRecordId, ValueObject};

/// Why a discrepancy was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Recorded and counted quantities differ.
    CountMismatch,
    /// The counted location was not in the ledger (system count taken as 0).
    NewLocation,
    /// The counted stock record does not exist; its counts were skipped.
    RecordNotFound,
    /// The record exists but its counts could not be applied or persisted.
    NotApplied,
}

/// A mismatch between recorded (system) and physically counted stock.
///
/// Immutable once created; only reconciliation produces these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyRecord {
    pub stock_record_id: StockRecordId,
    /// `None` when the discrepancy concerns the whole record.
    pub location_id: Option<LocationId>,
    pub kind: DiscrepancyKind,
    pub system_count: u64,
    pub physical_count: u64,
    /// `physical_count - system_count`.
    pub delta: i64,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ValueObject for DiscrepancyRecord {}

fn signed_delta(system: u64, physical: u64) -> i64 {
    let delta = i128::from(physical) - i128::from(system);
    i64::try_from(delta).unwrap_or(if delta < 0 { i64::MIN } else { i64::MAX })
}

impl DiscrepancyRecord {
    pub fn count_mismatch(
        stock_record_id: StockRecordId,
        location_id: LocationId,
        system_count: u64,
        physical_count: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            stock_record_id,
            location_id: Some(location_id),
            kind: DiscrepancyKind::CountMismatch,
            system_count,
            physical_count,
            delta: signed_delta(system_count, physical_count),
            note: None,
            timestamp,
        }
    }

    pub fn new_location(
        stock_record_id: StockRecordId,
        location_id: LocationId,
        physical_count: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            stock_record_id,
            location_id: Some(location_id),
            kind: DiscrepancyKind::NewLocation,
            system_count: 0,
            physical_count,
            delta: signed_delta(0, physical_count),
            note: Some(format!("location {location_id} not in ledger; created")),
            timestamp,
        }
    }

    /// `physical_count` carries the sum of the counts that were skipped.
    pub fn record_not_found(
        stock_record_id: StockRecordId,
        skipped_count: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            stock_record_id,
            location_id: None,
            kind: DiscrepancyKind::RecordNotFound,
            system_count: 0,
            physical_count: skipped_count,
            delta: signed_delta(0, skipped_count),
            note: Some(format!("stock record {stock_record_id} not found")),
            timestamp,
        }
    }

    pub fn not_applied(
        stock_record_id: StockRecordId,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            stock_record_id,
            location_id: None,
            kind: DiscrepancyKind::NotApplied,
            system_count: 0,
            physical_count: 0,
            delta: 0,
            note: Some(reason.into()),
            timestamp,
        }
    }
}
