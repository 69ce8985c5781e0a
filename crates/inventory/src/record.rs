use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cargobay_core::{DomainError, DomainResult, Entity, ItemId, LocationId, StockRecordId};

/// Independently maintained stock counters.
///
/// Unlike `total_on_hand`, these are not derived from the location map; they
/// are set by planning/allocation flows and stored as given.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCounters {
    pub total_expected: u64,
    pub total_ordered: u64,
    pub total_allocated: u64,
    pub total_available: u64,
}

/// Per-item stock held across locations.
///
/// `total_on_hand` is stored next to the location map and recomputed by the
/// constructor, every mutator and deserialization, so a record whose total
/// disagrees with its locations cannot be observed. Mutators validate against
/// a candidate map first and only commit on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StockRecordData")]
pub struct StockRecord {
    id: StockRecordId,
    item_id: ItemId,
    description: String,
    item_reference: Option<String>,
    locations: BTreeMap<LocationId, u64>,
    total_on_hand: u64,
    counters: StockCounters,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Wire shape of a stock record. `total_on_hand` is accepted but ignored.
#[derive(Deserialize)]
struct StockRecordData {
    id: StockRecordId,
    item_id: ItemId,
    #[serde(default)]
    description: String,
    #[serde(default)]
    item_reference: Option<String>,
    #[serde(default)]
    locations: BTreeMap<LocationId, u64>,
    #[serde(default, rename = "total_on_hand")]
    _total_on_hand: Option<u64>,
    #[serde(default)]
    counters: StockCounters,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StockRecordData> for StockRecord {
    type Error = DomainError;

    fn try_from(data: StockRecordData) -> Result<Self, Self::Error> {
        let total_on_hand = checked_total(&data.locations)?;
        Ok(Self {
            id: data.id,
            item_id: data.item_id,
            description: data.description,
            item_reference: data.item_reference,
            locations: data.locations,
            total_on_hand,
            counters: data.counters,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }
}

fn checked_total(locations: &BTreeMap<LocationId, u64>) -> DomainResult<u64> {
    locations.values().try_fold(0u64, |acc, q| {
        acc.checked_add(*q)
            .ok_or_else(|| DomainError::validation("total on hand overflows"))
    })
}

impl StockRecord {
    /// A freshly stocked item with no locations yet.
    pub fn new(
        id: StockRecordId,
        item_id: ItemId,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item_id,
            description: description.into(),
            item_reference: None,
            locations: BTreeMap::new(),
            total_on_hand: 0,
            counters: StockCounters::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Seed initial location quantities.
    pub fn with_locations(
        mut self,
        locations: impl IntoIterator<Item = (LocationId, u64)>,
    ) -> DomainResult<Self> {
        let mut candidate = self.locations.clone();
        candidate.extend(locations);
        self.total_on_hand = checked_total(&candidate)?;
        self.locations = candidate;
        Ok(self)
    }

    pub fn with_item_reference(mut self, reference: impl Into<String>) -> Self {
        self.item_reference = Some(reference.into());
        self
    }

    pub fn id_typed(&self) -> StockRecordId {
        self.id
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn item_reference(&self) -> Option<&str> {
        self.item_reference.as_deref()
    }

    pub fn locations(&self) -> &BTreeMap<LocationId, u64> {
        &self.locations
    }

    pub fn location_count(&self, location: LocationId) -> Option<u64> {
        self.locations.get(&location).copied()
    }

    pub fn total_on_hand(&self) -> u64 {
        self.total_on_hand
    }

    pub fn counters(&self) -> StockCounters {
        self.counters
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Add a signed delta at one location (created on demand).
    ///
    /// Returns the new quantity at that location.
    pub fn apply_location_delta(
        &mut self,
        location: LocationId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<u64> {
        let current = self.location_count(location).unwrap_or(0);
        let next = current.checked_add_signed(delta).ok_or_else(|| {
            DomainError::invalid_state(format!(
                "stock at location {location} cannot go negative (on hand {current}, delta {delta})"
            ))
        })?;

        let mut candidate = self.locations.clone();
        candidate.insert(location, next);
        self.commit(candidate, now)?;
        Ok(next)
    }

    /// Replace the count at one location outright (physical count is ground
    /// truth). Returns the previous count, `None` if the location was new.
    pub fn set_location_count(
        &mut self,
        location: LocationId,
        count: u64,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<u64>> {
        let mut candidate = self.locations.clone();
        let previous = candidate.insert(location, count);
        self.commit(candidate, now)?;
        Ok(previous)
    }

    /// Move stock between two locations as one mutation.
    pub fn transfer(
        &mut self,
        from: LocationId,
        to: LocationId,
        amount: u64,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if from == to {
            return Err(DomainError::validation("transfer source and destination are the same"));
        }
        if amount == 0 {
            return Err(DomainError::validation("transfer amount must be positive"));
        }

        let available = self.location_count(from).unwrap_or(0);
        let remaining = available.checked_sub(amount).ok_or_else(|| {
            DomainError::invalid_state(format!(
                "location {from} holds {available}, cannot transfer {amount}"
            ))
        })?;
        let destination = self
            .location_count(to)
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(|| DomainError::validation("destination quantity overflows"))?;

        let mut candidate = self.locations.clone();
        candidate.insert(from, remaining);
        candidate.insert(to, destination);
        self.commit(candidate, now)
    }

    pub fn set_counters(&mut self, counters: StockCounters, now: DateTime<Utc>) {
        self.counters = counters;
        self.updated_at = now;
    }

    fn commit(&mut self, candidate: BTreeMap<LocationId, u64>, now: DateTime<Utc>) -> DomainResult<()> {
        let total = checked_total(&candidate)?;
        self.locations = candidate;
        self.total_on_hand = total;
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for StockRecord {
    type Id = StockRecordId;

    const KIND: &'static str = "stock record";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn loc(id: u64) -> LocationId {
        LocationId::new(id)
    }

    fn test_record() -> StockRecord {
        StockRecord::new(
            StockRecordId::new(1),
            ItemId::new("P000001").unwrap(),
            "pallet wrap",
            Utc::now(),
        )
        .with_locations([(loc(1), 50), (loc(2), 30)])
        .unwrap()
    }

    fn sum(record: &StockRecord) -> u64 {
        record.locations().values().sum()
    }

    #[test]
    fn totals_follow_location_updates() {
        let mut record = test_record();
        assert_eq!(record.total_on_hand(), 80);

        assert_eq!(record.apply_location_delta(loc(1), -5, Utc::now()).unwrap(), 45);
        assert_eq!(record.total_on_hand(), 75);

        assert_eq!(record.set_location_count(loc(2), 10, Utc::now()).unwrap(), Some(30));
        assert_eq!(record.total_on_hand(), 55);
    }

    #[test]
    fn unknown_location_is_created_on_demand() {
        let mut record = test_record();
        assert_eq!(record.apply_location_delta(loc(9), 7, Utc::now()).unwrap(), 7);
        assert_eq!(record.location_count(loc(9)), Some(7));

        assert_eq!(record.set_location_count(loc(10), 3, Utc::now()).unwrap(), None);
        assert_eq!(record.total_on_hand(), 90);
    }

    #[test]
    fn negative_result_is_rejected_and_state_unchanged() {
        let mut record = test_record();
        let before = record.clone();

        let err = record.apply_location_delta(loc(2), -31, Utc::now()).unwrap_err();
        match err {
            DomainError::InvalidState(msg) if msg.contains("cannot go negative") => {}
            other => panic!("expected InvalidState, got {other:?}"),
        }
        assert_eq!(record, before);
    }

    #[test]
    fn transfer_moves_stock_without_changing_total() {
        let mut record = test_record();
        record.transfer(loc(1), loc(3), 20, Utc::now()).unwrap();
        assert_eq!(record.location_count(loc(1)), Some(30));
        assert_eq!(record.location_count(loc(3)), Some(20));
        assert_eq!(record.total_on_hand(), 80);

        assert!(record.transfer(loc(1), loc(1), 1, Utc::now()).is_err());
        assert!(record.transfer(loc(3), loc(1), 0, Utc::now()).is_err());
        assert!(matches!(
            record.transfer(loc(3), loc(1), 21, Utc::now()),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn deserialization_recomputes_total() {
        let json = serde_json::json!({
            "id": 4,
            "item_id": "P000004",
            "description": "crates",
            "locations": { "1": 5, "2": 6 },
            "total_on_hand": 999,
            "counters": {
                "total_expected": 3,
                "total_ordered": 0,
                "total_allocated": 2,
                "total_available": 9
            },
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });
        let record: StockRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.total_on_hand(), 11);
        assert_eq!(record.counters().total_allocated, 2);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["total_on_hand"], 11);
    }

    #[test]
    fn deserialization_rejects_overflowing_total() {
        let json = serde_json::json!({
            "id": 5,
            "item_id": "P000005",
            "locations": { "1": u64::MAX, "2": 1 },
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });
        let err = serde_json::from_value::<StockRecord>(json).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever mix of deltas, counts and transfers is applied,
        /// the stored total equals the sum of location quantities.
        #[test]
        fn total_always_matches_locations(
            ops in prop::collection::vec((0u8..3, 1u64..6, 1u64..6, -100i64..100), 1..40)
        ) {
            let mut record = test_record();
            for (kind, a, b, n) in ops {
                let _ = match kind {
                    0 => record.apply_location_delta(loc(a), n, Utc::now()).map(|_| ()),
                    1 => record.set_location_count(loc(a), n.unsigned_abs(), Utc::now()).map(|_| ()),
                    _ => record.transfer(loc(a), loc(b), n.unsigned_abs(), Utc::now()),
                };
                prop_assert_eq!(record.total_on_hand(), sum(&record));
            }
        }
    }
}
