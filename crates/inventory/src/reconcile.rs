//! Physical count reconciliation (pure).
//!
//! The infrastructure layer loads records, calls [`reconcile_record`] per
//! record and persists the result; nothing here performs IO.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cargobay_core::{DomainError, DomainResult, LocationId, StockRecordId};

use crate::discrepancy::DiscrepancyRecord;
use crate::record::StockRecord;

/// Counts per location for one stock record.
pub type LocationCounts = BTreeMap<LocationId, u64>;

/// Physical count input: stock record → location → counted quantity.
///
/// Ordered maps keep processing (and therefore the discrepancy report)
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalCounts(BTreeMap<StockRecordId, LocationCounts>);

impl PhysicalCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret raw audit input whose keys arrive as strings.
    ///
    /// Keys that are not identifiers and negative counts are validation errors;
    /// nothing is partially accepted.
    pub fn parse(raw: BTreeMap<String, BTreeMap<String, i64>>) -> DomainResult<Self> {
        let mut counts = BTreeMap::new();
        for (record_key, locations) in raw {
            let record_id: StockRecordId = record_key.parse().map_err(|_| {
                DomainError::validation(format!("'{record_key}' is not a stock record identifier"))
            })?;

            let mut parsed = LocationCounts::new();
            for (location_key, count) in locations {
                let location_id: LocationId = location_key.parse().map_err(|_| {
                    DomainError::validation(format!(
                        "'{location_key}' is not a location identifier (record {record_id})"
                    ))
                })?;
                let count = u64::try_from(count).map_err(|_| {
                    DomainError::validation(format!(
                        "negative count {count} for location {location_id} (record {record_id})"
                    ))
                })?;
                parsed.insert(location_id, count);
            }
            counts.insert(record_id, parsed);
        }
        Ok(Self(counts))
    }

    pub fn insert(&mut self, record: StockRecordId, location: LocationId, count: u64) {
        self.0.entry(record).or_default().insert(location, count);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StockRecordId, &LocationCounts)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(StockRecordId, LocationCounts)> for PhysicalCounts {
    fn from_iter<T: IntoIterator<Item = (StockRecordId, LocationCounts)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Sum of counts supplied for one record (saturating; informational only).
pub fn counted_total(counts: &LocationCounts) -> u64 {
    counts.values().fold(0u64, |acc, c| acc.saturating_add(*c))
}

/// Apply one record's physical counts.
///
/// Every counted location ends up holding its physical count. Returns the
/// discrepancies in location order; an empty list means the ledger already
/// agreed. Locations absent from `counts` are left as recorded.
pub fn reconcile_record(
    record: &mut StockRecord,
    counts: &LocationCounts,
    now: DateTime<Utc>,
) -> DomainResult<Vec<DiscrepancyRecord>> {
    let record_id = record.id_typed();
    let mut working = record.clone();
    let mut discrepancies = Vec::new();

    for (&location, &physical) in counts {
        match working.location_count(location) {
            None => {
                discrepancies.push(DiscrepancyRecord::new_location(
                    record_id, location, physical, now,
                ));
                working.set_location_count(location, physical, now)?;
            }
            Some(system) if system != physical => {
                discrepancies.push(DiscrepancyRecord::count_mismatch(
                    record_id, location, system, physical, now,
                ));
                working.set_location_count(location, physical, now)?;
            }
            Some(_) => {}
        }
    }

    *record = working;
    Ok(discrepancies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discrepancy::DiscrepancyKind;
    use cargobay_core::ItemId;

    fn loc(id: u64) -> LocationId {
        LocationId::new(id)
    }

    fn record_x() -> StockRecord {
        StockRecord::new(StockRecordId::new(1), ItemId::new("X").unwrap(), "", Utc::now())
            .with_locations([(loc(1), 50), (loc(2), 30)])
            .unwrap()
    }

    #[test]
    fn single_mismatch_is_reported_and_corrected() {
        let mut record = record_x();
        let counts = LocationCounts::from([(loc(1), 45), (loc(2), 30)]);

        let found = reconcile_record(&mut record, &counts, Utc::now()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].location_id, Some(loc(1)));
        assert_eq!(found[0].kind, DiscrepancyKind::CountMismatch);
        assert_eq!(found[0].system_count, 50);
        assert_eq!(found[0].physical_count, 45);
        assert_eq!(found[0].delta, -5);

        assert_eq!(record.location_count(loc(1)), Some(45));
        assert_eq!(record.location_count(loc(2)), Some(30));
        assert_eq!(record.total_on_hand(), 75);
    }

    #[test]
    fn unknown_location_is_created_with_discrepancy() {
        let mut record = record_x();
        let counts = LocationCounts::from([(loc(7), 12)]);

        let found = reconcile_record(&mut record, &counts, Utc::now()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DiscrepancyKind::NewLocation);
        assert_eq!(found[0].system_count, 0);
        assert_eq!(found[0].delta, 12);
        assert_eq!(record.total_on_hand(), 92);
    }

    #[test]
    fn matching_counts_produce_no_discrepancies() {
        let mut record = record_x();
        let before = record.clone();
        let counts = LocationCounts::from([(loc(1), 50), (loc(2), 30)]);

        assert!(reconcile_record(&mut record, &counts, Utc::now()).unwrap().is_empty());
        assert_eq!(record.locations(), before.locations());
    }

    #[test]
    fn parse_rejects_bad_keys_and_negative_counts() {
        let raw = BTreeMap::from([(
            "1".to_string(),
            BTreeMap::from([("2".to_string(), 4i64)]),
        )]);
        let parsed = PhysicalCounts::parse(raw).unwrap();
        assert_eq!(parsed.len(), 1);

        let bad_location = BTreeMap::from([(
            "1".to_string(),
            BTreeMap::from([("shelf-a".to_string(), 4i64)]),
        )]);
        assert!(matches!(
            PhysicalCounts::parse(bad_location),
            Err(DomainError::Validation(msg)) if msg.contains("shelf-a")
        ));

        let negative = BTreeMap::from([(
            "1".to_string(),
            BTreeMap::from([("2".to_string(), -1i64)]),
        )]);
        assert!(matches!(PhysicalCounts::parse(negative), Err(DomainError::Validation(_))));

        let bad_record = BTreeMap::from([("abc".to_string(), BTreeMap::new())]);
        assert!(PhysicalCounts::parse(bad_record).is_err());
    }
}
