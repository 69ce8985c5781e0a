//! StockLedger service: per-location stock for items.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use cargobay_audit::AuditSink;
use cargobay_auth::{Permission, PermissionCheck};
use cargobay_core::page::paginate;
use cargobay_core::{DomainError, ItemId, LocationId, OperatorId, Pagination, StockRecordId};
use cargobay_inventory::{
    CountersUpdated, LocationAdjusted, StockCounters, StockEvent, StockRecord, StockRecordCreated,
    StockRecordRemoved, StockTransferred,
};

use super::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::locks::EntityLocks;
use crate::store::EntityStore;

pub struct StockLedger<S, P, A> {
    records: S,
    locks: Arc<EntityLocks<StockRecordId>>,
    /// Held across the one-record-per-item check and the insert.
    item_locks: EntityLocks<ItemId>,
    ctx: ServiceContext<P, A>,
}

impl<S, P, A> StockLedger<S, P, A>
where
    S: EntityStore<StockRecord>,
    P: PermissionCheck,
    A: AuditSink,
{
    pub fn new(records: S, ctx: ServiceContext<P, A>) -> Self {
        Self::with_locks(records, Arc::new(EntityLocks::new()), ctx)
    }

    /// Share record locks with another service touching the same records.
    pub fn with_locks(
        records: S,
        locks: Arc<EntityLocks<StockRecordId>>,
        ctx: ServiceContext<P, A>,
    ) -> Self {
        Self {
            records,
            locks,
            item_locks: EntityLocks::new(),
            ctx,
        }
    }

    pub fn locks(&self) -> Arc<EntityLocks<StockRecordId>> {
        self.locks.clone()
    }

    fn find_by_item(&self, item_id: &ItemId) -> ServiceResult<StockRecord> {
        self.records
            .list()?
            .into_iter()
            .find(|r| r.item_id() == item_id)
            .ok_or_else(|| DomainError::not_found("stock record for item", item_id).into())
    }

    /// Lock the record for `item_id`, apply `f` to a fresh copy and persist it.
    fn mutate<T>(
        &self,
        item_id: &ItemId,
        f: impl FnOnce(&mut StockRecord, DateTime<Utc>) -> Result<T, DomainError>,
    ) -> ServiceResult<(StockRecord, T)> {
        let record_id = self.find_by_item(item_id)?.id_typed();
        self.locks.with(&record_id, || {
            let mut record = self
                .records
                .get(&record_id)?
                .ok_or_else(|| DomainError::not_found("stock record", record_id))?;
            let out = f(&mut record, Utc::now())?;
            self.records.put(record.clone())?;
            Ok::<_, ServiceError>((record, out))
        })
    }

    /// `GetTotals`: the record holding `item_id`'s stock.
    pub fn get_totals(&self, operator: &OperatorId, item_id: &ItemId) -> ServiceResult<StockRecord> {
        self.ctx.authorize(operator, &Permission::INVENTORY_READ)?;
        self.find_by_item(item_id)
    }

    pub fn list_records(
        &self,
        operator: &OperatorId,
        page: Option<Pagination>,
    ) -> ServiceResult<Vec<StockRecord>> {
        self.ctx.authorize(operator, &Permission::INVENTORY_READ)?;
        Ok(paginate(self.records.list()?, page))
    }

    #[instrument(skip(self, record), fields(record_id = %record.id_typed(), item = %record.item_id()))]
    pub fn create_record(&self, operator: &OperatorId, record: StockRecord) -> ServiceResult<StockRecord> {
        self.ctx.authorize(operator, &Permission::INVENTORY_WRITE)?;
        let record_id = record.id_typed();

        // Item lock before record lock.
        self.item_locks.with(record.item_id(), || {
            self.locks.with(&record_id, || {
                let existing = self.records.list()?;
                if existing.iter().any(|r| r.id_typed() == record_id) {
                    return Err(DomainError::invalid_state(format!(
                        "stock record {record_id} already exists"
                    ))
                    .into());
                }
                if existing.iter().any(|r| r.item_id() == record.item_id()) {
                    return Err(DomainError::invalid_state(format!(
                        "item {} already has a stock record",
                        record.item_id()
                    ))
                    .into());
                }
                self.records.put(record.clone())?;
                Ok::<_, ServiceError>(())
            })
        })?;

        info!(total_on_hand = record.total_on_hand(), "stock record created");
        self.ctx.record(
            operator,
            &StockEvent::StockRecordCreated(StockRecordCreated {
                stock_record_id: record_id,
                item_id: record.item_id().clone(),
                total_on_hand: record.total_on_hand(),
                occurred_at: record.created_at(),
            }),
        );
        Ok(record)
    }

    #[instrument(skip(self))]
    pub fn remove_record(&self, operator: &OperatorId, record_id: StockRecordId) -> ServiceResult<StockRecord> {
        self.ctx.authorize(operator, &Permission::INVENTORY_WRITE)?;

        let removed = self.locks.with(&record_id, || {
            self.records
                .remove(&record_id)?
                .ok_or_else(|| ServiceError::from(DomainError::not_found("stock record", record_id)))
        })?;

        info!(item = %removed.item_id(), total_on_hand = removed.total_on_hand(), "stock record removed");
        self.ctx.record(
            operator,
            &StockEvent::StockRecordRemoved(StockRecordRemoved {
                stock_record_id: record_id,
                item_id: removed.item_id().clone(),
                total_on_hand: removed.total_on_hand(),
                occurred_at: Utc::now(),
            }),
        );
        Ok(removed)
    }

    /// `ApplyLocationDelta`: signed adjustment; the location is created on demand.
    #[instrument(skip(self))]
    pub fn apply_location_delta(
        &self,
        operator: &OperatorId,
        item_id: &ItemId,
        location: LocationId,
        delta: i64,
    ) -> ServiceResult<StockRecord> {
        self.ctx.authorize(operator, &Permission::INVENTORY_WRITE)?;

        let (record, previous) = self.mutate(item_id, |record, now| {
            let previous = record.location_count(location).unwrap_or(0);
            record.apply_location_delta(location, delta, now)?;
            Ok(previous)
        })?;

        self.adjusted(operator, &record, location, previous);
        Ok(record)
    }

    /// `SetLocationCount`: absolute replacement, no delta validation.
    #[instrument(skip(self))]
    pub fn set_location_count(
        &self,
        operator: &OperatorId,
        item_id: &ItemId,
        location: LocationId,
        count: u64,
    ) -> ServiceResult<StockRecord> {
        self.ctx.authorize(operator, &Permission::INVENTORY_WRITE)?;

        let (record, previous) = self.mutate(item_id, |record, now| {
            Ok(record.set_location_count(location, count, now)?.unwrap_or(0))
        })?;

        self.adjusted(operator, &record, location, previous);
        Ok(record)
    }

    fn adjusted(&self, operator: &OperatorId, record: &StockRecord, location: LocationId, previous: u64) {
        let current = record.location_count(location).unwrap_or(0);
        info!(
            location = %location,
            previous,
            current,
            total_on_hand = record.total_on_hand(),
            "location stock adjusted"
        );
        self.ctx.record(
            operator,
            &StockEvent::LocationAdjusted(LocationAdjusted {
                stock_record_id: record.id_typed(),
                item_id: record.item_id().clone(),
                location_id: location,
                previous,
                current,
                total_on_hand: record.total_on_hand(),
                occurred_at: record.updated_at(),
            }),
        );
    }

    #[instrument(skip(self))]
    pub fn transfer_stock(
        &self,
        operator: &OperatorId,
        item_id: &ItemId,
        from: LocationId,
        to: LocationId,
        amount: u64,
    ) -> ServiceResult<StockRecord> {
        self.ctx.authorize(operator, &Permission::INVENTORY_WRITE)?;

        let (record, ()) = self.mutate(item_id, |record, now| record.transfer(from, to, amount, now))?;

        info!(%from, %to, amount, "stock transferred");
        self.ctx.record(
            operator,
            &StockEvent::StockTransferred(StockTransferred {
                stock_record_id: record.id_typed(),
                item_id: record.item_id().clone(),
                from,
                to,
                amount,
                occurred_at: record.updated_at(),
            }),
        );
        Ok(record)
    }

    #[instrument(skip(self))]
    pub fn set_counters(
        &self,
        operator: &OperatorId,
        item_id: &ItemId,
        counters: StockCounters,
    ) -> ServiceResult<StockRecord> {
        self.ctx.authorize(operator, &Permission::INVENTORY_WRITE)?;

        let (record, ()) = self.mutate(item_id, |record, now| {
            record.set_counters(counters, now);
            Ok(())
        })?;

        self.ctx.record(
            operator,
            &StockEvent::CountersUpdated(CountersUpdated {
                stock_record_id: record.id_typed(),
                counters,
                occurred_at: record.updated_at(),
            }),
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryEntityStore;
    use cargobay_audit::InMemoryAuditSink;
    use cargobay_auth::{Operator, PermissionTable};
    use proptest::prelude::*;

    type Ledger = StockLedger<
        Arc<InMemoryEntityStore<StockRecord>>,
        Arc<PermissionTable>,
        Arc<InMemoryAuditSink>,
    >;

    fn clerk() -> OperatorId {
        OperatorId::new("clerk").unwrap()
    }

    fn item_x() -> ItemId {
        ItemId::new("X").unwrap()
    }

    fn setup(permissions: &[Permission]) -> (Ledger, Arc<InMemoryAuditSink>) {
        let table = Arc::new(PermissionTable::new());
        table.register(Operator::new(clerk(), permissions.iter().cloned()));
        let audit = Arc::new(InMemoryAuditSink::new());

        let record = StockRecord::new(StockRecordId::new(1), item_x(), "widgets", Utc::now())
            .with_locations([(LocationId::new(1), 50), (LocationId::new(2), 30)])
            .unwrap();
        let store = Arc::new(InMemoryEntityStore::with_entities([record]));

        let ledger = StockLedger::new(store, ServiceContext::new(table, audit.clone()));
        (ledger, audit)
    }

    #[test]
    fn delta_updates_location_and_total() {
        let (ledger, audit) = setup(&[Permission::WILDCARD]);

        let record = ledger
            .apply_location_delta(&clerk(), &item_x(), LocationId::new(1), -20)
            .unwrap();
        assert_eq!(record.location_count(LocationId::new(1)), Some(30));
        assert_eq!(record.total_on_hand(), 60);

        let stored = ledger.get_totals(&clerk(), &item_x()).unwrap();
        assert_eq!(stored.total_on_hand(), 60);
        assert_eq!(audit.len(), 1);
        assert_eq!(audit.records()[0].operation(), "inventory.stock.location_adjusted");
    }

    #[test]
    fn negative_result_is_rejected_and_nothing_changes() {
        let (ledger, audit) = setup(&[Permission::WILDCARD]);

        let err = ledger
            .apply_location_delta(&clerk(), &item_x(), LocationId::new(2), -31)
            .unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(ledger.get_totals(&clerk(), &item_x()).unwrap().total_on_hand(), 80);
        assert!(audit.is_empty());
    }

    #[test]
    fn set_count_creates_unknown_location() {
        let (ledger, _) = setup(&[Permission::WILDCARD]);

        let record = ledger
            .set_location_count(&clerk(), &item_x(), LocationId::new(9), 5)
            .unwrap();
        assert_eq!(record.location_count(LocationId::new(9)), Some(5));
        assert_eq!(record.total_on_hand(), 85);
    }

    #[test]
    fn unknown_item_is_not_found() {
        let (ledger, _) = setup(&[Permission::WILDCARD]);
        let err = ledger
            .get_totals(&clerk(), &ItemId::new("missing").unwrap())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn create_rejects_duplicate_item_and_remove_is_audited() {
        let (ledger, audit) = setup(&[Permission::WILDCARD]);

        let dup = StockRecord::new(StockRecordId::new(2), item_x(), "", Utc::now());
        assert!(ledger.create_record(&clerk(), dup).unwrap_err().is_invalid_state());

        let other = StockRecord::new(StockRecordId::new(2), ItemId::new("Y").unwrap(), "", Utc::now());
        ledger.create_record(&clerk(), other).unwrap();
        assert_eq!(ledger.list_records(&clerk(), None).unwrap().len(), 2);

        let removed = ledger.remove_record(&clerk(), StockRecordId::new(2)).unwrap();
        assert_eq!(removed.item_id().as_str(), "Y");
        assert!(
            ledger
                .remove_record(&clerk(), StockRecordId::new(2))
                .unwrap_err()
                .is_not_found()
        );

        let ops: Vec<String> = audit.records().iter().map(|r| r.operation().to_string()).collect();
        assert_eq!(ops, vec!["inventory.stock.created", "inventory.stock.removed"]);
    }

    #[test]
    fn transfer_keeps_total() {
        let (ledger, _) = setup(&[Permission::WILDCARD]);
        let record = ledger
            .transfer_stock(&clerk(), &item_x(), LocationId::new(1), LocationId::new(3), 10)
            .unwrap();
        assert_eq!(record.location_count(LocationId::new(1)), Some(40));
        assert_eq!(record.location_count(LocationId::new(3)), Some(10));
        assert_eq!(record.total_on_hand(), 80);
    }

    #[test]
    fn read_only_operator_cannot_write() {
        let (ledger, audit) = setup(&[Permission::INVENTORY_READ]);

        assert!(ledger.get_totals(&clerk(), &item_x()).is_ok());
        let err = ledger
            .set_counters(&clerk(), &item_x(), StockCounters::default())
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert!(audit.is_empty());
    }

    /// Widens the window between the duplicate check and the insert.
    struct SlowList(InMemoryEntityStore<StockRecord>);

    impl EntityStore<StockRecord> for SlowList {
        fn get(&self, id: &StockRecordId) -> Result<Option<StockRecord>, crate::error::StoreError> {
            self.0.get(id)
        }

        fn list(&self) -> Result<Vec<StockRecord>, crate::error::StoreError> {
            let records = self.0.list();
            std::thread::sleep(std::time::Duration::from_millis(20));
            records
        }

        fn put(&self, entity: StockRecord) -> Result<(), crate::error::StoreError> {
            self.0.put(entity)
        }

        fn remove(&self, id: &StockRecordId) -> Result<Option<StockRecord>, crate::error::StoreError> {
            self.0.remove(id)
        }
    }

    #[test]
    fn concurrent_creates_for_one_item_store_a_single_record() {
        let table = Arc::new(PermissionTable::new());
        table.register(Operator::new(clerk(), [Permission::WILDCARD]));
        let store = Arc::new(SlowList(InMemoryEntityStore::new()));
        let ledger = Arc::new(StockLedger::new(
            store.clone(),
            ServiceContext::new(table, Arc::new(InMemoryAuditSink::new())),
        ));
        let barrier = Arc::new(std::sync::Barrier::new(4));

        let handles: Vec<_> = (1..=4u64)
            .map(|id| {
                let ledger = ledger.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    let record = StockRecord::new(StockRecordId::new(id), item_x(), "", Utc::now());
                    barrier.wait();
                    ledger.create_record(&clerk(), record)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| e.is_invalid_state())
        );
        let stored = store.list().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].item_id(), &item_x());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: whatever sequence of deltas is applied, accepted ones
        /// keep the stored total equal to the location sum and rejected ones
        /// change nothing.
        #[test]
        fn stored_total_tracks_locations(deltas in prop::collection::vec((1u64..4, -60i64..60), 1..30)) {
            let (ledger, _) = setup(&[Permission::WILDCARD]);

            for (location, delta) in deltas {
                let before = ledger.get_totals(&clerk(), &item_x()).unwrap();
                match ledger.apply_location_delta(&clerk(), &item_x(), LocationId::new(location), delta) {
                    Ok(after) => {
                        prop_assert_eq!(after.total_on_hand(), after.locations().values().sum::<u64>());
                    }
                    Err(err) => {
                        prop_assert!(err.is_invalid_state());
                        prop_assert_eq!(ledger.get_totals(&clerk(), &item_x()).unwrap(), before);
                    }
                }
            }
        }
    }
}
