//! Flat-file JSON store: one file per entity type holding a JSON array.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;

use cargobay_core::Entity;

use super::EntityStore;
use crate::error::StoreError;

/// File-backed store.
///
/// The file is loaded once on open and kept in memory; every write rewrites
/// it through a temporary sibling file and a rename, so readers of the file
/// never observe a half-written array. The cache is only updated once the
/// file write succeeded.
#[derive(Debug)]
pub struct JsonFileStore<E: Entity> {
    path: PathBuf,
    cache: RwLock<BTreeMap<E::Id, E>>,
}

impl<E> JsonFileStore<E>
where
    E: Entity + Clone + Serialize + DeserializeOwned,
{
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entities: Vec<E> = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(StoreError::io(&path, err)),
        };

        Ok(Self {
            path,
            cache: RwLock::new(entities.into_iter().map(|e| (e.id().clone(), e)).collect()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, map: &BTreeMap<E::Id, E>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let entities: Vec<&E> = map.values().collect();
        let bytes = serde_json::to_vec_pretty(&entities)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))
    }
}

impl<E> EntityStore<E> for JsonFileStore<E>
where
    E: Entity + Clone + Serialize + DeserializeOwned + Send + Sync,
    E::Id: Send + Sync,
{
    fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let map = self.cache.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<E>, StoreError> {
        let map = self.cache.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }

    fn put(&self, entity: E) -> Result<(), StoreError> {
        let mut map = self.cache.write().map_err(|_| StoreError::Poisoned)?;
        let mut next = map.clone();
        next.insert(entity.id().clone(), entity);
        self.persist(&next)?;
        *map = next;
        Ok(())
    }

    fn remove(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let mut map = self.cache.write().map_err(|_| StoreError::Poisoned)?;
        if !map.contains_key(id) {
            return Ok(None);
        }
        let mut next = map.clone();
        let removed = next.remove(id);
        self.persist(&next)?;
        *map = next;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cargobay_core::{ItemId, LocationId, OrderId, ShipmentId, StockRecordId};
    use cargobay_inventory::StockRecord;
    use cargobay_shipping::{Shipment, ShipmentItemLine};
    use chrono::Utc;

    #[test]
    fn entities_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventories.json");

        let store = JsonFileStore::<StockRecord>::open(&path).unwrap();
        let record = StockRecord::new(StockRecordId::new(1), ItemId::new("P000001").unwrap(), "bolts", Utc::now())
            .with_locations([(LocationId::new(1), 50), (LocationId::new(2), 30)])
            .unwrap();
        store.put(record.clone()).unwrap();

        let reopened = JsonFileStore::<StockRecord>::open(&path).unwrap();
        let loaded = reopened.get(&StockRecordId::new(1)).unwrap().unwrap();
        assert_eq!(loaded.total_on_hand(), 80);
        assert_eq!(loaded.locations(), record.locations());
    }

    #[test]
    fn remove_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("shipments.json");

        let store = JsonFileStore::<Shipment>::open(&path).unwrap();
        let shipment = Shipment::new(
            ShipmentId::new(4),
            [OrderId::new(1)],
            vec![ShipmentItemLine::new(ItemId::new("X").unwrap(), 3)],
            Utc::now(),
        );
        store.put(shipment).unwrap();
        assert!(store.remove(&ShipmentId::new(4)).unwrap().is_some());

        let reopened = JsonFileStore::<Shipment>::open(&path).unwrap();
        assert!(reopened.list().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::<StockRecord>::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
