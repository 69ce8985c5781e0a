use std::collections::BTreeMap;
use std::sync::RwLock;

use cargobay_core::Entity;

use super::EntityStore;
use crate::error::StoreError;

/// In-memory entity store for tests/dev.
#[derive(Debug)]
pub struct InMemoryEntityStore<E: Entity> {
    inner: RwLock<BTreeMap<E::Id, E>>,
}

impl<E: Entity> InMemoryEntityStore<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    /// Seed a store from existing entities (last one wins on duplicate ids).
    pub fn with_entities(entities: impl IntoIterator<Item = E>) -> Self {
        Self {
            inner: RwLock::new(entities.into_iter().map(|e| (e.id().clone(), e)).collect()),
        }
    }
}

impl<E: Entity> Default for InMemoryEntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EntityStore<E> for InMemoryEntityStore<E>
where
    E: Entity + Clone + Send + Sync,
    E::Id: Send + Sync,
{
    fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<E>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }

    fn put(&self, entity: E) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(entity.id().clone(), entity);
        Ok(())
    }

    fn remove(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(id))
    }
}
