//! Durable entity storage.
//!
//! Every operation is atomic for a single entity. Read → compute → write
//! sequences are made exclusive by the services through [`crate::locks`].

pub mod json_file;
pub mod memory;

use std::sync::Arc;

use cargobay_core::Entity;

use crate::error::StoreError;

pub use json_file::JsonFileStore;
pub use memory::InMemoryEntityStore;

/// Keyed store for one entity type.
pub trait EntityStore<E: Entity>: Send + Sync {
    fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError>;

    /// All entities, ascending by id.
    fn list(&self) -> Result<Vec<E>, StoreError>;

    /// Insert or replace.
    fn put(&self, entity: E) -> Result<(), StoreError>;

    /// Delete, returning the removed entity if it existed.
    fn remove(&self, id: &E::Id) -> Result<Option<E>, StoreError>;
}

impl<E, S> EntityStore<E> for Arc<S>
where
    E: Entity,
    S: EntityStore<E> + ?Sized,
{
    fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        (**self).get(id)
    }

    fn list(&self) -> Result<Vec<E>, StoreError> {
        (**self).list()
    }

    fn put(&self, entity: E) -> Result<(), StoreError> {
        (**self).put(entity)
    }

    fn remove(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        (**self).remove(id)
    }
}
