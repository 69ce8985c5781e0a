//! `cargobay-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod page;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ItemId, LocationId, OperatorId, OrderId, ShipmentId, StockRecordId};
pub use page::Pagination;
pub use value_object::ValueObject;
