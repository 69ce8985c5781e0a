//! Infrastructure layer: entity stores, locking, audit log, configuration
//! and the warehouse services built on them.

pub mod audit_log;
pub mod config;
pub mod error;
pub mod locks;
pub mod services;
pub mod store;


pub use audit_log::JsonLinesAuditSink;
pub use config::{Config, ConfigError};
pub use error::{ServiceError, ServiceResult, StoreError};
pub use locks::EntityLocks;
pub use services::{
    AuditTrail, BackorderDetector, BackorderTracker, CrossDockMatcher, ReconciliationEngine,
    ServiceContext, ShipmentMatcher, StockLedger, StockReconciler,
};
pub use store::{EntityStore, InMemoryEntityStore, JsonFileStore};
