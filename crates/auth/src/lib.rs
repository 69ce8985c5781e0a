//! `cargobay-auth`: the permission-check capability consumed by the core.
//!
//! This crate is intentionally decoupled from HTTP, sessions and storage:
//! identifying the operator (API key lookup, login) happens outside; here we
//! only answer "may this operator perform this operation?".

pub mod authorize;
pub mod permissions;
pub mod principal;

pub use authorize::{AuthzError, PermissionCheck, PermissionTable, authorize};
pub use permissions::Permission;
pub use principal::Operator;
