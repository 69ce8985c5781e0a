use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use cargobay_core::{DomainError, OperatorId};

use crate::{Operator, Permission};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::unauthorized(value.to_string())
    }
}

/// Authorize a resolved operator for one permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(operator: &Operator, required: &Permission) -> Result<(), AuthzError> {
    if operator.has(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// The permission-check capability the warehouse services consume.
pub trait PermissionCheck: Send + Sync {
    fn check(&self, operator: &OperatorId, required: &Permission) -> Result<(), AuthzError>;
}

impl<P> PermissionCheck for Arc<P>
where
    P: PermissionCheck + ?Sized,
{
    fn check(&self, operator: &OperatorId, required: &Permission) -> Result<(), AuthzError> {
        (**self).check(operator, required)
    }
}

/// In-process operator → permissions table.
///
/// Constructed explicitly and injected into services; populated by whatever
/// resolves API keys at the edge and emptied with [`PermissionTable::clear`]
/// on shutdown.
#[derive(Debug, Default)]
pub struct PermissionTable {
    operators: RwLock<HashMap<OperatorId, Operator>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    // Every write replaces whole entries, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<OperatorId, Operator>> {
        self.operators.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<OperatorId, Operator>> {
        self.operators.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register (or replace) an operator.
    pub fn register(&self, operator: Operator) {
        self.write().insert(operator.id.clone(), operator);
    }

    /// Remove an operator; later checks for it fail with `UnknownOperator`.
    pub fn revoke(&self, operator: &OperatorId) {
        self.write().remove(operator);
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn get(&self, operator: &OperatorId) -> Option<Operator> {
        self.read().get(operator).cloned()
    }
}

impl PermissionCheck for PermissionTable {
    fn check(&self, operator: &OperatorId, required: &Permission) -> Result<(), AuthzError> {
        let map = self.read();
        let resolved = map
            .get(operator)
            .ok_or_else(|| AuthzError::UnknownOperator(operator.to_string()))?;
        authorize(resolved, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str) -> OperatorId {
        OperatorId::new(name).unwrap()
    }

    #[test]
    fn explicit_and_wildcard_permissions_are_granted() {
        let table = PermissionTable::new();
        table.register(Operator::new(op("clerk"), [Permission::CROSSDOCK_RECEIVE]));
        table.register(Operator::new(op("admin"), [Permission::WILDCARD]));

        assert!(table.check(&op("clerk"), &Permission::CROSSDOCK_RECEIVE).is_ok());
        assert_eq!(
            table.check(&op("clerk"), &Permission::CROSSDOCK_SHIP),
            Err(AuthzError::Forbidden("crossdock.ship".to_string()))
        );
        assert!(table.check(&op("admin"), &Permission::INVENTORY_AUDIT).is_ok());
    }

    #[test]
    fn revoked_and_unknown_operators_are_rejected() {
        let table = PermissionTable::new();
        table.register(Operator::new(op("temp"), [Permission::INVENTORY_READ]));
        table.revoke(&op("temp"));

        assert_eq!(
            table.check(&op("temp"), &Permission::INVENTORY_READ),
            Err(AuthzError::UnknownOperator("temp".to_string()))
        );

        table.register(Operator::new(op("temp"), [Permission::INVENTORY_READ]));
        table.clear();
        assert!(table.get(&op("temp")).is_none());
    }

    #[test]
    fn table_keeps_working_after_a_panicking_writer() {
        let table = Arc::new(PermissionTable::new());
        table.register(Operator::new(op("night-shift"), [Permission::INVENTORY_READ]));

        let poisoner = table.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.operators.write().unwrap();
            panic!("writer crashed");
        })
        .join();
        assert!(table.operators.is_poisoned());

        table.register(Operator::new(op("day-shift"), [Permission::CROSSDOCK_SHIP]));
        assert!(table.check(&op("day-shift"), &Permission::CROSSDOCK_SHIP).is_ok());

        table.revoke(&op("night-shift"));
        assert!(table.get(&op("night-shift")).is_none());

        table.clear();
        assert!(table.get(&op("day-shift")).is_none());
    }

    #[test]
    fn authz_errors_map_to_unauthorized() {
        let err: DomainError = AuthzError::Forbidden("inventory.audit".to_string()).into();
        assert!(matches!(err, DomainError::Unauthorized(msg) if msg.contains("inventory.audit")));
    }
}
