use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use cargobay_core::OperatorId;

use crate::Permission;

/// An identified operator together with the permissions granted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub permissions: BTreeSet<Permission>,
}

impl Operator {
    pub fn new(id: OperatorId, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            id,
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn has(&self, required: &Permission) -> bool {
        self.permissions.contains(&Permission::WILDCARD) || self.permissions.contains(required)
    }
}
