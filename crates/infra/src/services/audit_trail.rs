//! Read side of the audit log.

use cargobay_audit::{AuditQuery, AuditReader, AuditRecord};
use cargobay_auth::{Permission, PermissionCheck};
use cargobay_core::{OperatorId, Pagination};

use crate::error::{ServiceResult, StoreError};

/// Filtered, paginated views over the audit log.
pub struct AuditTrail<R, P> {
    reader: R,
    permissions: P,
}

impl<R, P> AuditTrail<R, P>
where
    R: AuditReader<Error = StoreError>,
    P: PermissionCheck,
{
    pub fn new(reader: R, permissions: P) -> Self {
        Self {
            reader,
            permissions,
        }
    }

    pub fn query(
        &self,
        operator: &OperatorId,
        query: &AuditQuery,
        page: Option<Pagination>,
    ) -> ServiceResult<Vec<AuditRecord>> {
        self.permissions.check(operator, &Permission::AUDIT_READ)?;
        Ok(query.run(self.reader.read_all()?, page))
    }
}
