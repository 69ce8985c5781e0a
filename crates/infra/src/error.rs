//! Infrastructure and service-layer errors.

use std::path::PathBuf;

use thiserror::Error;

use cargobay_auth::AuthzError;
use cargobay_core::DomainError;

/// Entity store / audit log failure.
///
/// Not recoverable by the core; surfaced to the caller as
/// [`ServiceError::Storage`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by every service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        ServiceError::Domain(value.into())
    }
}

impl ServiceError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(err) => Some(err),
            ServiceError::Storage(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.domain().is_some_and(DomainError::is_not_found)
    }

    pub fn is_invalid_state(&self) -> bool {
        self.domain().is_some_and(DomainError::is_invalid_state)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Domain(DomainError::Unauthorized(_)))
    }
}
