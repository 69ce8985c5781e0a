//! Configuration loading and representation.

use std::path::{Path, PathBuf};

use thiserror::Error;

use cargobay_core::OperatorId;

pub const ENV_DATA_DIR: &str = "CARGOBAY_DATA_DIR";
pub const ENV_AUDIT_LOG: &str = "CARGOBAY_AUDIT_LOG";
pub const ENV_OPERATOR: &str = "CARGOBAY_OPERATOR";

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is set but empty")]
    Empty { name: &'static str },

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process configuration. Built once at startup and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub audit_log: PathBuf,
    /// Operator used when the caller does not name one.
    pub operator: Option<OperatorId>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(name) {
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty { name }),
                other => Ok(other),
            }
        };

        let data_dir = var(ENV_DATA_DIR)?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let audit_log = var(ENV_AUDIT_LOG)?
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("logs").join("audit.jsonl"));
        let operator = var(ENV_OPERATOR)?
            .map(OperatorId::new)
            .transpose()
            .map_err(|e| ConfigError::Invalid {
                name: ENV_OPERATOR,
                reason: e.to_string(),
            })?;

        Ok(Self {
            data_dir,
            audit_log,
            operator,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn stock_records_path(&self) -> PathBuf {
        self.data_dir.join("inventories.json")
    }

    pub fn shipments_path(&self) -> PathBuf {
        self.data_dir.join("shipments.json")
    }

    pub fn orders_path(&self) -> PathBuf {
        self.data_dir.join("orders.json")
    }
}
