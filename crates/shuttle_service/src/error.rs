use shuttle_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("export failed: {0}")]
    Export(String),
    #[error("{0}")]
    Runtime(String),
}

impl From<csv::Error> for ServiceError {
    fn from(error: csv::Error) -> Self {
        ServiceError::Export(error.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(error: serde_json::Error) -> Self {
        ServiceError::Export(error.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(error: std::io::Error) -> Self {
        ServiceError::Export(error.to_string())
    }
}
