//! Data model, remote access and caching for the breakdown viewer

pub mod cache;
pub mod config;
pub mod model;
pub mod sources;

use thiserror::Error;

// Re-exports
pub use cache::{CacheEntry, ViewCache, ViewKey, ViewPayload};
pub use config::{ClientConfig, NullConfig, MISSING_PLACEHOLDER};
pub use model::{
    Cell, ColumnConfig, ColumnRole, DataSource, ExplorerPage, InsightsSnapshot, MissingValues,
    PageKey, Row, SourceId, ValueCounts, ViewKind,
};
pub use sources::{DataAccess, HttpSource, MemorySource};

/// Result type used by every data access operation
pub type Result<T, E = DataError> = std::result::Result<T, E>;

/// Errors that can occur while talking to a data source.
///
/// Errors are cheap to clone so a failed fetch can be parked in the view cache
/// and rendered later as a "no data" state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Transport failure, non-success response or undecodable body
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The source (or column) does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected before or by the server
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl DataError {
    /// Short label used in logs and placeholders
    pub fn kind(&self) -> &'static str {
        match self {
            DataError::NetworkFailure(_) => "network",
            DataError::NotFound(_) => "not-found",
            DataError::InvalidRequest(_) => "invalid-request",
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) if status == reqwest::StatusCode::NOT_FOUND => {
                DataError::NotFound(error.to_string())
            }
            _ => DataError::NetworkFailure(error.to_string()),
        }
    }
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        DataError::InvalidRequest(format!("CSV parsing error: {}", error))
    }
}

impl From<serde_json::Error> for DataError {
    fn from(error: serde_json::Error) -> Self {
        DataError::NetworkFailure(format!("malformed response: {}", error))
    }
}
