/// Record store abstraction
///
/// The worker only needs three operations against the external record store:
/// enumerate ids of a kind, read one record, and overwrite one record. Records
/// travel as raw JSON so validation can reject malformed ones without the
/// store imposing a schema.
pub mod file;
#[cfg(test)]
pub mod memory;

pub use file::FileStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Kind under which check records are stored.
pub const CHECKS: &str = "checks";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {kind}/{id} not found")]
    NotFound { kind: String, id: String },

    #[error("record {kind}/{id} is not valid JSON: {source}")]
    Corrupt {
        kind: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record {kind}/{id}: {source}")]
    Encode {
        kind: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("record store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List ids of every record of `kind`
    async fn list(&self, kind: &str) -> Result<Vec<String>, StoreError>;

    /// Read one record
    async fn read(&self, kind: &str, id: &str) -> Result<Value, StoreError>;

    /// Replace an existing record. Never creates a missing one.
    async fn update(&self, kind: &str, id: &str, record: &Value) -> Result<(), StoreError>;
}
