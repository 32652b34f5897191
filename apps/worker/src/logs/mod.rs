/// Per-check outcome logs and their daily rotation
///
/// Each check appends to its own live log. Rotation folds the live contents
/// into a gzip+base64 archive next to it and then empties the live log so it
/// keeps accepting appends.
pub mod archive;
pub mod file;
pub mod outcome;
pub mod rotation;

pub use file::FileLogSink;
pub use outcome::OutcomeLogger;
pub use rotation::{LogRotator, RotationReport};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("log {0} not found")]
    NotFound(String),

    #[error("archive {0} already exists")]
    ArchiveExists(String),

    #[error("archive {id} is corrupt: {reason}")]
    CorruptArchive { id: String, reason: String },

    #[error("failed to encode outcome record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("log I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// What `compress` captured from a live log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Live log was empty; no archive written
    Empty,
    /// Archive written holding the first `bytes` bytes of the live log
    Archived { bytes: u64 },
}

/// Storage for live logs and their archives
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Append one line to the live log of `id`, creating it if needed
    async fn append(&self, id: &str, line: &str) -> Result<(), LogError>;

    /// Names of live logs, plus archives when `include_archived` is set
    async fn list(&self, include_archived: bool) -> Result<Vec<String>, LogError>;

    /// Capture the live log of `id` into a new archive named `archive_id`
    async fn compress(&self, id: &str, archive_id: &str) -> Result<Capture, LogError>;

    /// Drop the first `captured_bytes` bytes of the live log of `id`
    async fn truncate(&self, id: &str, captured_bytes: u64) -> Result<(), LogError>;

    /// Original text of an archive
    async fn decompress(&self, archive_id: &str) -> Result<String, LogError>;
}
