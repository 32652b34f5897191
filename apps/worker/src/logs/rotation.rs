//! Daily compaction of outcome logs.
//!
//! For every live log: capture it into a fresh archive, and only once the
//! archive is safely written, drop the captured bytes from the live log.
//! A failure before the archive exists leaves the live log untouched for the
//! next rotation. A failure while truncating leaves an archive that already
//! holds the captured content, so the next rotation may archive some lines a
//! second time but never loses any.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{Capture, LogError, LogSink};

#[derive(Debug, Error)]
pub enum RotationError {
    #[error("could not list logs: {0}")]
    List(#[source] LogError),

    #[error("could not archive log {log_id}: {source}")]
    Archive {
        log_id: String,
        #[source]
        source: LogError,
    },

    #[error("archived log {log_id} as {archive_id} but could not truncate it: {source}")]
    Truncate {
        log_id: String,
        archive_id: String,
        #[source]
        source: LogError,
    },
}

/// Summary of one rotation pass
#[derive(Debug, Default)]
pub struct RotationReport {
    /// Archive ids written in this pass
    pub archived: Vec<String>,
    /// Live logs that were empty
    pub skipped: usize,
    pub failures: Vec<RotationError>,
}

pub struct LogRotator {
    sink: Arc<dyn LogSink>,
}

impl LogRotator {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Rotate every live log. Per-log failures are collected, not propagated.
    pub async fn rotate_logs(&self) -> Result<RotationReport, RotationError> {
        let logs = self.sink.list(false).await.map_err(RotationError::List)?;
        let mut report = RotationReport::default();

        for log_id in logs {
            match self.rotate_log(&log_id).await {
                Ok(Some(archive_id)) => report.archived.push(archive_id),
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!(log_id = %log_id, "log rotation failed: {}", e);
                    report.failures.push(e);
                }
            }
        }

        info!(
            "Log rotation completed: {} archived, {} empty, {} failed",
            report.archived.len(),
            report.skipped,
            report.failures.len()
        );
        Ok(report)
    }

    /// Rotate one live log, returning the archive id when one was written
    pub async fn rotate_log(&self, log_id: &str) -> Result<Option<String>, RotationError> {
        let archive_id = format!("{log_id}-{}", Utc::now().timestamp_millis());

        let captured = match self.sink.compress(log_id, &archive_id).await {
            Ok(Capture::Empty) => {
                debug!(log_id, "live log empty, nothing to rotate");
                return Ok(None);
            }
            Ok(Capture::Archived { bytes }) => bytes,
            Err(source) => {
                return Err(RotationError::Archive { log_id: log_id.to_string(), source });
            }
        };

        self.sink.truncate(log_id, captured).await.map_err(|source| RotationError::Truncate {
            log_id: log_id.to_string(),
            archive_id: archive_id.clone(),
            source,
        })?;

        debug!(log_id, archive_id = %archive_id, bytes = captured, "log rotated");
        Ok(Some(archive_id))
    }
}
