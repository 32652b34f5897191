use thiserror::Error;

use crate::alerts::GatewayError;
use crate::logs::LogError;
use crate::monitoring::validation::InvalidRecord;
use crate::store::StoreError;

/// Failures isolated to a single check's pipeline.
///
/// `InvalidRecord` and a failed read end the pipeline before probing. The
/// others happen after evaluation and are collected on the pipeline report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidRecord(#[from] InvalidRecord),

    #[error("persistence failed for check {check_id}: {source}")]
    Persistence {
        check_id: String,
        #[source]
        source: StoreError,
    },

    #[error("alert delivery failed for check {check_id}: {source}")]
    AlertDelivery {
        check_id: String,
        #[source]
        source: GatewayError,
    },

    #[error("outcome log append failed for check {check_id}: {source}")]
    LogAppend {
        check_id: String,
        #[source]
        source: LogError,
    },
}
