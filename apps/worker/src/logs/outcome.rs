use std::sync::Arc;

use super::{LogError, LogSink};
use crate::monitoring::types::OutcomeRecord;

/// Appends one JSON line per evaluated outcome to the check's live log
pub struct OutcomeLogger {
    sink: Arc<dyn LogSink>,
}

impl OutcomeLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub async fn log_outcome(&self, record: &OutcomeRecord) -> Result<(), LogError> {
        let line = serde_json::to_string(record)?;
        self.sink.append(&record.check.id, &line).await
    }
}
