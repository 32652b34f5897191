use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::evaluator::{Evaluation, evaluate};
use super::prober::Prober;
use super::types::{Check, OutcomeRecord, ProbeOutcome};
use super::validation::validate_check;
use crate::alerts::AlertDispatcher;
use crate::error::PipelineError;
use crate::logs::OutcomeLogger;
use crate::store::{CHECKS, RecordStore, StoreError};

/// Collaborators shared by every pipeline
pub struct WorkerContext {
    pub store: Arc<dyn RecordStore>,
    pub prober: Arc<dyn Prober>,
    pub alerts: AlertDispatcher,
    pub outcomes: OutcomeLogger,
}

/// What one pipeline did after the probe
#[derive(Debug)]
pub struct PipelineReport {
    /// The check as written back to the store
    pub check: Check,
    pub outcome: ProbeOutcome,
    pub evaluation: Evaluation,
    pub persisted: bool,
    /// An alert was warranted and the gateway accepted it
    pub alerted: bool,
    /// Non-fatal failures after evaluation
    pub errors: Vec<PipelineError>,
}

impl WorkerContext {
    /// read → validate → probe → evaluate → persist → alert → log
    pub async fn process_check(&self, check_id: &str) -> Result<PipelineReport, PipelineError> {
        let raw = self.store.read(CHECKS, check_id).await.map_err(|source| {
            PipelineError::Persistence { check_id: check_id.to_string(), source }
        })?;
        let check = validate_check(&raw)?;

        let outcome = self.prober.probe(&check).await;
        let now = Utc::now().timestamp_millis();
        let evaluation = evaluate(&check, &outcome, now);
        let updated = check.with_evaluation(&evaluation);

        let mut errors = Vec::new();

        let persisted = match self.persist(&updated).await {
            Ok(()) => true,
            Err(source) => {
                errors.push(PipelineError::Persistence { check_id: updated.id.clone(), source });
                false
            }
        };

        // Only transitions that made it to the store are announced
        let mut alerted = false;
        if evaluation.alert && persisted {
            match self.alerts.alert_status_change(&updated).await {
                Ok(()) => alerted = true,
                Err(source) => {
                    errors.push(PipelineError::AlertDelivery { check_id: updated.id.clone(), source })
                }
            }
        } else if !evaluation.alert {
            debug!(check_id = %updated.id, "check outcome has not changed, no alert needed");
        }

        let record = OutcomeRecord {
            check: updated.clone(),
            outcome: outcome.clone(),
            state: evaluation.state,
            alert: evaluation.alert,
            alert_sent: alerted,
            time: now,
        };
        if let Err(source) = self.outcomes.log_outcome(&record).await {
            errors.push(PipelineError::LogAppend { check_id: updated.id.clone(), source });
        }

        Ok(PipelineReport { check: updated, outcome, evaluation, persisted, alerted, errors })
    }

    async fn persist(&self, check: &Check) -> Result<(), StoreError> {
        let record = serde_json::to_value(check).map_err(|source| StoreError::Encode {
            kind: CHECKS.to_string(),
            id: check.id.clone(),
            source,
        })?;
        self.store.update(CHECKS, &check.id, &record).await
    }
}

/// Run one pipeline and log whatever went wrong. Never panics on a bad check.
pub async fn run_pipeline(
    context: Arc<WorkerContext>,
    check_id: String,
) -> Result<PipelineReport, PipelineError> {
    let result = context.process_check(&check_id).await;

    match &result {
        Ok(report) => {
            for e in &report.errors {
                match e {
                    PipelineError::LogAppend { .. } => warn!(check_id = %check_id, "{}", e),
                    _ => error!(check_id = %check_id, "{}", e),
                }
            }
            info!(
                check_id = %check_id,
                "Check {} - {} - State: {} - Alert: {}",
                report.check.address(),
                report.outcome,
                report.evaluation.state,
                report.alerted
            );
        }
        Err(e @ PipelineError::InvalidRecord(_)) => {
            warn!(check_id = %check_id, "skipping check: {}", e);
        }
        Err(e) => {
            error!(check_id = %check_id, "{}", e);
        }
    }

    result
}
