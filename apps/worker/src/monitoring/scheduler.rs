use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use super::executor::{PipelineReport, WorkerContext, run_pipeline};
use crate::error::PipelineError;
use crate::logs::{LogRotator, RotationReport};
use crate::store::CHECKS;

/// Period of the log rotation loop
pub const ROTATION_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

pub type PipelineHandle = JoinHandle<Result<PipelineReport, PipelineError>>;

/// Drives the probing loop and the rotation loop
pub struct MonitoringScheduler {
    context: Arc<WorkerContext>,
    rotator: Arc<LogRotator>,
    check_interval: Duration,
    in_flight: Option<Arc<InFlight>>,
}

impl MonitoringScheduler {
    pub fn new(
        context: Arc<WorkerContext>,
        rotator: Arc<LogRotator>,
        check_interval: Duration,
        skip_in_flight: bool,
    ) -> Self {
        Self {
            context,
            rotator,
            check_interval,
            in_flight: skip_in_flight.then(|| Arc::new(InFlight::default())),
        }
    }

    /// One probing pass: list every check and spawn an independent pipeline
    /// for each. Returns without waiting for the pipelines.
    pub async fn probe_tick(&self) -> Vec<PipelineHandle> {
        let ids = match self.context.store.list(CHECKS).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("could not list checks, skipping this pass: {}", e);
                return Vec::new();
            }
        };

        if ids.is_empty() {
            info!("no checks to process");
        }

        ids.into_iter()
            .filter_map(|check_id| {
                let claim = match &self.in_flight {
                    Some(in_flight) => match in_flight.try_claim(&check_id) {
                        Some(claim) => Some(claim),
                        None => {
                            debug!(check_id = %check_id, "previous pipeline still running, skipping");
                            return None;
                        }
                    },
                    None => None,
                };

                let context = Arc::clone(&self.context);
                Some(tokio::spawn(async move {
                    let _claim = claim;
                    run_pipeline(context, check_id).await
                }))
            })
            .collect()
    }

    /// One rotation pass
    pub async fn rotation_tick(&self) -> Option<RotationReport> {
        match self.rotator.rotate_logs().await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("log rotation pass failed: {}", e);
                None
            }
        }
    }

    /// Start both loops. Each fires immediately, then on its own period.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        info!(
            "Starting scheduler: probing every {}s, rotating logs every {}h",
            self.check_interval.as_secs(),
            ROTATION_PERIOD.as_secs() / 3600
        );

        let probing = {
            let scheduler = Arc::clone(&self);
            tokio::spawn(async move {
                let mut timer = interval(scheduler.check_interval);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    timer.tick().await;
                    let launched = scheduler.probe_tick().await;
                    debug!("probing pass launched {} pipelines", launched.len());
                }
            })
        };

        let rotation = tokio::spawn(async move {
            let mut timer = interval(ROTATION_PERIOD);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                self.rotation_tick().await;
            }
        });

        SchedulerHandle { probing, rotation }
    }
}

/// Owns the two running loops
pub struct SchedulerHandle {
    probing: JoinHandle<()>,
    rotation: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop both loops. Pipelines already spawned are abandoned, not drained.
    pub async fn shutdown(self) {
        self.probing.abort();
        self.rotation.abort();
        let _ = self.probing.await;
        let _ = self.rotation.await;
        info!("Scheduler stopped");
    }
}

/// Check ids with a pipeline currently running
#[derive(Default)]
struct InFlight {
    ids: Mutex<HashSet<String>>,
}

impl InFlight {
    fn try_claim(self: &Arc<Self>, check_id: &str) -> Option<InFlightClaim> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        ids.insert(check_id.to_string())
            .then(|| InFlightClaim { in_flight: Arc::clone(self), check_id: check_id.to_string() })
    }
}

struct InFlightClaim {
    in_flight: Arc<InFlight>,
    check_id: String,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.in_flight.ids.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.check_id);
    }
}
