//! Fakes shared by the worker's tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::alerts::{AlertDispatcher, GatewayError, NotificationGateway};
use crate::logs::{FileLogSink, LogSink, OutcomeLogger};
use crate::monitoring::WorkerContext;
use crate::monitoring::prober::Prober;
use crate::monitoring::types::{Check, ProbeOutcome};
use crate::store::memory::MemoryStore;

/// Prober answering from a per-target script
pub struct ScriptedProber {
    outcomes: Mutex<HashMap<String, ProbeOutcome>>,
    default: ProbeOutcome,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn always(outcome: ProbeOutcome) -> Self {
        Self {
            outcomes: Mutex::new(HashMap::new()),
            default: outcome,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set(&self, target: &str, outcome: ProbeOutcome) {
        self.outcomes.lock().unwrap().insert(target.to_string(), outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, check: &Check) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcomes.lock().unwrap().get(&check.target).cloned().unwrap_or_else(|| self.default.clone())
    }
}

/// Gateway that records every message and optionally rejects them
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<(String, String)>>,
    pub reject_with: Option<u16>,
}

impl RecordingGateway {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send(&self, contact: &str, message: &str) -> Result<(), GatewayError> {
        self.sent.lock().unwrap().push((contact.to_string(), message.to_string()));
        match self.reject_with {
            Some(status) => Err(GatewayError::Rejected(status)),
            None => Ok(()),
        }
    }
}

/// A valid stored check record; `id` is padded to the required length
pub fn check_record(id: &str, target: &str) -> Value {
    json!({
        "id": padded_id(id),
        "userPhone": "5551234567",
        "protocol": "http",
        "url": target,
        "method": "get",
        "successCodes": [200],
        "timeoutSeconds": 2,
        "state": "down",
    })
}

pub fn padded_id(id: &str) -> String {
    format!("{id:0>20}")
}

/// Everything a pipeline needs, backed by fakes and a temporary logs dir
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub prober: Arc<ScriptedProber>,
    pub gateway: Arc<RecordingGateway>,
    pub sink: Arc<FileLogSink>,
    pub logs_dir: TempDir,
    pub context: Arc<WorkerContext>,
}

impl Harness {
    pub fn new(prober: ScriptedProber) -> Self {
        Self::with_gateway(prober, RecordingGateway::default())
    }

    pub fn with_gateway(prober: ScriptedProber, gateway: RecordingGateway) -> Self {
        let logs_dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(FileLogSink::new(logs_dir.path()));
        Self::assemble(prober, gateway, sink, logs_dir)
    }

    pub fn assemble(
        prober: ScriptedProber,
        gateway: RecordingGateway,
        sink: Arc<FileLogSink>,
        logs_dir: TempDir,
    ) -> Self {
        let store = Arc::new(MemoryStore::default());
        let prober = Arc::new(prober);
        let gateway = Arc::new(gateway);
        let context = Arc::new(WorkerContext {
            store: store.clone(),
            prober: prober.clone(),
            alerts: AlertDispatcher::new(gateway.clone()),
            outcomes: OutcomeLogger::new(sink.clone() as Arc<dyn LogSink>),
        });
        Self { store, prober, gateway, sink, logs_dir, context }
    }

    /// Parsed lines of a check's live outcome log
    pub fn outcome_lines(&self, check_id: &str) -> Vec<Value> {
        std::fs::read_to_string(self.logs_dir.path().join(format!("{check_id}.log")))
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}
