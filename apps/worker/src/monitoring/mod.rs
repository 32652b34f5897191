/// Check execution engine
///
/// This module is responsible for:
/// - Validating stored check records
/// - Probing targets with a bounded timeout
/// - Deriving up/down state and deciding when to alert
/// - Scheduling probing and log rotation passes
pub mod evaluator;
pub mod executor;
pub mod prober;
pub mod scheduler;
pub mod types;
pub mod validation;


pub use executor::WorkerContext;
pub use prober::HttpProber;
pub use scheduler::MonitoringScheduler;
