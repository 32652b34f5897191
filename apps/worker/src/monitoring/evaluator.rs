use super::types::{Check, CheckState, ProbeOutcome};

/// Decision derived from one probe outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub state: CheckState,
    /// Whether the owner should be told about a transition
    pub alert: bool,
    /// Timestamp to persist as `lastChecked`
    pub checked_at: i64,
}

/// Derive the new state and the alert decision.
///
/// A check is up only when the probe produced a response whose status code is
/// listed in `success_codes`. An alert is warranted when the check had been
/// evaluated before and the state changed; the very first evaluation never
/// alerts. `checked_at` never moves backwards from a previously stored value.
pub fn evaluate(check: &Check, outcome: &ProbeOutcome, now_millis: i64) -> Evaluation {
    let state = match outcome {
        ProbeOutcome::Response { status_code } if check.success_codes.contains(status_code) => {
            CheckState::Up
        }
        _ => CheckState::Down,
    };

    let alert = check.last_checked.is_some() && check.state != state;
    let checked_at = check.last_checked.map_or(now_millis, |prior| prior.max(now_millis));

    Evaluation { state, alert, checked_at }
}

impl Check {
    /// Copy of this check carrying the evaluated state
    pub fn with_evaluation(&self, evaluation: &Evaluation) -> Check {
        Check {
            state: evaluation.state,
            last_checked: Some(evaluation.checked_at),
            ..self.clone()
        }
    }
}
