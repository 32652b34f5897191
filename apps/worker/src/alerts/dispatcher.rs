use std::sync::Arc;

use tracing::info;

use super::gateway::{GatewayError, NotificationGateway};
use crate::monitoring::types::Check;

/// Formats transition messages and hands them to the gateway. No retries.
pub struct AlertDispatcher {
    gateway: Arc<dyn NotificationGateway>,
}

impl AlertDispatcher {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self { gateway }
    }

    /// Tell the owner about the check's current state
    pub async fn alert_status_change(&self, check: &Check) -> Result<(), GatewayError> {
        let message = transition_message(check);
        self.gateway.send(&check.owner_contact, &message).await?;
        info!(check_id = %check.id, "owner alerted to status change: {}", message);
        Ok(())
    }
}

pub fn transition_message(check: &Check) -> String {
    format!(
        "Alert: Your check for {} {} is currently {}.",
        check.method.as_upper(),
        check.address(),
        check.state
    )
}
