//! Owner notifications for state transitions
pub mod dispatcher;
pub mod gateway;

pub use dispatcher::AlertDispatcher;
pub use gateway::{GatewayError, HttpGateway, LogGateway, NotificationGateway};
