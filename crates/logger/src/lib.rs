mod subscriber;

pub use subscriber::{LogFormat, init};
