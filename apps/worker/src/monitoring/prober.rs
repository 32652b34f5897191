use std::time::Duration;

use tokio::time::timeout;
use url::Url;

use super::types::{Check, ProbeOutcome};

/// Performs one bounded probe against a check's target
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Probe the target once. Always produces exactly one terminal outcome.
    async fn probe(&self, check: &Check) -> ProbeOutcome;
}

/// HTTP/HTTPS prober
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        // Redirects are reported as-is so they can be listed in success codes
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("checkwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, check: &Check) -> ProbeOutcome {
        let url = match Url::parse(&check.address()) {
            Ok(url) => url,
            Err(e) => {
                return ProbeOutcome::TransportError { description: format!("invalid target: {e}") };
            }
        };

        let bound = Duration::from_secs(check.timeout_seconds);
        let request = self.client.request(check.method.into(), url).send();

        match timeout(bound, request).await {
            Err(_) => ProbeOutcome::Timeout,
            Ok(Err(e)) if e.is_timeout() => ProbeOutcome::Timeout,
            Ok(Err(e)) => ProbeOutcome::TransportError { description: e.to_string() },
            Ok(Ok(response)) => ProbeOutcome::Response { status_code: response.status().as_u16() },
        }
    }
}
