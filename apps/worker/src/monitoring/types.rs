use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reachability of a check as last persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Up,
    #[default]
    Down,
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckState::Up => write!(f, "up"),
            CheckState::Down => write!(f, "down"),
        }
    }
}

/// Transport scheme used to reach a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn scheme(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "get" => Some(Method::Get),
            "post" => Some(Method::Post),
            "put" => Some(Method::Put),
            "delete" => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn as_upper(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A validated check record.
///
/// Field names on the wire follow the record store's camelCase layout. Fields
/// the worker does not know about are kept in `extra` and written back as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub id: String,
    #[serde(rename = "userPhone")]
    pub owner_contact: String,
    pub protocol: Protocol,
    #[serde(rename = "url")]
    pub target: String,
    pub method: Method,
    pub success_codes: Vec<u16>,
    pub timeout_seconds: u64,
    pub state: CheckState,
    /// Milliseconds since the Unix epoch of the last evaluation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Check {
    /// `protocol://target` as shown to owners and used to build the probe URL
    pub fn address(&self) -> String {
        format!("{}://{}", self.protocol.scheme(), self.target)
    }
}

/// Terminal result of one probe attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProbeOutcome {
    #[serde(rename_all = "camelCase")]
    Response { status_code: u16 },
    TransportError { description: String },
    Timeout,
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Response { status_code } => write!(f, "response {status_code}"),
            ProbeOutcome::TransportError { description } => write!(f, "transport error: {description}"),
            ProbeOutcome::Timeout => write!(f, "timeout"),
        }
    }
}

/// One line of a check's outcome log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub check: Check,
    pub outcome: ProbeOutcome,
    pub state: CheckState,
    /// An alert was warranted by the transition
    pub alert: bool,
    /// The gateway accepted the alert
    #[serde(rename = "alertSent", default)]
    pub alert_sent: bool,
    /// Wall-clock time of the evaluation, milliseconds since the Unix epoch
    pub time: i64,
}
