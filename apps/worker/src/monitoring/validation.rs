//! Sanity checks for stored check records.
//!
//! Every field is checked against its domain independently. A field that fails
//! is treated as absent, and a record with any required field absent is
//! rejected before it reaches the prober.

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{Check, CheckState, Method, Protocol};

pub const CHECK_ID_LENGTH: usize = 20;
pub const OWNER_CONTACT_LENGTH: usize = 10;
pub const MIN_TIMEOUT_SECONDS: u64 = 1;
pub const MAX_TIMEOUT_SECONDS: u64 = 5;

const KNOWN_FIELDS: [&str; 9] = [
    "id",
    "userPhone",
    "protocol",
    "url",
    "method",
    "successCodes",
    "timeoutSeconds",
    "state",
    "lastChecked",
];

/// A stored record that cannot be probed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "check {} is not properly formatted (invalid: {})",
    .id.as_deref().unwrap_or("<unknown>"),
    .fields.join(", ")
)]
pub struct InvalidRecord {
    /// The id, when it was itself valid
    pub id: Option<String>,
    /// Wire names of the required fields that were missing or out of domain
    pub fields: Vec<&'static str>,
}

/// Validate a raw record and build a [`Check`] from it
pub fn validate_check(raw: &Value) -> Result<Check, InvalidRecord> {
    let empty = Map::new();
    let record = raw.as_object().unwrap_or(&empty);
    let field = |name: &str| record.get(name);

    let id = field("id").and_then(|v| fixed_length_string(v, CHECK_ID_LENGTH));
    let owner_contact = field("userPhone").and_then(|v| fixed_length_string(v, OWNER_CONTACT_LENGTH));
    let protocol = field("protocol").and_then(Value::as_str).and_then(Protocol::parse);
    let target = field("url").and_then(non_empty_string);
    let method = field("method").and_then(Value::as_str).and_then(Method::parse);
    let success_codes = field("successCodes").and_then(status_codes);
    let timeout_seconds = field("timeoutSeconds")
        .and_then(whole_number)
        .filter(|t| (MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(t));

    // Optional fields fall back instead of rejecting the record
    let state = match field("state").and_then(Value::as_str) {
        Some("up") => CheckState::Up,
        _ => CheckState::Down,
    };
    let last_checked = field("lastChecked").and_then(positive_timestamp);

    let mut missing = Vec::new();
    if id.is_none() {
        missing.push("id");
    }
    if owner_contact.is_none() {
        missing.push("userPhone");
    }
    if protocol.is_none() {
        missing.push("protocol");
    }
    if target.is_none() {
        missing.push("url");
    }
    if method.is_none() {
        missing.push("method");
    }
    if success_codes.is_none() {
        missing.push("successCodes");
    }
    if timeout_seconds.is_none() {
        missing.push("timeoutSeconds");
    }

    match (id, owner_contact, protocol, target, method, success_codes, timeout_seconds) {
        (
            Some(id),
            Some(owner_contact),
            Some(protocol),
            Some(target),
            Some(method),
            Some(success_codes),
            Some(timeout_seconds),
        ) => Ok(Check {
            id,
            owner_contact,
            protocol,
            target,
            method,
            success_codes,
            timeout_seconds,
            state,
            last_checked,
            extra: record
                .iter()
                .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }),
        (id, ..) => Err(InvalidRecord { id, fields: missing }),
    }
}

fn fixed_length_string(value: &Value, length: usize) -> Option<String> {
    let trimmed = value.as_str()?.trim();
    (trimmed.chars().count() == length).then(|| trimmed.to_string())
}

fn non_empty_string(value: &Value) -> Option<String> {
    let trimmed = value.as_str()?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Accepts `3` and `3.0`, rejects `3.5`
fn whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

fn status_codes(value: &Value) -> Option<Vec<u16>> {
    let codes = value
        .as_array()?
        .iter()
        .map(|code| whole_number(code).and_then(|c| u16::try_from(c).ok()))
        .collect::<Option<Vec<u16>>>()?;
    (!codes.is_empty()).then_some(codes)
}

fn positive_timestamp(value: &Value) -> Option<i64> {
    let millis = value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))?;
    (millis > 0).then_some(millis)
}
