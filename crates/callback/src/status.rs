use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Splits a `key=value` state-change payload at the first `=`.
///
/// Empty and JSON-shaped payloads carry no key. A payload without `=` is all key.
pub fn parse_status_change(payload: &str) -> (&str, &str) {
    if payload.is_empty() || payload.starts_with('{') {
        return ("", "");
    }
    payload.split_once('=').unwrap_or((payload, ""))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnoCommandResult {
    pub command_name: String,
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnoCommandResultError {
    #[error("malformed uno command result: {0}")]
    Malformed(String),
}

pub fn parse_uno_command_result(payload: &str) -> Result<UnoCommandResult, UnoCommandResultError> {
    serde_json::from_str(payload).map_err(|err| UnoCommandResultError::Malformed(err.to_string()))
}
