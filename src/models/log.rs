use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which way the exchange went: a request received by the gateway or a
/// delivery it sent out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Incoming,
    Outgoing,
}

/// One durable record of an inbound exchange or outbound delivery attempt.
/// Immutable after insert; removed only by a full truncation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub time: i64,
    pub endpoint: String,
    pub method: String,
    pub headers: Value,
    pub params: Value,
    pub files: Value,
    pub response: Value,
    pub status_code: u16,
    pub source_address: String,
    #[serde(default)]
    pub direction: Direction,
}

/// A log record before the store assigns its id and timestamp.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub endpoint: String,
    pub method: String,
    pub headers: Value,
    pub params: Value,
    pub files: Value,
    pub response: Value,
    pub status_code: u16,
    pub source_address: String,
    pub direction: Direction,
}

impl NewLogEntry {
    /// Record for an inbound request/response exchange.
    pub fn incoming(
        endpoint: impl Into<String>,
        method: impl Into<String>,
        source_address: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: method.into(),
            headers: Value::Object(Default::default()),
            params: Value::Object(Default::default()),
            files: Value::Object(Default::default()),
            response: Value::Null,
            status_code: 200,
            source_address: source_address.into(),
            direction: Direction::Incoming,
        }
    }

    /// Record for an outbound webhook delivery attempt. Outbound entries
    /// have no source address.
    pub fn outgoing(url: impl Into<String>) -> Self {
        Self {
            endpoint: url.into(),
            method: "POST".to_string(),
            headers: Value::Object(Default::default()),
            params: Value::Object(Default::default()),
            files: Value::Object(Default::default()),
            response: Value::Null,
            status_code: 200,
            source_address: String::new(),
            direction: Direction::Outgoing,
        }
    }
}
