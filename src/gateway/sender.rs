use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::models::NewLogEntry;
use crate::storage::LogStorage;

/// Upper bound on one outbound delivery attempt.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(15);

/// Performs outbound HTTP deliveries and records every attempt in the log
/// store. Single attempt, no retry; a failure is recorded and reported as a
/// bool, never raised.
pub struct WebhookSender {
    client: reqwest::Client,
    logs: LogStorage,
    user_agent: String,
}

impl WebhookSender {
    pub fn new(logs: LogStorage, site_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            logs,
            user_agent: format!(
                "webhook-gateway/{} (+{site_url})",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }

    /// POST `payload` as JSON to `url`. An empty url fails immediately with
    /// no log side effect; everything else produces exactly one outgoing
    /// log entry, whatever the outcome.
    pub async fn send(
        &self,
        url: &str,
        payload: &Value,
        custom_headers: &HashMap<String, String>,
    ) -> bool {
        if url.is_empty() {
            return false;
        }

        let headers = self.build_headers(custom_headers);

        let result = self
            .client
            .post(url)
            .timeout(WEBHOOK_TIMEOUT)
            .headers(headers.clone())
            .body(payload.to_string())
            .send()
            .await;

        let (status, response_body, delivered) = match result {
            Ok(response) => {
                let status = response.status().as_u16();
                let delivered = response.status().is_success();
                let body = response.text().await.unwrap_or_else(|_| String::new());
                (status, body, delivered)
            }
            // Transport failures are recorded as a 500 with the error text
            // as the response body.
            Err(e) => (500, e.to_string(), false),
        };

        self.log_delivery(url, payload, &headers, status, &response_body);

        delivered
    }

    /// Caller headers are merged over the defaults, so a custom
    /// Content-Type or User-Agent wins.
    fn build_headers(&self, custom: &HashMap<String, String>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }

        for (name, value) in custom {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("Skipping invalid webhook header {name}"),
            }
        }

        headers
    }

    fn log_delivery(
        &self,
        url: &str,
        payload: &Value,
        headers: &HeaderMap,
        status: u16,
        response_body: &str,
    ) {
        let mut entry = NewLogEntry::outgoing(url);
        entry.headers = headers_to_json(headers);
        entry.params = payload.clone();
        entry.status_code = status;
        entry.response = Value::String(response_body.to_string());

        // Logging is best-effort; a write failure must never surface to the
        // dispatcher.
        if let Err(e) = self.logs.append(entry) {
            tracing::error!("Failed to record outbound delivery to {url}: {e}");
        }
    }
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = serde_json::Map::new();
    for (name, value) in headers {
        map.insert(
            name.as_str().to_string(),
            Value::String(value.to_str().unwrap_or("").to_string()),
        );
    }
    Value::Object(map)
}
