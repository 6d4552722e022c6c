use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;

use crate::api_response;
use crate::content::ContentStore;
use crate::error::GatewayError;
use crate::gateway::auth::AuthGate;
use crate::gateway::rate_limit::RateLimiter;
use crate::gateway::router::{ActionRouter, WebhookAction};
use crate::gateway::test_session::TestSession;
use crate::models::{NewLogEntry, UploadedFile};
use crate::storage::{LogStorage, Storage};

/// One inbound call, reduced to what the pipeline needs: routing metadata,
/// the already-parsed body and any uploaded files.
#[derive(Debug)]
pub struct InboundRequest {
    pub action: String,
    pub endpoint: String,
    pub method: String,
    pub source_address: String,
    /// Header names are lowercased by the transport layer.
    pub headers: Value,
    pub params: Value,
    pub files: Vec<UploadedFile>,
}

#[derive(Debug)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Composes Auth Gate → Rate Limiter → Test Session → Action Router and
/// writes exactly one incoming log entry per processed call.
pub struct RequestPipeline {
    auth: AuthGate,
    rate_limiter: RateLimiter,
    test_session: TestSession,
    router: ActionRouter,
    logs: LogStorage,
}

impl RequestPipeline {
    pub fn new(
        storage: Arc<Storage>,
        content: Arc<dyn ContentStore>,
        test_session: TestSession,
    ) -> Self {
        Self {
            auth: AuthGate::new(Arc::new(storage.config.clone())),
            rate_limiter: RateLimiter::new(),
            test_session,
            router: ActionRouter::new(content),
            logs: storage.logs.clone(),
        }
    }

    pub async fn handle(&self, request: InboundRequest) -> GatewayResponse {
        let (status, body) = match self.process(&request).await {
            Ok(data) => (
                StatusCode::OK,
                serde_json::json!({ "success": true, "data": data }),
            ),
            Err(e) => (e.status(), api_response::error_body(&e)),
        };

        // Logged even when the router returned an error; a log failure must
        // not alter the response already computed for the caller.
        self.log_exchange(&request, &body, status);

        GatewayResponse { status, body }
    }

    /// Requests whose body failed to parse never reach the Action Router but
    /// still produce one log entry carrying the raw body and the parse
    /// error codes.
    pub fn handle_malformed(
        &self,
        mut request: InboundRequest,
        raw_body: String,
        errors: Vec<String>,
    ) -> GatewayResponse {
        let err = GatewayError::InvalidPayload { errors };
        let status = err.status();
        let body = api_response::error_body(&err);

        request.params = serde_json::json!({ "raw": raw_body });
        self.log_exchange(&request, &body, status);

        GatewayResponse { status, body }
    }

    async fn process(&self, request: &InboundRequest) -> Result<Value, GatewayError> {
        self.auth
            .verify(header_value(&request.headers, "x-auth-key"))?;
        self.rate_limiter.check(&request.source_address)?;

        // An active test session diverts the call into the capture slot; the
        // Content Store is never touched.
        if self.test_session.is_active() {
            let envelope = serde_json::json!({
                "action": request.action,
                "params": request.params,
                "files": files_summary(&request.files),
                "headers": request.headers,
            });
            self.test_session.capture(envelope.clone());
            return Ok(serde_json::json!({
                "test_mode": true,
                "captured_data": envelope,
            }));
        }

        let action: WebhookAction = request.action.parse()?;
        self.router
            .dispatch(action, &request.params, &request.files)
            .await
    }

    fn log_exchange(&self, request: &InboundRequest, response: &Value, status: StatusCode) {
        let mut entry = NewLogEntry::incoming(
            &request.endpoint,
            &request.method,
            &request.source_address,
        );
        entry.headers = request.headers.clone();
        entry.params = request.params.clone();
        entry.files = files_summary(&request.files);
        entry.response = response.clone();
        entry.status_code = status.as_u16();

        if let Err(e) = self.logs.append(entry) {
            tracing::error!("Webhook logging failed: {e}");
        }
    }
}

fn header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    headers.get(name)?.as_str()
}

/// File metadata for logs and test captures; bodies are never persisted.
fn files_summary(files: &[UploadedFile]) -> Value {
    let mut map = serde_json::Map::new();
    for file in files {
        map.insert(
            file.field.clone(),
            serde_json::json!({
                "name": file.file_name,
                "type": file.content_type,
                "size": file.size(),
            }),
        );
    }
    Value::Object(map)
}
