use axum::Json;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::state::AppState;
use crate::api_response;
use crate::gateway::auth::constant_time_eq;
use crate::models::TriggerKind;
use crate::storage::log::LOG_PAGE_SIZE;

/// Operator gate for the admin surface, distinct from the inbound
/// shared-secret gate. When `GATEWAY_ADMIN_TOKEN` is unset the surface is
/// open, which is only sensible for local operation.
pub async fn require_operator(request: Request, next: Next) -> Response {
    let Some(expected) = std::env::var("GATEWAY_ADMIN_TOKEN")
        .ok()
        .filter(|token| !token.is_empty())
    else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(token) if constant_time_eq(token, &expected) => next.run(request).await,
        _ => admin_error(StatusCode::UNAUTHORIZED, "Operator token required").into_response(),
    }
}

fn admin_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    let code = if status == StatusCode::BAD_REQUEST {
        "invalid_request"
    } else if status == StatusCode::UNAUTHORIZED {
        "missing_auth"
    } else {
        "internal_error"
    };
    (
        status,
        Json(json!({
            "success": false,
            "error": { "code": code, "message": message, "details": Value::Null }
        })),
    )
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub page: Option<usize>,
}

// GET /api/logs
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let page = query.page.unwrap_or(1).max(1);
    match state.storage.logs.list_page(page, LOG_PAGE_SIZE) {
        Ok(logs) => api_response::success(json!({
            "logs": logs,
            "page": page,
            "per_page": LOG_PAGE_SIZE,
        }))
        .into_response(),
        Err(e) => {
            admin_error(StatusCode::INTERNAL_SERVER_ERROR, &format!("Failed to list logs: {e}"))
                .into_response()
        }
    }
}

// DELETE /api/logs
pub async fn clear_logs(State(state): State<AppState>) -> Response {
    match state.storage.logs.truncate() {
        Ok(()) => api_response::success(json!({ "cleared": true })).into_response(),
        Err(e) => {
            admin_error(StatusCode::INTERNAL_SERVER_ERROR, &format!("Failed to clear logs: {e}"))
                .into_response()
        }
    }
}

// POST /api/auth-key/rotate
pub async fn rotate_auth_key(State(state): State<AppState>) -> Response {
    match state.storage.config.rotate_auth_key() {
        Ok(auth_key) => api_response::success(json!({ "auth_key": auth_key })).into_response(),
        Err(e) => admin_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to rotate auth key: {e}"),
        )
        .into_response(),
    }
}

// POST /api/test-mode/start
pub async fn start_test_mode(State(state): State<AppState>) -> Json<Value> {
    state.test_session.start();
    api_response::success(json!({
        "message": "Test mode activated",
        "test_active": true,
    }))
}

// POST /api/test-mode/stop
pub async fn stop_test_mode(State(state): State<AppState>) -> Json<Value> {
    state.test_session.stop();
    api_response::success(json!({
        "message": "Test mode deactivated",
        "test_active": false,
    }))
}

// GET /api/test-mode
pub async fn get_test_mode(State(state): State<AppState>) -> Json<Value> {
    let status = state.test_session.status();
    api_response::success(json!({
        "test_active": status.active,
        "results": status.captured,
    }))
}

// GET /api/triggers
pub async fn list_triggers(State(state): State<AppState>) -> Response {
    let mut triggers = serde_json::Map::new();
    for kind in TriggerKind::ALL {
        match state.storage.config.trigger(kind) {
            Ok(config) => {
                triggers.insert(kind.event_name().to_string(), json!(config));
            }
            Err(e) => {
                return admin_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("Failed to load trigger config: {e}"),
                )
                .into_response();
            }
        }
    }
    api_response::success(Value::Object(triggers)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct TriggerUpdate {
    pub enabled: Option<bool>,
    pub url: Option<String>,
    /// JSON object text; anything else fails the call.
    pub headers: Option<String>,
}

// PUT /api/triggers/{kind}
pub async fn update_trigger(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(update): Json<TriggerUpdate>,
) -> Response {
    let Ok(kind) = kind.parse::<TriggerKind>() else {
        return admin_error(StatusCode::BAD_REQUEST, &format!("Unknown trigger: {kind}"))
            .into_response();
    };

    if let Some(enabled) = update.enabled {
        if let Err(e) = state.storage.config.set_trigger_enabled(kind, enabled) {
            return admin_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to update trigger: {e}"),
            )
            .into_response();
        }
    }

    if let Some(url) = &update.url {
        if let Err(e) = state.storage.config.set_trigger_url(kind, url) {
            return admin_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to update trigger: {e}"),
            )
            .into_response();
        }
    }

    if let Some(headers) = &update.headers {
        if let Err(e) = state.storage.config.set_trigger_headers(kind, headers) {
            return admin_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response();
        }
    }

    match state.storage.config.trigger(kind) {
        Ok(config) => api_response::success(json!(config)).into_response(),
        Err(e) => admin_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to load trigger config: {e}"),
        )
        .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentStore;
    use crate::gateway::{RequestPipeline, TestSession};
    use crate::storage::Storage;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn setup() -> (AppState, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let storage = Arc::new(Storage::new(temp_dir.path().join("test.db")).unwrap());
        let content = Arc::new(MemoryContentStore::new("https://site.test"));
        let test_session = TestSession::new();
        let pipeline = Arc::new(RequestPipeline::new(
            storage.clone(),
            content,
            test_session.clone(),
        ));
        (AppState::new(storage, pipeline, test_session), temp_dir)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rotate_auth_key_changes_key() {
        let (state, _temp_dir) = setup();
        let before = state.storage.config.auth_key().unwrap();

        let response = rotate_auth_key(State(state.clone())).await;
        let body = body_json(response).await;

        let rotated = body["data"]["auth_key"].as_str().unwrap().to_string();
        assert_ne!(rotated, before);
        assert_eq!(state.storage.config.auth_key().unwrap(), rotated);
    }

    #[tokio::test]
    async fn test_clear_logs_empties_listing() {
        let (state, _temp_dir) = setup();

        for _ in 0..3 {
            state
                .storage
                .logs
                .append(crate::models::NewLogEntry::incoming(
                    "/webhook/v1/upload",
                    "POST",
                    "127.0.0.1",
                ))
                .unwrap();
        }

        let response = get_logs(State(state.clone()), Query(LogsQuery { page: None })).await;
        let body = body_json(response).await;
        assert_eq!(body["data"]["logs"].as_array().unwrap().len(), 3);

        clear_logs(State(state.clone())).await;

        let response = get_logs(State(state.clone()), Query(LogsQuery { page: None })).await;
        let body = body_json(response).await;
        assert!(body["data"]["logs"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_test_mode_cycle() {
        let (state, _temp_dir) = setup();

        let Json(body) = start_test_mode(State(state.clone())).await;
        assert_eq!(body["data"]["test_active"], true);
        assert!(state.test_session.is_active());

        let Json(body) = get_test_mode(State(state.clone())).await;
        assert_eq!(body["data"]["test_active"], true);
        assert_eq!(body["data"]["results"], Value::Null);

        let Json(body) = stop_test_mode(State(state.clone())).await;
        assert_eq!(body["data"]["test_active"], false);
        assert!(!state.test_session.is_active());
    }

    #[tokio::test]
    async fn test_update_trigger_validates_kind_and_headers() {
        let (state, _temp_dir) = setup();

        let response = update_trigger(
            State(state.clone()),
            Path("explode".to_string()),
            Json(TriggerUpdate {
                enabled: Some(true),
                url: None,
                headers: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = update_trigger(
            State(state.clone()),
            Path("new_comment".to_string()),
            Json(TriggerUpdate {
                enabled: None,
                url: None,
                headers: Some("not an object".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = update_trigger(
            State(state.clone()),
            Path("new_comment".to_string()),
            Json(TriggerUpdate {
                enabled: Some(true),
                url: Some("https://example.com/hook".to_string()),
                headers: Some(r#"{"X-Token": "t"}"#.to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["enabled"], true);
        assert_eq!(body["data"]["target_url"], "https://example.com/hook");
        assert_eq!(body["data"]["custom_headers"]["X-Token"], "t");
    }
}
