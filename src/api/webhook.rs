use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, FromRequest, Multipart, Path, Request, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::api::state::AppState;
use crate::gateway::pipeline::InboundRequest;
use crate::models::UploadedFile;

/// Bodies larger than this are rejected by the transport layer.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// POST /webhook/v1/{action}
///
/// Accepts JSON bodies or multipart form data (for uploads). Parsing happens
/// here; everything after the raw transport is the pipeline's job, including
/// logging bodies that failed to parse.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Path(action): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let endpoint = format!("/webhook/v1/{action}");
    let method = request.method().to_string();
    let headers = headers_to_json(request.headers());
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let mut inbound = InboundRequest {
        action,
        endpoint,
        method,
        source_address: addr.ip().to_string(),
        headers,
        params: Value::Object(Default::default()),
        files: Vec::new(),
    };

    let parsed = if content_type.starts_with("multipart/form-data") {
        parse_multipart(request, &state).await
    } else {
        parse_json_body(request).await
    };

    let response = match parsed {
        Ok((params, files)) => {
            inbound.params = params;
            inbound.files = files;
            state.pipeline.handle(inbound).await
        }
        Err(failure) => state
            .pipeline
            .handle_malformed(inbound, failure.raw, failure.errors),
    };

    (response.status, Json(response.body)).into_response()
}

struct ParseFailure {
    raw: String,
    errors: Vec<String>,
}

async fn parse_json_body(request: Request) -> Result<(Value, Vec<UploadedFile>), ParseFailure> {
    let bytes = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return Err(ParseFailure {
                raw: String::new(),
                errors: vec![e.to_string()],
            });
        }
    };

    if bytes.is_empty() {
        return Ok((Value::Object(Default::default()), Vec::new()));
    }

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value @ Value::Object(_)) => Ok((value, Vec::new())),
        Ok(_) => Err(ParseFailure {
            raw: String::from_utf8_lossy(&bytes).into_owned(),
            errors: vec!["body must be a JSON object".to_string()],
        }),
        Err(e) => Err(ParseFailure {
            raw: String::from_utf8_lossy(&bytes).into_owned(),
            errors: vec![e.to_string()],
        }),
    }
}

/// Text fields become params, file fields become uploads.
async fn parse_multipart(
    request: Request,
    state: &AppState,
) -> Result<(Value, Vec<UploadedFile>), ParseFailure> {
    let mut multipart = match Multipart::from_request(request, state).await {
        Ok(multipart) => multipart,
        Err(e) => {
            return Err(ParseFailure {
                raw: String::new(),
                errors: vec![e.to_string()],
            });
        }
    };

    let mut params = serde_json::Map::new();
    let mut files = Vec::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or("").to_string();

                if let Some(file_name) = field.file_name().map(str::to_string) {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    match field.bytes().await {
                        Ok(data) => files.push(UploadedFile {
                            field: name,
                            file_name,
                            content_type,
                            data: data.to_vec(),
                        }),
                        Err(e) => {
                            return Err(ParseFailure {
                                raw: String::new(),
                                errors: vec![e.to_string()],
                            });
                        }
                    }
                } else {
                    match field.text().await {
                        Ok(text) => {
                            params.insert(name, Value::String(text));
                        }
                        Err(e) => {
                            return Err(ParseFailure {
                                raw: String::new(),
                                errors: vec![e.to_string()],
                            });
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return Err(ParseFailure {
                    raw: String::new(),
                    errors: vec![e.to_string()],
                });
            }
        }
    }

    Ok((Value::Object(params), files))
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
