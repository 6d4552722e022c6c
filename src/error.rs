use axum::http::StatusCode;
use serde_json::Value;

/// Closed error taxonomy for the gateway. Every variant carries its wire
/// status and a stable machine-readable code; the pipeline maps variants to
/// the `{success:false, error:{...}}` body uniformly.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Authentication required")]
    MissingCredential,

    #[error("Invalid authentication key")]
    InvalidCredential,

    #[error("Too many requests")]
    RateLimited,

    #[error("Invalid action specified")]
    InvalidAction,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("No file uploaded or URL provided")]
    NoFile,

    #[error("Unsupported file type")]
    InvalidFileType,

    #[error("Invalid media ID provided")]
    InvalidMedia,

    #[error("Post not found")]
    NotFound,

    #[error("Malformed request body")]
    InvalidPayload { errors: Vec<String> },

    #[error("Content store error: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingCredential => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidCredential => StatusCode::FORBIDDEN,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::InvalidAction
            | GatewayError::MissingField(_)
            | GatewayError::NoFile
            | GatewayError::InvalidFileType
            | GatewayError::InvalidMedia
            | GatewayError::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Upstream(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::MissingCredential => "missing_auth",
            GatewayError::InvalidCredential => "invalid_auth",
            GatewayError::RateLimited => "rate_limited",
            GatewayError::InvalidAction => "invalid_action",
            GatewayError::MissingField(_) => "missing_field",
            GatewayError::NoFile => "no_file",
            GatewayError::InvalidFileType => "invalid_type",
            GatewayError::InvalidMedia => "invalid_media",
            GatewayError::NotFound => "not_found",
            GatewayError::InvalidPayload { .. } => "invalid_payload",
            GatewayError::Upstream(_) => "upstream_error",
            GatewayError::Internal(_) => "internal_error",
        }
    }

    /// Structured payload for the `details` slot of the wire error body.
    pub fn details(&self) -> Value {
        match self {
            GatewayError::MissingField(field) => serde_json::json!({ "field": field }),
            GatewayError::InvalidPayload { errors } => serde_json::json!({ "errors": errors }),
            GatewayError::Upstream(message) => serde_json::json!({ "message": message }),
            _ => Value::Null,
        }
    }
}
