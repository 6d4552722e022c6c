use crate::error::GatewayError;
use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// Create a success response body
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(serde_json::json!({
        "success": true,
        "data": data
    }))
}

/// Create the wire body for a gateway error
pub fn error_body(err: &GatewayError) -> Value {
    serde_json::json!({
        "success": false,
        "error": {
            "code": err.code(),
            "message": err.to_string(),
            "details": err.details()
        }
    })
}

/// Create an error response with its declared status
pub fn error(err: &GatewayError) -> (StatusCode, Json<Value>) {
    (err.status(), Json(error_body(err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let body = error_body(&GatewayError::MissingField("title"));
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "missing_field");
        assert_eq!(body["error"]["details"]["field"], "title");
    }

    #[test]
    fn test_success_shape() {
        let Json(body) = success(serde_json::json!({"postId": 7}));
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["postId"], 7);
    }
}
