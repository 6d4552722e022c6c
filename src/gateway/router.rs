use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::content::ContentStore;
use crate::error::GatewayError;
use crate::models::{NewItem, Taxonomy, UploadedFile};

/// MIME types accepted for direct uploads.
pub const ALLOWED_UPLOAD_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// Item statuses the gateway will pass through; anything else falls back to
/// draft.
const ALLOWED_STATUSES: [&str; 4] = ["draft", "publish", "pending", "private"];

/// The closed set of inbound actions. Adding an action means adding a
/// variant, a path mapping and a handler arm; the match below will not let
/// one go missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAction {
    Upload,
    CreatePost,
    GetPost,
}

impl WebhookAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookAction::Upload => "upload",
            WebhookAction::CreatePost => "create-post",
            WebhookAction::GetPost => "get-post",
        }
    }
}

impl FromStr for WebhookAction {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(WebhookAction::Upload),
            "create-post" => Ok(WebhookAction::CreatePost),
            "get-post" => Ok(WebhookAction::GetPost),
            _ => Err(GatewayError::InvalidAction),
        }
    }
}

/// Validates one inbound action and delegates to the Content Store. Each
/// action is stateless; there is no state carried across calls.
pub struct ActionRouter {
    content: Arc<dyn ContentStore>,
}

impl ActionRouter {
    pub fn new(content: Arc<dyn ContentStore>) -> Self {
        Self { content }
    }

    pub async fn dispatch(
        &self,
        action: WebhookAction,
        params: &Value,
        files: &[UploadedFile],
    ) -> Result<Value, GatewayError> {
        match action {
            WebhookAction::Upload => self.handle_upload(params, files).await,
            WebhookAction::CreatePost => self.create_post(params).await,
            WebhookAction::GetPost => self.get_post(params).await,
        }
    }

    async fn handle_upload(
        &self,
        params: &Value,
        files: &[UploadedFile],
    ) -> Result<Value, GatewayError> {
        if let Some(url) = param_str(params, "file_url") {
            let media = self
                .content
                .store_remote_file(url)
                .await
                .map_err(|e| GatewayError::Upstream(e.to_string()))?;
            return Ok(media_payload(&media));
        }

        let Some(file) = files.first() else {
            return Err(GatewayError::NoFile);
        };

        if !ALLOWED_UPLOAD_TYPES.contains(&file.content_type.as_str()) {
            return Err(GatewayError::InvalidFileType);
        }

        let media = self
            .content
            .store_local_file(file)
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        Ok(media_payload(&media))
    }

    async fn create_post(&self, params: &Value) -> Result<Value, GatewayError> {
        let title = require_str(params, "title")?;
        let content = require_str(params, "content")?;
        let author = param_u64(params, "author").ok_or(GatewayError::MissingField("author"))?;

        let status = param_str(params, "status")
            .filter(|s| ALLOWED_STATUSES.contains(s))
            .unwrap_or("draft")
            .to_string();

        let categories = self
            .resolve_terms(params.get("categories"), Taxonomy::Category)
            .await?;
        let tags = self.resolve_terms(params.get("tags"), Taxonomy::Tag).await?;

        let item = self
            .content
            .create_item(NewItem {
                title: title.to_string(),
                content: content.to_string(),
                author,
                status: status.clone(),
                categories,
                tags,
            })
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        // A featured image URL is side-loaded best-effort; a failure here
        // must not undo the created item.
        if let Some(url) = param_str(params, "featured_image") {
            match self.content.store_remote_file(url).await {
                Ok(media) => {
                    if let Err(e) = self.content.set_thumbnail(item.id, media.id).await {
                        tracing::warn!("Failed to attach featured image to item {}: {e}", item.id);
                    }
                }
                Err(e) => tracing::warn!("Failed to side-load featured image {url}: {e}"),
            }
        }

        if let Some(media_id) = param_u64(params, "featuredMediaId") {
            let exists = self
                .content
                .media_exists(media_id)
                .await
                .map_err(|e| GatewayError::Upstream(e.to_string()))?;
            if !exists {
                return Err(GatewayError::InvalidMedia);
            }
            self.content
                .set_thumbnail(item.id, media_id)
                .await
                .map_err(|e| GatewayError::Upstream(e.to_string()))?;
        }

        Ok(serde_json::json!({
            "postId": item.id,
            "postUrl": item.url,
            "postEditUrl": item.edit_url,
            "published": status == "publish",
        }))
    }

    async fn get_post(&self, params: &Value) -> Result<Value, GatewayError> {
        let id = param_u64(params, "postId").ok_or(GatewayError::MissingField("postId"))?;

        let item = self
            .content
            .get_item(id)
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?
            .ok_or(GatewayError::NotFound)?;

        serde_json::to_value(&item).map_err(|e| GatewayError::Internal(e.into()))
    }

    /// Terms arrive as numeric ids or free-text names; names are resolved to
    /// an existing term or created on the fly.
    async fn resolve_terms(
        &self,
        value: Option<&Value>,
        taxonomy: Taxonomy,
    ) -> Result<Vec<u64>, GatewayError> {
        let Some(Value::Array(entries)) = value else {
            return Ok(Vec::new());
        };

        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Value::Number(n) => {
                    if let Some(id) = n.as_u64() {
                        ids.push(id);
                    }
                }
                Value::String(s) if !s.is_empty() => {
                    if let Ok(id) = s.parse::<u64>() {
                        ids.push(id);
                    } else {
                        let id = self
                            .content
                            .resolve_or_create_term(s, taxonomy)
                            .await
                            .map_err(|e| GatewayError::Upstream(e.to_string()))?;
                        ids.push(id);
                    }
                }
                _ => {}
            }
        }

        Ok(ids)
    }
}

fn media_payload(media: &crate::models::MediaRef) -> Value {
    serde_json::json!({
        "mediaId": media.id,
        "mediaUrl": media.url,
        "editUrl": media.edit_url,
    })
}

fn param_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key)?.as_str().filter(|s| !s.is_empty())
}

fn require_str<'a>(params: &'a Value, key: &'static str) -> Result<&'a str, GatewayError> {
    param_str(params, key).ok_or(GatewayError::MissingField(key))
}

/// Accepts a JSON number or a numeric string, the two shapes callers send
/// ids in.
fn param_u64(params: &Value, key: &str) -> Option<u64> {
    match params.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if !s.is_empty() => s.parse().ok(),
        _ => None,
    }
}
