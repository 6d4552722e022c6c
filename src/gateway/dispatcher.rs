use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::content::ContentEvents;
use crate::gateway::sender::WebhookSender;
use crate::models::{Comment, Item, TriggerKind};
use crate::storage::ConfigStorage;

/// Decides, per domain event, whether the matching trigger fires and hands
/// the payload to the Webhook Sender. Trigger configuration is read on every
/// event, so admin changes take effect immediately.
pub struct TriggerDispatcher {
    config: Arc<ConfigStorage>,
    sender: WebhookSender,
}

impl TriggerDispatcher {
    pub fn new(config: Arc<ConfigStorage>, sender: WebhookSender) -> Self {
        Self { config, sender }
    }

    pub async fn on_post_created(&self, item: &Item, is_update: bool) -> bool {
        if !should_fire_created(item, is_update) {
            return false;
        }
        self.fire(TriggerKind::PostCreated, created_payload(item)).await
    }

    pub async fn on_post_published(&self, new_status: &str, old_status: &str, item: &Item) -> bool {
        if !should_fire_published(new_status, old_status, item) {
            return false;
        }
        self.fire(
            TriggerKind::PostPublished,
            published_payload(item, old_status, new_status),
        )
        .await
    }

    pub async fn on_new_comment(&self, comment: &Comment) -> bool {
        self.fire(TriggerKind::NewComment, comment_payload(comment)).await
    }

    async fn fire(&self, kind: TriggerKind, payload: Value) -> bool {
        let trigger = match self.config.trigger(kind) {
            Ok(trigger) => trigger,
            Err(e) => {
                tracing::error!("Failed to load {kind} trigger config: {e}");
                return false;
            }
        };

        if !trigger.can_fire() {
            return false;
        }

        let delivered = self
            .sender
            .send(&trigger.target_url, &payload, &trigger.custom_headers)
            .await;

        if !delivered {
            tracing::warn!("Webhook delivery for {kind} to {} failed", trigger.target_url);
        }

        delivered
    }
}

/// Fires only for first saves of real posts, not re-saves or save-pipeline
/// artifacts.
fn should_fire_created(item: &Item, is_update: bool) -> bool {
    !is_update && !item.is_artifact()
}

/// Fires only on the transition into "publish"; re-saving an already
/// published item stays silent.
fn should_fire_published(new_status: &str, old_status: &str, item: &Item) -> bool {
    new_status == "publish" && old_status != "publish" && !item.is_artifact()
}

fn created_payload(item: &Item) -> Value {
    serde_json::json!({
        "event": TriggerKind::PostCreated.event_name(),
        "post_id": item.id,
        "title": item.title,
        "status": item.status,
        "author": item.author,
    })
}

fn published_payload(item: &Item, old_status: &str, new_status: &str) -> Value {
    serde_json::json!({
        "event": TriggerKind::PostPublished.event_name(),
        "post_id": item.id,
        "title": item.title,
        "url": item.url,
        "old_status": old_status,
        "new_status": new_status,
    })
}

fn comment_payload(comment: &Comment) -> Value {
    serde_json::json!({
        "event": TriggerKind::NewComment.event_name(),
        "comment_id": comment.id,
        "post_id": comment.item_id,
        "author": comment.author_name,
        "content": comment.content,
    })
}

#[async_trait]
impl ContentEvents for TriggerDispatcher {
    async fn post_created(&self, item: &Item, is_update: bool) {
        self.on_post_created(item, is_update).await;
    }

    async fn post_published(&self, new_status: &str, old_status: &str, item: &Item) {
        self.on_post_published(new_status, old_status, item).await;
    }

    async fn new_comment(&self, comment: &Comment) {
        self.on_new_comment(comment).await;
    }
}
