use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three domain events that can fire an outbound webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    PostCreated,
    PostPublished,
    NewComment,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 3] = [
        TriggerKind::PostCreated,
        TriggerKind::PostPublished,
        TriggerKind::NewComment,
    ];

    /// The `event` field carried in outbound payloads.
    pub fn event_name(&self) -> &'static str {
        match self {
            TriggerKind::PostCreated => "post_created",
            TriggerKind::PostPublished => "post_published",
            TriggerKind::NewComment => "new_comment",
        }
    }
}

impl FromStr for TriggerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post_created" => Ok(TriggerKind::PostCreated),
            "post_published" => Ok(TriggerKind::PostPublished),
            "new_comment" => Ok(TriggerKind::NewComment),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Per-event outbound webhook configuration. An empty target URL means
/// "do not fire" even when enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub enabled: bool,
    pub target_url: String,
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
}

impl TriggerConfig {
    /// A trigger fires only when enabled with a non-empty target.
    pub fn can_fire(&self) -> bool {
        self.enabled && !self.target_url.is_empty()
    }
}
