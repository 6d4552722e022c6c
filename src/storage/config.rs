use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use redb::{Database, ReadableDatabase, TableDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{TriggerConfig, TriggerKind};

const CONFIG_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("gateway_config");
const CONFIG_KEY: &str = "gateway";

/// Persistent gateway configuration: the shared secret and the per-event
/// outbound trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub auth_key: String,
    #[serde(default)]
    pub post_created: TriggerConfig,
    #[serde(default)]
    pub post_published: TriggerConfig,
    #[serde(default)]
    pub new_comment: TriggerConfig,
}

impl GatewayConfig {
    /// Fresh configuration with a newly generated auth key and all triggers
    /// disabled.
    pub fn generate() -> Self {
        Self {
            auth_key: generate_auth_key(),
            post_created: TriggerConfig::default(),
            post_published: TriggerConfig::default(),
            new_comment: TriggerConfig::default(),
        }
    }

    pub fn trigger(&self, kind: TriggerKind) -> &TriggerConfig {
        match kind {
            TriggerKind::PostCreated => &self.post_created,
            TriggerKind::PostPublished => &self.post_published,
            TriggerKind::NewComment => &self.new_comment,
        }
    }

    pub fn trigger_mut(&mut self, kind: TriggerKind) -> &mut TriggerConfig {
        match kind {
            TriggerKind::PostCreated => &mut self.post_created,
            TriggerKind::PostPublished => &mut self.post_published,
            TriggerKind::NewComment => &mut self.new_comment,
        }
    }
}

/// Generate a fresh shared secret.
pub fn generate_auth_key() -> String {
    format!("whk_{}", uuid::Uuid::new_v4().simple())
}

#[derive(Clone)]
pub struct ConfigStorage {
    db: Arc<Database>,
}

impl ConfigStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(CONFIG_TABLE)?;
        write_txn.commit()?;

        let storage = Self { db };

        // Auto-generate the auth key on first boot.
        if storage.get_config()?.is_none() {
            storage.update_config(&GatewayConfig::generate())?;
        }

        Ok(storage)
    }

    pub fn get_config(&self) -> Result<Option<GatewayConfig>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONFIG_TABLE)?;

        if let Some(data) = table.get(CONFIG_KEY)? {
            let config: GatewayConfig = serde_json::from_slice(data.value())?;
            Ok(Some(config))
        } else {
            Ok(None)
        }
    }

    pub fn update_config(&self, config: &GatewayConfig) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CONFIG_TABLE)?;
            let serialized = serde_json::to_vec(config)?;
            table.insert(CONFIG_KEY, serialized.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn config(&self) -> Result<GatewayConfig> {
        Ok(self.get_config()?.unwrap_or_else(GatewayConfig::generate))
    }

    /// Current shared secret.
    pub fn auth_key(&self) -> Result<String> {
        Ok(self.config()?.auth_key)
    }

    /// Replace the shared secret with a newly generated one and return it.
    /// The old key stops working immediately.
    pub fn rotate_auth_key(&self) -> Result<String> {
        let mut config = self.config()?;
        config.auth_key = generate_auth_key();
        self.update_config(&config)?;
        Ok(config.auth_key)
    }

    pub fn trigger(&self, kind: TriggerKind) -> Result<TriggerConfig> {
        Ok(self.config()?.trigger(kind).clone())
    }

    pub fn set_trigger_enabled(&self, kind: TriggerKind, enabled: bool) -> Result<TriggerConfig> {
        let mut config = self.config()?;
        config.trigger_mut(kind).enabled = enabled;
        self.update_config(&config)?;
        Ok(config.trigger(kind).clone())
    }

    pub fn set_trigger_url(&self, kind: TriggerKind, url: &str) -> Result<TriggerConfig> {
        let mut config = self.config()?;
        config.trigger_mut(kind).target_url = url.to_string();
        self.update_config(&config)?;
        Ok(config.trigger(kind).clone())
    }

    /// Set a trigger's custom headers from JSON object text. Anything that
    /// is not an object of string values is rejected.
    pub fn set_trigger_headers(&self, kind: TriggerKind, text: &str) -> Result<TriggerConfig> {
        let headers = parse_header_object(text)?;

        let mut config = self.config()?;
        config.trigger_mut(kind).custom_headers = headers;
        self.update_config(&config)?;
        Ok(config.trigger(kind).clone())
    }
}

fn parse_header_object(text: &str) -> Result<HashMap<String, String>> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| anyhow::anyhow!("Invalid headers JSON: {e}"))?;

    let object = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("Headers must be a JSON object"))?;

    let mut headers = HashMap::new();
    for (name, value) in object {
        let value = value
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Header {name} must be a string"))?;
        headers.insert(name.clone(), value.to_string());
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (ConfigStorage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        let storage = ConfigStorage::new(db).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_auth_key_generated_on_first_open() {
        let (storage, _temp_dir) = setup();

        let key = storage.auth_key().unwrap();
        assert!(key.starts_with("whk_"));
        assert_eq!(key.len(), "whk_".len() + 32);
    }

    #[test]
    fn test_rotate_auth_key_replaces_key() {
        let (storage, _temp_dir) = setup();

        let before = storage.auth_key().unwrap();
        let rotated = storage.rotate_auth_key().unwrap();
        let after = storage.auth_key().unwrap();

        assert_ne!(before, rotated);
        assert_eq!(rotated, after);
    }

    #[test]
    fn test_trigger_settings_round_trip() {
        let (storage, _temp_dir) = setup();

        let config = storage.trigger(TriggerKind::PostPublished).unwrap();
        assert!(!config.enabled);
        assert!(config.target_url.is_empty());

        storage
            .set_trigger_enabled(TriggerKind::PostPublished, true)
            .unwrap();
        storage
            .set_trigger_url(TriggerKind::PostPublished, "https://example.com/hook")
            .unwrap();
        let updated = storage
            .set_trigger_headers(TriggerKind::PostPublished, r#"{"X-Token": "abc"}"#)
            .unwrap();

        assert!(updated.enabled);
        assert_eq!(updated.target_url, "https://example.com/hook");
        assert_eq!(updated.custom_headers.get("X-Token").unwrap(), "abc");

        // Other kinds are untouched.
        assert!(!storage.trigger(TriggerKind::NewComment).unwrap().enabled);
    }

    #[test]
    fn test_trigger_headers_must_be_json_object() {
        let (storage, _temp_dir) = setup();

        assert!(storage
            .set_trigger_headers(TriggerKind::NewComment, "not json")
            .is_err());
        assert!(storage
            .set_trigger_headers(TriggerKind::NewComment, r#"["a","b"]"#)
            .is_err());
        assert!(storage
            .set_trigger_headers(TriggerKind::NewComment, r#"{"X-N": 5}"#)
            .is_err());
        assert!(storage
            .set_trigger_headers(TriggerKind::NewComment, "{}")
            .is_ok());
    }

    #[test]
    fn test_config_persists_across_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let key = {
            let db = Arc::new(Database::create(&db_path).unwrap());
            let storage = ConfigStorage::new(db).unwrap();
            storage
                .set_trigger_url(TriggerKind::PostCreated, "https://example.com/a")
                .unwrap();
            storage.auth_key().unwrap()
        };

        {
            let db = Arc::new(Database::open(&db_path).unwrap());
            let storage = ConfigStorage::new(db).unwrap();
            assert_eq!(storage.auth_key().unwrap(), key);
            assert_eq!(
                storage.trigger(TriggerKind::PostCreated).unwrap().target_url,
                "https://example.com/a"
            );
        }
    }
}
