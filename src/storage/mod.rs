pub mod config;
pub mod log;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use redb::Database;

pub use config::{ConfigStorage, GatewayConfig};
pub use log::LogStorage;

/// Single redb database shared by the per-domain stores.
pub struct Storage {
    db: Arc<Database>,
    pub logs: LogStorage,
    pub config: ConfigStorage,
}

impl Storage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);

        let logs = LogStorage::new(db.clone())?;
        let config = ConfigStorage::new(db.clone())?;

        Ok(Self { db, logs, config })
    }

    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
