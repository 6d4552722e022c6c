use std::path::PathBuf;

use anyhow::{Context, Result};

/// Resolve the database path: `GATEWAY_DB_PATH` when set, otherwise a
/// per-user data directory. The parent directory is created on the way.
pub fn ensure_database_path() -> Result<PathBuf> {
    let path = match std::env::var("GATEWAY_DB_PATH") {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => dirs::data_dir()
            .context("Could not determine a data directory")?
            .join("webhook-gateway")
            .join("gateway.db"),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    Ok(path)
}
