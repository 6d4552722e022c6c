use std::sync::Arc;

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::models::{LogEntry, NewLogEntry};

const LOG_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("webhook_logs");

/// Fixed page size for the admin log listing.
pub const LOG_PAGE_SIZE: usize = 20;

/// Append-only store of request/response and delivery records. Entries are
/// keyed by a monotonic id; ranking is by timestamp, newest first.
#[derive(Clone)]
pub struct LogStorage {
    db: Arc<Database>,
}

impl LogStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(LOG_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert one record, assigning the next monotonic id and the current
    /// timestamp. Entries are never mutated after this point.
    pub fn append(&self, entry: NewLogEntry) -> Result<u64> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut table = write_txn.open_table(LOG_TABLE)?;
            let id = table.last()?.map(|(key, _)| key.value() + 1).unwrap_or(1);

            let record = LogEntry {
                id,
                time: chrono::Utc::now().timestamp(),
                endpoint: entry.endpoint,
                method: entry.method,
                headers: entry.headers,
                params: entry.params,
                files: entry.files,
                response: entry.response,
                status_code: entry.status_code,
                source_address: entry.source_address,
                direction: entry.direction,
            };

            let serialized = serde_json::to_vec(&record)?;
            table.insert(id, serialized.as_slice())?;
            id
        };
        write_txn.commit()?;

        Ok(id)
    }

    /// Most recent `limit` entries, newest first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.list_page(1, limit)
    }

    /// One page of entries, newest first. Pages are 1-based.
    pub fn list_page(&self, page: usize, per_page: usize) -> Result<Vec<LogEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LOG_TABLE)?;

        let skip = page.saturating_sub(1) * per_page;
        let mut entries = Vec::new();
        for item in table.iter()?.rev().skip(skip).take(per_page) {
            let (_, value) = item?;
            let entry: LogEntry = serde_json::from_slice(value.value())?;
            entries.push(entry);
        }

        // Ids are assigned in insertion order; rank by timestamp with the id
        // as tiebreaker so concurrent inserts read back newest first.
        entries.sort_by(|a, b| b.time.cmp(&a.time).then(b.id.cmp(&a.id)));

        Ok(entries)
    }

    /// Delete all entries. Irreversible.
    pub fn truncate(&self) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        write_txn.delete_table(LOG_TABLE)?;
        write_txn.open_table(LOG_TABLE)?;
        write_txn.commit()?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LOG_TABLE)?;
        Ok(table.len()? as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use tempfile::tempdir;

    fn setup() -> (LogStorage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        let storage = LogStorage::new(db).unwrap();
        (storage, temp_dir)
    }

    fn sample(endpoint: &str) -> NewLogEntry {
        NewLogEntry::incoming(endpoint, "POST", "127.0.0.1")
    }

    #[test]
    fn test_append_assigns_monotonic_ids() {
        let (storage, _temp_dir) = setup();

        let first = storage.append(sample("/webhook/v1/upload")).unwrap();
        let second = storage.append(sample("/webhook/v1/create-post")).unwrap();
        let third = storage.append(sample("/webhook/v1/get-post")).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(third, 3);
        assert_eq!(storage.count().unwrap(), 3);
    }

    #[test]
    fn test_list_recent_newest_first() {
        let (storage, _temp_dir) = setup();

        for n in 0..5 {
            storage.append(sample(&format!("/webhook/v1/{n}"))).unwrap();
        }

        let recent = storage.list_recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].endpoint, "/webhook/v1/4");
        assert_eq!(recent[1].endpoint, "/webhook/v1/3");
        assert_eq!(recent[2].endpoint, "/webhook/v1/2");
    }

    #[test]
    fn test_list_page_walks_backwards() {
        let (storage, _temp_dir) = setup();

        for n in 0..7 {
            storage.append(sample(&format!("/webhook/v1/{n}"))).unwrap();
        }

        let page1 = storage.list_page(1, 3).unwrap();
        let page2 = storage.list_page(2, 3).unwrap();
        let page3 = storage.list_page(3, 3).unwrap();

        assert_eq!(page1.iter().map(|e| e.id).collect::<Vec<_>>(), vec![7, 6, 5]);
        assert_eq!(page2.iter().map(|e| e.id).collect::<Vec<_>>(), vec![4, 3, 2]);
        assert_eq!(page3.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_directions_persist() {
        let (storage, _temp_dir) = setup();

        storage.append(sample("/webhook/v1/upload")).unwrap();
        storage
            .append(NewLogEntry::outgoing("https://example.com/hook"))
            .unwrap();

        let recent = storage.list_recent(2).unwrap();
        assert_eq!(recent[0].direction, Direction::Outgoing);
        assert_eq!(recent[0].source_address, "");
        assert_eq!(recent[1].direction, Direction::Incoming);
    }

    #[test]
    fn test_truncate_is_irreversible() {
        let (storage, _temp_dir) = setup();

        for _ in 0..4 {
            storage.append(sample("/webhook/v1/upload")).unwrap();
        }
        assert_eq!(storage.count().unwrap(), 4);

        storage.truncate().unwrap();
        assert_eq!(storage.count().unwrap(), 0);
        assert!(storage.list_recent(20).unwrap().is_empty());

        // Ids restart after truncation; nothing of the old log survives.
        let id = storage.append(sample("/webhook/v1/upload")).unwrap();
        assert_eq!(id, 1);
    }
}
