//! Registry persistence.
//!
//! The lorebook persists its full state after every mutation, so stores only
//! need a "replace everything" write and a "read everything" load.

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::{LoreError, LoreResult};
use crate::lorefile::LoreFile;
use crate::record::LoreRecord;

/// Trait for lorebook storage.
pub trait EntryStore: Send + Sync {
    /// Load every persisted record, in stored order.
    fn load_all(&self) -> LoreResult<Vec<LoreRecord>>;

    /// Replace the stored state with `records`.
    fn save_all(&self, records: &[LoreRecord]) -> LoreResult<()>;
}

/// Open the store matching a storage path.
///
/// `None` keeps state in memory; `.db`, `.sqlite` and `.sqlite3` open a
/// SQLite database; anything else is treated as a lorefile.
pub fn open_store(path: Option<&Path>) -> LoreResult<Arc<dyn EntryStore>> {
    let Some(path) = path else {
        return Ok(Arc::new(MemoryEntryStore::new()));
    };

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("db" | "sqlite" | "sqlite3") => Ok(Arc::new(SqliteEntryStore::new(path)?)),
        _ => Ok(Arc::new(FileEntryStore::new(path)?)),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> LoreResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| LoreError::internal("entry store lock poisoned"))
}

/// Volatile store; state lives as long as the process.
#[derive(Default)]
pub struct MemoryEntryStore {
    records: Mutex<Vec<LoreRecord>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with records.
    pub fn with_records(records: Vec<LoreRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl EntryStore for MemoryEntryStore {
    fn load_all(&self) -> LoreResult<Vec<LoreRecord>> {
        Ok(lock(&self.records)?.clone())
    }

    fn save_all(&self, records: &[LoreRecord]) -> LoreResult<()> {
        *lock(&self.records)? = records.to_vec();
        Ok(())
    }
}

/// Store backed by a single JSON or YAML lorefile.
pub struct FileEntryStore {
    path: PathBuf,
}

impl FileEntryStore {
    /// Create a store at `path`. The extension must be a lorefile format.
    pub fn new(path: impl Into<PathBuf>) -> LoreResult<Self> {
        let path = path.into();
        crate::lorefile::LoreFormat::from_path(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntryStore for FileEntryStore {
    fn load_all(&self) -> LoreResult<Vec<LoreRecord>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No stored lorebook yet");
            return Ok(Vec::new());
        }

        let records = LoreFile::load(&self.path)?
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<LoreRecord>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Skipping malformed stored entry");
                    None
                }
            })
            .collect();
        Ok(records)
    }

    fn save_all(&self, records: &[LoreRecord]) -> LoreResult<()> {
        LoreFile::save(&self.path, records)
    }
}

/// SQLite-backed store, one row per entry.
pub struct SqliteEntryStore {
    conn: Mutex<Connection>,
}

impl SqliteEntryStore {
    /// Create a new store at the given path
    pub fn new(path: impl AsRef<Path>) -> LoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> LoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> LoreResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS lore_entries (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                template TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                priority INTEGER NOT NULL,
                scope TEXT NOT NULL,
                keywords TEXT NOT NULL,
                probability REAL NOT NULL,
                schedule TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                duration INTEGER NOT NULL DEFAULT 0,
                times INTEGER NOT NULL DEFAULT 0
            );
        "#,
        )?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> LoreResult<LoreRecord> {
        let template: String = row.get(0)?;
        let enabled: i32 = row.get(2)?;
        let scope: String = row.get(4)?;
        let keywords: String = row.get(5)?;
        let duration: i64 = row.get(9)?;

        Ok(LoreRecord {
            template: crate::template::Template::parse(&template)?,
            name: row.get(1)?,
            enabled: enabled != 0,
            priority: row.get(3)?,
            scope: serde_json::from_str(&scope)?,
            keywords: serde_json::from_str(&keywords)?,
            probability: row.get(6)?,
            schedule: row.get(7)?,
            content: row.get(8)?,
            duration: u64::try_from(duration).unwrap_or(0),
            times: row.get(10)?,
        })
    }
}

impl EntryStore for SqliteEntryStore {
    fn load_all(&self) -> LoreResult<Vec<LoreRecord>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"SELECT template, name, enabled, priority, scope, keywords,
                      probability, schedule, content, duration, times
               FROM lore_entries ORDER BY position"#,
        )?;

        let results = stmt.query_map([], |row| Ok(Self::row_to_record(row)))?;

        results
            .map(|r| r.map_err(LoreError::from).and_then(|inner| inner))
            .collect()
    }

    fn save_all(&self, records: &[LoreRecord]) -> LoreResult<()> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM lore_entries", [])?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO lore_entries
                   (position, template, name, enabled, priority, scope, keywords,
                    probability, schedule, content, duration, times)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
            )?;
            for (position, record) in records.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    record.template.to_string(),
                    record.name,
                    record.enabled as i32,
                    record.priority,
                    serde_json::to_string(&record.scope)?,
                    serde_json::to_string(&record.keywords)?,
                    record.probability,
                    record.schedule,
                    record.content,
                    i64::try_from(record.duration).unwrap_or(i64::MAX),
                    record.times,
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = records.len(), "Saved lorebook to sqlite");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;

    fn record(name: &str, priority: i32) -> LoreRecord {
        LoreRecord {
            template: Template::Schedule,
            name: name.to_string(),
            enabled: false,
            priority,
            scope: vec!["g1".to_string(), "admin".to_string()],
            keywords: vec!["hel+o".to_string()],
            probability: 0.25,
            schedule: "30 6 * * 1".to_string(),
            content: "line one\nline two".to_string(),
            duration: 3600,
            times: 3,
        }
    }

    #[test]
    fn test_memory_store_replaces_state() {
        let store = MemoryEntryStore::new();
        store.save_all(&[record("a", 1), record("b", 2)]).unwrap();
        store.save_all(&[record("c", 3)]).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "c");
    }

    #[test]
    fn test_sqlite_store_preserves_order_and_fields() {
        let store = SqliteEntryStore::in_memory().unwrap();
        let records = vec![record("zeta", 9), record("alpha", 1)];
        store.save_all(&records).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, records);

        store.save_all(&records[1..]).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_sqlite_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lore.db");
        {
            let store = SqliteEntryStore::new(&path).unwrap();
            store.save_all(&[record("a", 1)]).unwrap();
        }
        let store = SqliteEntryStore::new(&path).unwrap();
        assert_eq!(store.load_all().unwrap()[0].name, "a");
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEntryStore::new(dir.path().join("book.json")).unwrap();
        assert!(store.load_all().unwrap().is_empty());

        store.save_all(&[record("a", 1)]).unwrap();
        assert_eq!(store.load_all().unwrap(), vec![record("a", 1)]);
    }

    #[test]
    fn test_file_store_rejects_unknown_extension() {
        assert!(FileEntryStore::new("book.txt").is_err());
    }

    #[test]
    fn test_open_store_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(Some(&dir.path().join("lore.sqlite"))).unwrap();
        store.save_all(&[record("a", 1)]).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);

        let store = open_store(None).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }
}
