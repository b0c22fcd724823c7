use crate::error::StorageError;
use crate::models::{RecurringItem, Transaction};
use crate::store::RecordStore;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Key holding the transaction list
pub const TRANSACTIONS_KEY: &str = "transactions";
/// Key holding the recurring-item list
pub const RECURRING_KEY: &str = "recurringItems";

/// String key-value persistence, one JSON document per key.
pub trait KeyValueStore {
    /// `None` when the key was never written
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Write several keys. Implementations that can should make this atomic.
    fn save_all(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.save(key, value)?;
        }
        Ok(())
    }
}

// ============================================================================
// SQLITE
// ============================================================================

/// SQLite-backed store: one `kv_store` table, WAL journal.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }
}

pub fn setup_database(conn: &Connection) -> Result<(), StorageError> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

fn upsert(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, Utc::now().to_rfc3339()],
    )
}

impl KeyValueStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        upsert(&self.conn, key, value)?;
        Ok(())
    }

    fn save_all(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            upsert(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// HashMap-backed store for tests and throwaway sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// RECORD STORE <-> KEY-VALUE
// ============================================================================

/// Load both collections. A missing key (or a stored `null`) is an empty list.
pub fn load_records<S: KeyValueStore + ?Sized>(store: &S) -> Result<RecordStore, StorageError> {
    let transactions: Vec<Transaction> = load_list(store, TRANSACTIONS_KEY)?;
    let recurring: Vec<RecurringItem> = load_list(store, RECURRING_KEY)?;

    tracing::info!(
        transactions = transactions.len(),
        recurring = recurring.len(),
        "loaded records"
    );

    Ok(RecordStore::from_parts(transactions, recurring))
}

/// Persist both collections in full
pub fn save_records<S: KeyValueStore + ?Sized>(
    store: &mut S,
    records: &RecordStore,
) -> Result<(), StorageError> {
    let entries = [
        (TRANSACTIONS_KEY, to_json(TRANSACTIONS_KEY, records.transactions())?),
        (RECURRING_KEY, to_json(RECURRING_KEY, records.recurring())?),
    ];
    store.save_all(&entries)?;

    tracing::debug!(
        transactions = records.transactions().len(),
        recurring = records.recurring().len(),
        "persisted records"
    );
    Ok(())
}

fn load_list<T, S>(store: &S, key: &str) -> Result<Vec<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.load(key)? {
        Some(raw) => {
            let list: Option<Vec<T>> =
                serde_json::from_str(&raw).map_err(|source| StorageError::Json {
                    key: key.to_string(),
                    source,
                })?;
            Ok(list.unwrap_or_default())
        }
        None => Ok(Vec::new()),
    }
}

fn to_json<T: Serialize>(key: &str, list: &[T]) -> Result<String, StorageError> {
    serde_json::to_string(list).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })
}
