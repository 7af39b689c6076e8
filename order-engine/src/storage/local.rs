//! [`LocalStorage`] backends: redb file and process memory

use super::{LocalStorage, StorageResult};
use parking_lot::Mutex;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// key = namespaced key, value = JSON text
const KV_TABLE: TableDefinition<&str, &str> = TableDefinition::new("local_kv");

/// redb-backed local storage
#[derive(Clone)]
pub struct RedbLocalStorage {
    db: Arc<Database>,
}

impl RedbLocalStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::init(Database::create(path)?)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?,
        )
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KV_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl LocalStorage for RedbLocalStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV_TABLE)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV_TABLE)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Process-local storage, lost on exit
#[derive(Default, Clone)]
pub struct MemoryLocalStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryLocalStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryLocalStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_map_to_storage_code() {
        let err: crate::storage::StorageError = serde_json::from_str::<Vec<u8>>("[").unwrap_err().into();
        assert_eq!(err.code(), shared::error::ErrorCode::StorageError);
        assert!(err.code().is_retryable());
    }

    #[test]
    fn test_redb_set_get_remove() {
        let storage = RedbLocalStorage::open_in_memory().unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "[1,2]").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("[1,2]"));
        storage.set("k", "[]").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("[]"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_redb_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.redb");
        {
            let storage = RedbLocalStorage::open(&path).unwrap();
            storage.set("lqy_carrito", "[]").unwrap();
        }
        let storage = RedbLocalStorage::open(&path).unwrap();
        assert_eq!(storage.get("lqy_carrito").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_keys_are_independent() {
        let storage = MemoryLocalStorage::new();
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        storage.remove("a").unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
    }
}
