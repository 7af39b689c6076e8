//! Local durable storage
//!
//! Namespaced key-value strings holding the cart and the offline order
//! fallback list. Values are JSON produced by the caller.

mod local;

pub use local::{MemoryLocalStorage, RedbLocalStorage};

use shared::error::ErrorCode;
use thiserror::Error;

/// Key holding the serialized cart
pub const CART_KEY: &str = "lqy_carrito";

/// Key holding orders saved while the order store was unreachable
pub const FALLBACK_ORDERS_KEY: &str = "lqy_orders";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::StorageError
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key-value string store that survives restarts
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;
}
