//! Order store boundary
//!
//! [`OrderBackend`] is the narrow contract the engine needs from a
//! document store: keyed create/get/put/delete, filtered queries and a
//! live change feed. [`RedbOrderStore`] is the embedded implementation.

mod feed;
mod redb_store;

pub use feed::{ChangeFeed, FeedMessage};
pub use redb_store::{RedbOrderStore, StoreAccess};

use super::error::OrderResult;
use async_trait::async_trait;
use shared::order::{Order, OrderQuery};

#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Persist a new record and return the store-assigned id.
    /// Any id already on `order` is ignored.
    async fn create(&self, order: &Order) -> OrderResult<String>;

    /// `Ok(None)` when the id does not exist
    async fn get(&self, id: &str) -> OrderResult<Option<Order>>;

    /// Overwrite an existing record. Fails with `NotFound` if it is gone.
    async fn put(&self, order: &Order) -> OrderResult<()>;

    /// Physical delete. Returns whether a record was removed.
    async fn delete(&self, id: &str) -> OrderResult<bool>;

    /// One-shot read, newest first
    async fn query(&self, query: &OrderQuery) -> OrderResult<Vec<Order>>;

    /// Open a live feed. The first message is the full result set.
    async fn subscribe(&self, query: OrderQuery) -> OrderResult<ChangeFeed>;
}
