//! redb-backed order store
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `orders` | `order_id` | JSON-serialized `Order` |
//!
//! Every committed write pings a broadcast channel. Each live subscription
//! re-runs its query on a ping and diffs against what it last delivered, so
//! a lagged receiver only loses pings, never changes.

use super::feed::{ChangeFeed, FeedMessage};
use super::OrderBackend;
use crate::orders::error::{OrderError, OrderResult};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::order::{Order, OrderQuery, diff_orders};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Which writes this handle may perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreAccess {
    /// Create, update and delete
    #[default]
    Full,
    /// Create only (storefront)
    CreateOnly,
    /// No writes
    ReadOnly,
}

impl StoreAccess {
    fn can_create(self) -> bool {
        matches!(self, StoreAccess::Full | StoreAccess::CreateOnly)
    }

    fn can_modify(self) -> bool {
        self == StoreAccess::Full
    }
}

/// Order store backed by redb
#[derive(Clone)]
pub struct RedbOrderStore {
    db: Arc<Database>,
    access: StoreAccess,
    changes: broadcast::Sender<()>,
}

impl RedbOrderStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> OrderResult<Self> {
        Self::init(Database::create(path)?)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> OrderResult<Self> {
        Self::init(Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?)
    }

    fn init(db: Database) -> OrderResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
        }
        write_txn.commit()?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            db: Arc::new(db),
            access: StoreAccess::Full,
            changes,
        })
    }

    /// Another handle on the same database with restricted access.
    /// Subscribers on either handle see writes from both.
    pub fn with_access(&self, access: StoreAccess) -> Self {
        Self {
            db: self.db.clone(),
            access,
            changes: self.changes.clone(),
        }
    }

    pub fn access(&self) -> StoreAccess {
        self.access
    }

    fn read(&self, id: &str) -> OrderResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn write(&self, order: &Order) -> OrderResult<()> {
        let value = serde_json::to_vec(order)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ORDERS_TABLE)?;
            table.insert(order.id.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;
        self.notify();
        Ok(())
    }

    fn read_all(&self, query: &OrderQuery) -> OrderResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if query.matches(&order) {
                orders.push(order);
            }
        }
        Ok(query.apply(orders))
    }

    fn notify(&self) {
        // No receivers is fine
        let _ = self.changes.send(());
    }
}

#[async_trait]
impl OrderBackend for RedbOrderStore {
    async fn create(&self, order: &Order) -> OrderResult<String> {
        if !self.access.can_create() {
            return Err(OrderError::WriteRejected(
                "store handle does not allow creating orders".into(),
            ));
        }
        let mut record = order.clone();
        record.id = uuid::Uuid::new_v4().simple().to_string();
        self.write(&record)?;
        Ok(record.id)
    }

    async fn get(&self, id: &str) -> OrderResult<Option<Order>> {
        self.read(id)
    }

    async fn put(&self, order: &Order) -> OrderResult<()> {
        if !self.access.can_modify() {
            return Err(OrderError::WriteRejected(
                "store handle does not allow updating orders".into(),
            ));
        }
        if self.read(&order.id)?.is_none() {
            return Err(OrderError::NotFound(order.id.clone()));
        }
        self.write(order)
    }

    async fn delete(&self, id: &str) -> OrderResult<bool> {
        if !self.access.can_modify() {
            return Err(OrderError::WriteRejected(
                "store handle does not allow deleting orders".into(),
            ));
        }
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(ORDERS_TABLE)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        if removed {
            self.notify();
        }
        Ok(removed)
    }

    async fn query(&self, query: &OrderQuery) -> OrderResult<Vec<Order>> {
        self.read_all(query)
    }

    async fn subscribe(&self, query: OrderQuery) -> OrderResult<ChangeFeed> {
        // Subscribe before the initial read so no write slips between them
        let mut pings = self.changes.subscribe();
        let initial = self.read_all(&query)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let _ = tx.send(FeedMessage::Snapshot(initial.clone()));

        let store = self.clone();
        let cancelled = token.clone();
        tokio::spawn(async move {
            let mut delivered = initial;
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = tx.closed() => break,
                    ping = pings.recv() => {
                        match ping {
                            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                        match store.read_all(&query) {
                            Ok(current) => {
                                let events = diff_orders(&delivered, &current);
                                delivered = current;
                                if !events.is_empty() && tx.send(FeedMessage::Changes(events)).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Change feed query failed");
                                let _ = tx.send(FeedMessage::Error(e.to_string()));
                                break;
                            }
                        }
                    }
                }
            }
            tracing::debug!("Change feed task stopped");
        });

        Ok(ChangeFeed::new(rx, token))
    }
}
