//! Live Order Sync Engine
//!
//! Keeps the admin view's authoritative snapshot in memory, driven by a
//! change feed from [`OrderStoreClient::subscribe`].
//!
//! # Guarantees
//!
//! - Feed messages are applied one at a time, in arrival order, by a single
//!   consumer task; the snapshot lock is held for each whole batch
//! - Applying the same event twice leaves the same snapshot (upsert/remove by id)
//! - A full result set (on connect or reconnect) is diffed against the
//!   snapshot, producing synthetic `removed` events for vanished ids
//! - A feed error leaves the snapshot untouched and is published as
//!   [`SyncNotification::Error`]; nothing is retried automatically

use super::client::OrderStoreClient;
use super::error::OrderResult;
use super::filter::{self, FilterCriteria};
use super::stats::{self, OrderStats};
use super::store::{ChangeFeed, FeedMessage};
use crate::utils::now_millis;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use shared::order::{ChangeEvent, ChangeKind, Order, OrderQuery, diff_orders, sort_newest_first};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// What listeners receive after every applied batch
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncNotification {
    OrdersUpdated {
        /// The batch just applied
        changes: Vec<ChangeEvent>,
        /// Whole snapshot, newest first
        orders: Vec<Order>,
        stats: OrderStats,
        timestamp: i64,
    },
    Error {
        message: String,
        timestamp: i64,
    },
}

#[derive(Default)]
struct SnapshotState {
    by_id: HashMap<String, Order>,
    /// `by_id` values, `created_at` descending
    ordered: Vec<Order>,
    stats: OrderStats,
}

impl SnapshotState {
    fn rebuild(&mut self) {
        let mut ordered: Vec<Order> = self.by_id.values().cloned().collect();
        sort_newest_first(&mut ordered);
        self.stats = stats::aggregate(&ordered);
        self.ordered = ordered;
    }
}

struct Inner {
    client: Arc<OrderStoreClient>,
    state: Mutex<SnapshotState>,
    listeners: DashMap<u64, mpsc::UnboundedSender<SyncNotification>>,
    next_listener_id: AtomicU64,
    query: Mutex<OrderQuery>,
    feed_token: Mutex<Option<CancellationToken>>,
}

impl Inner {
    fn publish(&self, notification: SyncNotification) {
        self.listeners
            .retain(|_, tx| tx.send(notification.clone()).is_ok());
    }
}

/// Live snapshot of the orders visible to the admin view
#[derive(Clone)]
pub struct LiveOrderSync {
    inner: Arc<Inner>,
}

impl LiveOrderSync {
    pub fn new(client: Arc<OrderStoreClient>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                state: Mutex::new(SnapshotState::default()),
                listeners: DashMap::new(),
                next_listener_id: AtomicU64::new(1),
                query: Mutex::new(OrderQuery::default()),
                feed_token: Mutex::new(None),
            }),
        }
    }

    /// Open a feed for `query` and start consuming it.
    /// Any previous feed is cancelled first; the snapshot is kept and
    /// reconciled against the new feed's first result set.
    pub async fn start(&self, query: OrderQuery) -> OrderResult<()> {
        self.stop();
        *self.inner.query.lock() = query.clone();

        let feed = match self.inner.client.subscribe(query).await {
            Ok(feed) => feed,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open order change feed");
                self.report_error(e.to_string());
                return Err(e);
            }
        };
        self.attach(feed);
        Ok(())
    }

    /// Re-open the feed with the last query, e.g. after an error
    pub async fn resubscribe(&self) -> OrderResult<()> {
        let query = self.inner.query.lock().clone();
        tracing::info!("Resubscribing to order change feed");
        self.start(query).await
    }

    /// Consume an already opened feed
    pub fn attach(&self, feed: ChangeFeed) {
        self.stop();
        let token = CancellationToken::new();
        *self.inner.feed_token.lock() = Some(token.clone());
        tokio::spawn(run_feed(Arc::downgrade(&self.inner), feed, token));
    }

    /// Cancel the current feed. The snapshot stays as it is.
    pub fn stop(&self) {
        if let Some(token) = self.inner.feed_token.lock().take() {
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .feed_token
            .lock()
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    /// Register a listener. Dropping the handle unsubscribes it.
    pub fn listen(&self) -> SyncListener {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.listeners.insert(id, tx);
        SyncListener {
            id,
            rx,
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Upsert or remove each event by order id, then republish.
    pub fn apply_changes(&self, events: Vec<ChangeEvent>) {
        let mut state = self.inner.state.lock();
        self.merge_changes(&mut state, events);
    }

    fn merge_changes(&self, state: &mut SnapshotState, events: Vec<ChangeEvent>) {
        let mut applied = Vec::with_capacity(events.len());
        for event in events {
            if event.order.id.is_empty() {
                tracing::warn!(kind = ?event.kind, "Ignoring change event without order id");
                continue;
            }
            match event.kind {
                ChangeKind::Removed => {
                    state.by_id.remove(&event.order.id);
                }
                ChangeKind::Added | ChangeKind::Modified => {
                    state
                        .by_id
                        .insert(event.order.id.clone(), event.order.clone());
                }
            }
            applied.push(event);
        }
        state.rebuild();
        tracing::debug!(changes = applied.len(), total = state.ordered.len(), "Applied change batch");
        self.publish_updated(state, applied);
    }

    /// Replace the snapshot with a full result set and return the events
    /// that describe the difference.
    pub fn apply_resync(&self, orders: Vec<Order>) -> Vec<ChangeEvent> {
        let mut state = self.inner.state.lock();
        self.reconcile(&mut state, orders)
    }

    fn reconcile(&self, state: &mut SnapshotState, mut orders: Vec<Order>) -> Vec<ChangeEvent> {
        orders.retain(|o| !o.id.is_empty());
        sort_newest_first(&mut orders);

        let events = diff_orders(state.by_id.values(), &orders);
        state.by_id = orders.into_iter().map(|o| (o.id.clone(), o)).collect();
        state.rebuild();
        tracing::info!(
            changes = events.len(),
            total = state.ordered.len(),
            "Reconciled snapshot with full result set"
        );
        self.publish_updated(state, events.clone());
        events
    }

    /// Publish a feed failure. The snapshot is not touched.
    pub fn report_error(&self, message: String) {
        tracing::warn!(error = %message, "Order change feed error");
        self.inner.publish(SyncNotification::Error {
            message,
            timestamp: now_millis(),
        });
    }

    fn publish_updated(&self, state: &SnapshotState, changes: Vec<ChangeEvent>) {
        self.inner.publish(SyncNotification::OrdersUpdated {
            changes,
            orders: state.ordered.clone(),
            stats: state.stats.clone(),
            timestamp: now_millis(),
        });
    }

    /// Snapshot, newest first
    pub fn snapshot(&self) -> Vec<Order> {
        self.inner.state.lock().ordered.clone()
    }

    pub fn get(&self, id: &str) -> Option<Order> {
        self.inner.state.lock().by_id.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> OrderStats {
        self.inner.state.lock().stats.clone()
    }

    pub fn filtered(&self, criteria: &FilterCriteria) -> Vec<Order> {
        let state = self.inner.state.lock();
        filter::filter(&state.ordered, criteria)
    }
}

async fn run_feed(inner: Weak<Inner>, mut feed: ChangeFeed, token: CancellationToken) {
    loop {
        let message = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            message = feed.recv() => message,
        };
        let Some(inner) = inner.upgrade() else {
            break;
        };
        if !consume(&LiveOrderSync { inner }, message, &token) {
            break;
        }
    }
    feed.cancel();
    token.cancel();
    tracing::debug!("Order sync consumer stopped");
}

/// Apply one feed message; `false` once the consumer should stop.
///
/// The token is checked under the snapshot lock, so a batch taken off a
/// replaced feed can never land after the new feed's resync.
fn consume(sync: &LiveOrderSync, message: Option<FeedMessage>, token: &CancellationToken) -> bool {
    let mut state = sync.inner.state.lock();
    if token.is_cancelled() {
        return false;
    }
    match message {
        Some(FeedMessage::Snapshot(orders)) => {
            sync.reconcile(&mut state, orders);
            true
        }
        Some(FeedMessage::Changes(events)) => {
            sync.merge_changes(&mut state, events);
            true
        }
        Some(FeedMessage::Error(message)) => {
            drop(state);
            sync.report_error(message);
            false
        }
        None => {
            drop(state);
            sync.report_error("Order change feed closed".to_string());
            false
        }
    }
}

/// Receives [`SyncNotification`]s until dropped
pub struct SyncListener {
    id: u64,
    rx: mpsc::UnboundedReceiver<SyncNotification>,
    inner: Weak<Inner>,
}

impl SyncListener {
    pub async fn recv(&mut self) -> Option<SyncNotification> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SyncNotification> {
        self.rx.try_recv().ok()
    }
}

impl Drop for SyncListener {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.remove(&self.id);
        }
    }
}
