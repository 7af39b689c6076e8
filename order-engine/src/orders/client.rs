//! Order Store Client
//!
//! Front door for order persistence. Wraps an [`OrderBackend`] with the
//! state machine, per-order write serialization, notifications and audit
//! logging. Store failures are passed through without retries.

use super::error::{OrderError, OrderResult};
use super::state_machine::OrderStateMachine;
use super::store::{ChangeFeed, OrderBackend};
use super::validator;
use crate::audit_log;
use crate::notify::NotificationDispatcher;
use crate::utils::now_millis;
use dashmap::DashMap;
use serde_json::Value;
use shared::order::{Order, OrderQuery, OrderStatus};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default cap for a customer's order history
pub const DEFAULT_OWNER_LIMIT: usize = 50;

pub struct OrderStoreClient {
    backend: Arc<dyn OrderBackend>,
    state_machine: OrderStateMachine,
    notifier: NotificationDispatcher,
    /// One writer per order id at a time
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl OrderStoreClient {
    pub fn new(backend: Arc<dyn OrderBackend>, state_machine: OrderStateMachine) -> Self {
        Self {
            backend,
            state_machine,
            notifier: NotificationDispatcher::disabled(),
            write_locks: DashMap::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: NotificationDispatcher) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn state_machine(&self) -> &OrderStateMachine {
        &self.state_machine
    }

    /// Persist an already validated order and return its store id.
    ///
    /// The notification is dispatched in the background after the write
    /// succeeds; its outcome does not affect the result.
    pub async fn create(&self, order: &Order) -> OrderResult<String> {
        let id = self.backend.create(order).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to create order");
        })?;

        let mut persisted = order.clone();
        persisted.id = id.clone();

        tracing::info!(order_id = %id, total = persisted.total, "Order created");
        audit_log!("create", format!("order:{}", id), format!("total={}", persisted.total));

        let _ = self.notifier.notify(&persisted);
        Ok(id)
    }

    /// Validate a raw payload, then [`create`](Self::create)
    pub async fn submit(&self, raw: &Value) -> OrderResult<Order> {
        let mut order = validator::validate(raw)?;
        order.id = self.create(&order).await?;
        Ok(order)
    }

    /// `Ok(None)` when the order does not exist
    pub async fn get(&self, id: &str) -> OrderResult<Option<Order>> {
        self.backend.get(id).await
    }

    pub async fn update_status(&self, id: &str, status: OrderStatus) -> OrderResult<Order> {
        self.update_status_with_note(id, status, None).await
    }

    /// Move `id` to `status`, recording an optional note for that status.
    ///
    /// Re-applying the current status returns the stored order without a
    /// write. Concurrent updates on the same id run one after another; the
    /// last one wins.
    pub async fn update_status_with_note(
        &self,
        id: &str,
        status: OrderStatus,
        note: Option<&str>,
    ) -> OrderResult<Order> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.apply_status(id, status, note).await
        };
        drop(lock);
        self.release_lock(id);
        result
    }

    async fn apply_status(
        &self,
        id: &str,
        status: OrderStatus,
        note: Option<&str>,
    ) -> OrderResult<Order> {
        let current = self
            .backend
            .get(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;

        let outcome = self
            .state_machine
            .apply(&current, status, note, now_millis())
            .inspect_err(|e| {
                tracing::warn!(order_id = %id, error = %e, "Status change rejected");
            })?;

        if !outcome.changed {
            tracing::debug!(order_id = %id, status = %status, "Status unchanged, skipping write");
            return Ok(outcome.order);
        }

        self.backend.put(&outcome.order).await?;
        tracing::info!(order_id = %id, from = %current.status, to = %status, "Order status updated");
        audit_log!(
            "transition",
            format!("order:{}", id),
            format!("{} -> {}", current.status, status)
        );
        Ok(outcome.order)
    }

    /// Physical delete, outside the status lifecycle.
    /// Returns whether a record was removed.
    pub async fn delete(&self, id: &str) -> OrderResult<bool> {
        let lock = self.lock_for(id);
        let removed = {
            let _guard = lock.lock().await;
            self.backend.delete(id).await
        };
        drop(lock);
        self.release_lock(id);

        let removed = removed?;
        if removed {
            tracing::info!(order_id = %id, "Order deleted");
            audit_log!("delete", format!("order:{}", id));
        }
        Ok(removed)
    }

    /// One-shot read, newest first
    pub async fn list(&self, query: &OrderQuery) -> OrderResult<Vec<Order>> {
        self.backend.query(query).await
    }

    /// Orders placed by an authenticated customer, newest first
    pub async fn list_by_owner(
        &self,
        owner_ref: &str,
        limit: Option<usize>,
    ) -> OrderResult<Vec<Order>> {
        let query = OrderQuery::new()
            .owner(owner_ref)
            .limit(limit.unwrap_or(DEFAULT_OWNER_LIMIT));
        self.backend.query(&query).await
    }

    /// Live feed of orders matching `query`. Drop or cancel the feed to stop it.
    pub async fn subscribe(&self, query: OrderQuery) -> OrderResult<ChangeFeed> {
        self.backend.subscribe(query).await
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(id.to_string())
            .or_default()
            .clone()
    }

    fn release_lock(&self, id: &str) {
        self.write_locks
            .remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotificationSink, NotifyError, OrderNotification};
    use crate::orders::state_machine::TransitionPolicy;
    use crate::orders::store::{RedbOrderStore, StoreAccess};
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "customer": {"name": "Ana", "phone": "3001234567", "address": "Calle 10 #5-20"},
            "items": [{"name": "Arepa", "unitPrice": 2500, "quantity": 2}],
            "total": 5000,
            "ownerRef": "uid-1"
        })
    }

    fn client() -> OrderStoreClient {
        let store = RedbOrderStore::open_in_memory().unwrap();
        OrderStoreClient::new(Arc::new(store), OrderStateMachine::default())
    }

    #[tokio::test]
    async fn test_submit_assigns_store_id() {
        let client = client();
        let order = client.submit(&payload()).await.unwrap();
        assert!(order.is_persisted());
        let stored = client.get(&order.id).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }

    /// Sink that always fails and signals each attempt
    #[derive(Default)]
    struct DownSink {
        attempts: std::sync::atomic::AtomicUsize,
        attempted: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl NotificationSink for DownSink {
        async fn deliver(&self, _: &OrderNotification) -> Result<(), NotifyError> {
            self.attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.attempted.notify_one();
            Err(NotifyError::Status {
                status: 502,
                body: "bad gateway".into(),
            })
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    #[tokio::test]
    async fn test_create_succeeds_when_notification_fails() {
        let sink = Arc::new(DownSink::default());
        let client = client().with_notifier(NotificationDispatcher::new(Some(sink.clone())));

        let order = client.submit(&payload()).await.unwrap();
        assert!(client.get(&order.id).await.unwrap().is_some());

        tokio::time::timeout(std::time::Duration::from_secs(2), sink.attempted.notified())
            .await
            .unwrap();
        assert_eq!(sink.attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        assert!(client().get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_payload_never_reaches_store() {
        let client = client();
        let err = client.submit(&json!({"total": 1})).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert!(client.list(&OrderQuery::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_status_records_history_and_note() {
        let client = client();
        let id = client.submit(&payload()).await.unwrap().id;

        let updated = client
            .update_status_with_note(&id, OrderStatus::Confirmed, Some(" confirmado por teléfono "))
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert!(updated.entered_at(OrderStatus::Confirmed).is_some());
        assert_eq!(
            updated.status_notes.get(&OrderStatus::Confirmed).map(String::as_str),
            Some("confirmado por teléfono")
        );
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(client.get(&id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_status_errors() {
        let client = client();
        let id = client.submit(&payload()).await.unwrap().id;

        let err = client.update_status(&id, OrderStatus::Delivered).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
        let err = client.update_status("missing", OrderStatus::Confirmed).await.unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));

        // Rejected transition leaves the record alone
        assert_eq!(
            client.get(&id).await.unwrap().unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_same_status_skips_write() {
        let client = client();
        let created = client.submit(&payload()).await.unwrap();
        let same = client
            .update_status(&created.id, OrderStatus::Pending)
            .await
            .unwrap();
        assert_eq!(same, created);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let client = Arc::new(OrderStoreClient::new(
            Arc::new(RedbOrderStore::open_in_memory().unwrap()),
            OrderStateMachine::new(TransitionPolicy::Strict),
        ));
        let id = client.submit(&payload()).await.unwrap().id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                let id = id.clone();
                tokio::spawn(async move { client.update_status(&id, OrderStatus::Confirmed).await })
            })
            .collect();
        for handle in handles {
            let order = handle.await.unwrap().unwrap();
            assert_eq!(order.status, OrderStatus::Confirmed);
        }

        let stored = client.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.status_history.len(), 1);
        assert!(client.write_locks.is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_list_by_owner() {
        let client = client();
        let a = client.submit(&payload()).await.unwrap().id;
        let mut other = payload();
        other["ownerRef"] = json!("uid-2");
        client.submit(&other).await.unwrap();

        let mine = client.list_by_owner("uid-1", None).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, a);

        assert!(client.delete(&a).await.unwrap());
        assert!(client.list_by_owner("uid-1", None).await.unwrap().is_empty());
        assert!(!client.delete(&a).await.unwrap());
    }

    #[tokio::test]
    async fn test_write_rejected_surfaces() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        let admin = OrderStoreClient::new(Arc::new(store.clone()), OrderStateMachine::default());
        let storefront = OrderStoreClient::new(
            Arc::new(store.with_access(StoreAccess::CreateOnly)),
            OrderStateMachine::default(),
        );

        let id = storefront.submit(&payload()).await.unwrap().id;
        let err = storefront
            .update_status(&id, OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::WriteRejected(_)));
        admin.update_status(&id, OrderStatus::Confirmed).await.unwrap();
    }
}
