//! Fire-and-forget dispatch

use super::{NotificationSink, OrderNotification};
use shared::order::Order;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Sends new-order notifications without blocking the caller.
///
/// The sink is optional and decided once at construction; a dispatcher
/// without a sink does nothing.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    sink: Option<Arc<dyn NotificationSink>>,
}

impl NotificationDispatcher {
    pub fn new(sink: Option<Arc<dyn NotificationSink>>) -> Self {
        Self { sink }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Spawn one delivery attempt for `order`.
    ///
    /// The handle resolves to whether delivery succeeded; callers are free
    /// to drop it. Returns `None` when no sink is configured.
    pub fn notify(&self, order: &Order) -> Option<JoinHandle<bool>> {
        let sink = self.sink.clone()?;
        let notification = OrderNotification::new_order(order);
        Some(tokio::spawn(async move {
            match sink.deliver(&notification).await {
                Ok(()) => {
                    tracing::info!(
                        order_id = %notification.order_id,
                        sink = sink.name(),
                        "Order notification delivered"
                    );
                    true
                }
                Err(e) => {
                    tracing::warn!(
                        order_id = %notification.order_id,
                        sink = sink.name(),
                        error = %e,
                        code = %e.code(),
                        "Order notification failed, not retrying"
                    );
                    false
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotifyError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared::order::{Customer, OrderStatus};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<OrderNotification>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, notification: &OrderNotification) -> Result<(), NotifyError> {
            self.seen.lock().push(notification.clone());
            if self.fail {
                return Err(NotifyError::Status {
                    status: 503,
                    body: String::new(),
                });
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn order() -> Order {
        Order {
            id: "abc".into(),
            local_id: None,
            customer: Customer::default(),
            items: vec![],
            total: 7000.0,
            status: OrderStatus::Pending,
            created_at: 0,
            updated_at: 0,
            status_history: BTreeMap::new(),
            status_notes: BTreeMap::new(),
            notes: None,
            owner_ref: None,
        }
    }

    #[tokio::test]
    async fn test_disabled_does_nothing() {
        let dispatcher = NotificationDispatcher::disabled();
        assert!(!dispatcher.is_enabled());
        assert!(dispatcher.notify(&order()).is_none());
    }

    #[tokio::test]
    async fn test_single_attempt_on_failure() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let dispatcher = NotificationDispatcher::new(Some(sink.clone()));
        let delivered = dispatcher.notify(&order()).unwrap().await.unwrap();
        assert!(!delivered);
        assert_eq!(sink.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_payload_shape() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = NotificationDispatcher::new(Some(sink.clone()));
        assert!(dispatcher.notify(&order()).unwrap().await.unwrap());

        let seen = sink.seen.lock();
        assert_eq!(seen[0].order_id, "abc");
        assert_eq!(seen[0].event, "new_order");
        assert_eq!(seen[0].created_at, "1970-01-01T00:00:00+00:00");
    }
}
