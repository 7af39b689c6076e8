//! Storefront checkout
//!
//! cart → draft payload → [`validate`](super::validator::validate) →
//! [`OrderStoreClient::create`] → cart cleared.
//!
//! When the store cannot be reached the validated order is kept in local
//! storage under [`FALLBACK_ORDERS_KEY`] and the caller gets an offline
//! receipt. [`CheckoutService::flush_offline_orders`] pushes those later.

use super::client::OrderStoreClient;
use super::error::OrderResult;
use super::validator;
use crate::cart::CartCache;
use crate::storage::{FALLBACK_ORDERS_KEY, LocalStorage};
use crate::utils::{money, now_millis};
use parking_lot::Mutex;
use serde_json::json;
use shared::order::{Customer, Order, OrderItem};
use std::sync::Arc;

/// Result of a successful checkout
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutReceipt {
    /// Persisted in the order store; `order.id` is the store id
    Stored(Order),
    /// Store unreachable; saved locally, identified by `local_id`
    Offline(Order),
}

impl CheckoutReceipt {
    pub fn order(&self) -> &Order {
        match self {
            CheckoutReceipt::Stored(order) | CheckoutReceipt::Offline(order) => order,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, CheckoutReceipt::Offline(_))
    }
}

/// Outcome of pushing locally saved orders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Store ids of the orders that went through
    pub pushed: Vec<String>,
    /// Orders still waiting locally
    pub remaining: usize,
}

pub struct CheckoutService {
    client: Arc<OrderStoreClient>,
    storage: Arc<dyn LocalStorage>,
    cart: Arc<Mutex<CartCache>>,
    /// Serializes every read-modify-write of the fallback list
    offline_lock: tokio::sync::Mutex<()>,
}

impl CheckoutService {
    pub fn new(
        client: Arc<OrderStoreClient>,
        storage: Arc<dyn LocalStorage>,
        cart: Arc<Mutex<CartCache>>,
    ) -> Self {
        Self {
            client,
            storage,
            cart,
            offline_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn cart(&self) -> Arc<Mutex<CartCache>> {
        self.cart.clone()
    }

    /// Turn the current cart into an order.
    ///
    /// An empty cart fails validation. The cart is cleared only once the
    /// order is stored, remotely or in the local fallback list.
    pub async fn checkout(
        &self,
        customer: Customer,
        notes: Option<String>,
        owner_ref: Option<String>,
    ) -> OrderResult<CheckoutReceipt> {
        let lines = self.cart.lock().lines().to_vec();
        let items: Vec<OrderItem> = lines.iter().map(OrderItem::from).collect();

        let draft = json!({
            "localId": now_millis().to_string(),
            "customer": customer,
            "items": items,
            "total": money::cart_total(&lines),
            "notes": notes,
            "ownerRef": owner_ref,
        });
        let mut order = validator::validate(&draft)?;

        match self.client.create(&order).await {
            Ok(id) => {
                order.id = id;
                self.cart.lock().clear();
                tracing::info!(order_id = %order.id, total = order.total, "Checkout completed");
                Ok(CheckoutReceipt::Stored(order))
            }
            Err(e) if e.is_unavailable() => {
                tracing::warn!(error = %e, "Order store unreachable, saving order locally");
                {
                    let _guard = self.offline_lock.lock().await;
                    self.save_offline(&order)?;
                }
                self.cart.lock().clear();
                Ok(CheckoutReceipt::Offline(order))
            }
            Err(e) => Err(e),
        }
    }

    /// Orders waiting in the local fallback list
    pub fn offline_orders(&self) -> Vec<Order> {
        let json = match self.storage.get(FALLBACK_ORDERS_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read offline orders");
                return Vec::new();
            }
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Offline order list is corrupt, ignoring it");
            Vec::new()
        })
    }

    /// Push locally saved orders to the store.
    ///
    /// Successful ones are removed from the list; the rest stay for the
    /// next attempt. Stops early once the store turns out to be unreachable.
    /// Concurrent flushes and offline checkouts wait for each other.
    pub async fn flush_offline_orders(&self) -> OrderResult<FlushReport> {
        let _guard = self.offline_lock.lock().await;
        let pending = self.offline_orders();
        if pending.is_empty() {
            return Ok(FlushReport::default());
        }

        let mut report = FlushReport::default();
        let mut remaining = Vec::new();
        let mut unreachable = false;

        for order in pending {
            if unreachable {
                remaining.push(order);
                continue;
            }
            match self.client.create(&order).await {
                Ok(id) => report.pushed.push(id),
                Err(e) => {
                    unreachable = e.is_unavailable();
                    tracing::warn!(
                        local_id = order.local_id.as_deref().unwrap_or_default(),
                        error = %e,
                        "Offline order not pushed"
                    );
                    remaining.push(order);
                }
            }
        }

        report.remaining = remaining.len();
        self.write_offline(&remaining)?;
        tracing::info!(
            pushed = report.pushed.len(),
            remaining = report.remaining,
            "Offline orders flushed"
        );
        Ok(report)
    }

    fn save_offline(&self, order: &Order) -> OrderResult<()> {
        let mut orders = self.offline_orders();
        orders.push(order.clone());
        self.write_offline(&orders)
    }

    fn write_offline(&self, orders: &[Order]) -> OrderResult<()> {
        if orders.is_empty() {
            self.storage.remove(FALLBACK_ORDERS_KEY)?;
        } else {
            let json = serde_json::to_string(orders)?;
            self.storage.set(FALLBACK_ORDERS_KEY, &json)?;
        }
        Ok(())
    }
}
