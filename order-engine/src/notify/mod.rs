//! Order notifications
//!
//! Best-effort, at-most-one-attempt delivery of new orders to an external
//! endpoint. Failures are logged and swallowed; they never reach the
//! order-creation caller.

mod dispatcher;
mod webhook;

pub use dispatcher::NotificationDispatcher;
pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;
use shared::order::{Customer, Order, OrderItem};
use thiserror::Error;

pub const NEW_ORDER_EVENT: &str = "new_order";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint answered with status {status}: {body}")]
    Status { status: u16, body: String },
}

impl NotifyError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::NotificationFailed
    }
}

/// Body posted to the webhook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotification {
    pub order_id: String,
    /// RFC 3339
    pub created_at: String,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub event: String,
}

impl OrderNotification {
    pub fn new_order(order: &Order) -> Self {
        let created_at = chrono::DateTime::from_timestamp_millis(order.created_at)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        Self {
            order_id: order.id.clone(),
            created_at,
            customer: order.customer.clone(),
            items: order.items.clone(),
            total: order.total,
            event: NEW_ORDER_EVENT.to_string(),
        }
    }
}

/// Something that can receive order notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &OrderNotification) -> Result<(), NotifyError>;

    /// Used in logs
    fn name(&self) -> &str;
}
