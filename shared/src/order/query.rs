//! Store-side query filters shared by one-shot reads and live feeds

use super::record::Order;
use super::status::OrderStatus;
use serde::{Deserialize, Serialize};

/// Filters understood by the order store.
///
/// Results are always ordered by `created_at` descending and capped at
/// `limit` after filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    /// Inclusive lower bound, unix millis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_from: Option<i64>,
    /// Inclusive upper bound, unix millis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl OrderQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn created_between(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    pub fn owner(mut self, owner_ref: impl Into<String>) -> Self {
        self.owner_ref = Some(owner_ref.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        if self.status.is_some_and(|s| s != order.status) {
            return false;
        }
        if self.created_from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| order.created_at > to) {
            return false;
        }
        match &self.owner_ref {
            Some(owner) => order.owner_ref.as_deref() == Some(owner.as_str()),
            None => true,
        }
    }

    /// Filter, sort newest first, truncate
    pub fn apply(&self, orders: impl IntoIterator<Item = Order>) -> Vec<Order> {
        let mut result: Vec<Order> = orders.into_iter().filter(|o| self.matches(o)).collect();
        sort_newest_first(&mut result);
        if let Some(limit) = self.limit {
            result.truncate(limit);
        }
        result
    }
}

/// `created_at` descending, id as tie breaker
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
