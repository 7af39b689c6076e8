//! Persisted order record

use super::status::OrderStatus;
use super::types::{Customer, OrderItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Order record
///
/// `id` is the store-assigned key and is empty until the record has been
/// persisted. `local_id` is the temporary key a client used before that and
/// is informational only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(default)]
    pub status: OrderStatus,
    /// Unix millis, immutable after creation
    pub created_at: i64,
    /// Unix millis, refreshed on every mutation
    pub updated_at: i64,
    /// First time each status was entered. Entries are never overwritten.
    #[serde(default)]
    pub status_history: BTreeMap<OrderStatus, i64>,
    /// Optional note attached when a status was entered
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub status_notes: BTreeMap<OrderStatus, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Authenticated customer this order belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<String>,
}

impl Order {
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Identifier to show to humans: the store id once persisted
    pub fn display_id(&self) -> &str {
        if self.is_persisted() {
            &self.id
        } else {
            self.local_id.as_deref().unwrap_or_default()
        }
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Record `status` as entered at `at` unless it already has an entry
    pub fn record_status(&mut self, status: OrderStatus, at: i64) -> bool {
        if self.status_history.contains_key(&status) {
            return false;
        }
        self.status_history.insert(status, at);
        true
    }

    pub fn entered_at(&self, status: OrderStatus) -> Option<i64> {
        self.status_history.get(&status).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Order {
        Order {
            id: String::new(),
            local_id: Some("1700000000000".into()),
            customer: Customer {
                name: "Ana".into(),
                phone: "3001234567".into(),
                address: "Calle 10 #5-20".into(),
                email: None,
            },
            items: vec![OrderItem {
                product_ref: "p1".into(),
                name: "Arepa".into(),
                unit_price: 2500.0,
                quantity: 2,
                description: String::new(),
                customization: None,
            }],
            total: 5000.0,
            status: OrderStatus::Pending,
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
            status_history: BTreeMap::new(),
            status_notes: BTreeMap::new(),
            notes: None,
            owner_ref: None,
        }
    }

    #[test]
    fn test_display_id_prefers_store_id() {
        let mut order = sample();
        assert_eq!(order.display_id(), "1700000000000");
        order.id = "abc123".into();
        assert_eq!(order.display_id(), "abc123");
    }

    #[test]
    fn test_first_history_entry_wins() {
        let mut order = sample();
        assert!(order.record_status(OrderStatus::Confirmed, 10));
        assert!(!order.record_status(OrderStatus::Confirmed, 20));
        assert_eq!(order.entered_at(OrderStatus::Confirmed), Some(10));
    }

    #[test]
    fn test_history_serializes_with_wire_names() {
        let mut order = sample();
        order.record_status(OrderStatus::Confirmed, 42);
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["statusHistory"]["confirmado"], 42);
        assert_eq!(json["status"], "pendiente");
        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }
}
