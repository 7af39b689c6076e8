//! Order status and its transition table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status
///
/// Wire names are the storefront's Spanish identifiers; English names are
/// accepted on input.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "pendiente", alias = "pending")]
    Pending,
    #[serde(rename = "confirmado", alias = "confirmed")]
    Confirmed,
    #[serde(rename = "en_preparacion", alias = "in_preparation")]
    InPreparation,
    #[serde(rename = "en_camino", alias = "in_transit")]
    InTransit,
    #[serde(rename = "entregado", alias = "delivered")]
    Delivered,
    #[serde(rename = "cancelado", alias = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::InPreparation,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Wire name
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pendiente",
            OrderStatus::Confirmed => "confirmado",
            OrderStatus::InPreparation => "en_preparacion",
            OrderStatus::InTransit => "en_camino",
            OrderStatus::Delivered => "entregado",
            OrderStatus::Cancelled => "cancelado",
        }
    }

    /// Legal outgoing edges
    pub const fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::InPreparation, OrderStatus::Cancelled],
            OrderStatus::InPreparation => &[OrderStatus::InTransit, OrderStatus::Cancelled],
            OrderStatus::InTransit => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_next().contains(&target)
    }

    /// No outgoing transitions
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pendiente" | "pending" => Ok(OrderStatus::Pending),
            "confirmado" | "confirmed" => Ok(OrderStatus::Confirmed),
            "en_preparacion" | "in_preparation" => Ok(OrderStatus::InPreparation),
            "en_camino" | "in_transit" => Ok(OrderStatus::InTransit),
            "entregado" | "delivered" => Ok(OrderStatus::Delivered),
            "cancelado" | "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}
