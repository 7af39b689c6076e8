//! Aggregate metrics over an order snapshot
//!
//! Pure functions: the only ambient input is "now", which decides where
//! today starts (local wall-clock midnight). [`aggregate_at`] takes it
//! explicitly.

use crate::utils::{money, time};
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use shared::order::{Order, OrderStatus};
use std::collections::HashSet;

/// Dashboard figures. Field names match what the admin UI reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderStats {
    #[serde(rename = "totalPedidos")]
    pub total_orders: usize,
    #[serde(rename = "pendientes")]
    pub pending: usize,
    #[serde(rename = "confirmados")]
    pub confirmed: usize,
    #[serde(rename = "enPreparacion")]
    pub in_preparation: usize,
    #[serde(rename = "enCamino")]
    pub in_transit: usize,
    #[serde(rename = "entregados")]
    pub delivered: usize,
    #[serde(rename = "cancelados")]
    pub cancelled: usize,
    /// Sum of all totals, every status included
    #[serde(rename = "totalVentas")]
    pub total_sales: f64,
    #[serde(rename = "ventasHoy")]
    pub sales_today: f64,
    #[serde(rename = "pedidosHoy")]
    pub orders_today: usize,
    /// Mean order value rounded to a whole unit, 0 when empty
    #[serde(rename = "promedioVenta")]
    pub average_sale: f64,
    #[serde(rename = "ticketMasAlto")]
    pub highest_ticket: f64,
    /// Smallest non-zero total, 0 when there is none
    #[serde(rename = "ticketMasBajo")]
    pub lowest_ticket: f64,
    #[serde(rename = "clientesUnicos")]
    pub unique_customers: usize,
}

impl OrderStats {
    pub fn count(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Pending => self.pending,
            OrderStatus::Confirmed => self.confirmed,
            OrderStatus::InPreparation => self.in_preparation,
            OrderStatus::InTransit => self.in_transit,
            OrderStatus::Delivered => self.delivered,
            OrderStatus::Cancelled => self.cancelled,
        }
    }

    fn bump(&mut self, status: OrderStatus) {
        let slot = match status {
            OrderStatus::Pending => &mut self.pending,
            OrderStatus::Confirmed => &mut self.confirmed,
            OrderStatus::InPreparation => &mut self.in_preparation,
            OrderStatus::InTransit => &mut self.in_transit,
            OrderStatus::Delivered => &mut self.delivered,
            OrderStatus::Cancelled => &mut self.cancelled,
        };
        *slot += 1;
    }
}

pub fn aggregate(orders: &[Order]) -> OrderStats {
    aggregate_at(orders, &Local::now())
}

pub fn aggregate_at<Tz: TimeZone>(orders: &[Order], now: &DateTime<Tz>) -> OrderStats {
    let today_start = time::local_midnight_millis(now);
    let mut stats = OrderStats {
        total_orders: orders.len(),
        ..Default::default()
    };
    let mut customers = HashSet::new();
    let mut lowest: Option<f64> = None;

    for order in orders {
        stats.bump(order.status);

        let total = order.total;
        if total > stats.highest_ticket {
            stats.highest_ticket = total;
        }
        if total > 0.0 && lowest.is_none_or(|low| total < low) {
            lowest = Some(total);
        }

        let key = order.customer.dedup_key();
        if !key.is_empty() {
            customers.insert(key);
        }
    }

    stats.total_sales = money::sum(orders.iter().map(|o| o.total));
    let today: Vec<f64> = orders
        .iter()
        .filter(|o| o.created_at >= today_start)
        .map(|o| o.total)
        .collect();
    stats.orders_today = today.len();
    stats.sales_today = money::sum(today);

    stats.average_sale = if stats.total_orders > 0 {
        (stats.total_sales / stats.total_orders as f64).round()
    } else {
        0.0
    };
    stats.lowest_ticket = lowest.unwrap_or(0.0);
    stats.unique_customers = customers.len();
    stats
}
