//! Flat order rows for spreadsheet export
//!
//! Byte-level CSV/Excel formatting belongs to the writer; this module only
//! decides which columns exist and what goes in them.

use crate::utils::time::format_local;
use serde::Serialize;
use shared::order::Order;

/// Column titles, in [`ExportRow::cells`] order
pub const EXPORT_HEADERS: [&str; 10] = [
    "ID",
    "Fecha",
    "Cliente",
    "Teléfono",
    "Dirección",
    "Email",
    "Estado",
    "Total",
    "Productos",
    "Observaciones",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub id: String,
    pub date: String,
    pub customer: String,
    pub phone: String,
    pub address: String,
    pub email: String,
    pub status: String,
    pub total: f64,
    /// `name (qty)` joined with `; `
    pub items: String,
    pub notes: String,
}

impl ExportRow {
    pub fn from_order(order: &Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| format!("{} ({})", item.name, item.quantity))
            .collect::<Vec<_>>()
            .join("; ");

        Self {
            id: order.display_id().to_string(),
            date: format_local(order.created_at),
            customer: order.customer.name.clone(),
            phone: order.customer.phone.clone(),
            address: order.customer.address.clone(),
            email: order.customer.email.clone().unwrap_or_default(),
            status: order.status.to_string(),
            total: order.total,
            items,
            notes: order.notes.clone().unwrap_or_default(),
        }
    }

    pub fn cells(&self) -> [String; 10] {
        [
            self.id.clone(),
            self.date.clone(),
            self.customer.clone(),
            self.phone.clone(),
            self.address.clone(),
            self.email.clone(),
            self.status.clone(),
            self.total.to_string(),
            self.items.clone(),
            self.notes.clone(),
        ]
    }
}

/// Project orders into rows, keeping their order
pub fn export_rows(orders: &[Order]) -> Vec<ExportRow> {
    orders.iter().map(ExportRow::from_order).collect()
}
