//! Ad-hoc filtering and sorting over an order snapshot
//!
//! All criteria combine with AND. Search is a case and accent insensitive
//! substring match on customer name OR phone OR order id.

use crate::utils::text;
use serde::{Deserialize, Serialize};
use shared::order::{Order, OrderStatus, UnknownStatus};
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => *s == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "todos" | "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedDesc,
    CreatedAsc,
    TotalDesc,
    TotalAsc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fecha_desc" | "created_desc" => Ok(SortKey::CreatedDesc),
            "fecha_asc" | "created_asc" => Ok(SortKey::CreatedAsc),
            "total_desc" => Ok(SortKey::TotalDesc),
            "total_asc" => Ok(SortKey::TotalAsc),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub status: StatusFilter,
    /// Inclusive, unix millis
    pub created_from: Option<i64>,
    /// Inclusive, unix millis
    pub created_to: Option<i64>,
    pub search: Option<String>,
    pub sort: SortKey,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = StatusFilter::Only(status);
        self
    }

    pub fn created_between(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}

pub fn filter(orders: &[Order], criteria: &FilterCriteria) -> Vec<Order> {
    let needle = criteria
        .search
        .as_deref()
        .map(|s| text::fold(s.trim()))
        .unwrap_or_default();

    let mut result: Vec<Order> = orders
        .iter()
        .filter(|o| criteria.status.matches(o.status))
        .filter(|o| criteria.created_from.is_none_or(|from| o.created_at >= from))
        .filter(|o| criteria.created_to.is_none_or(|to| o.created_at <= to))
        .filter(|o| matches_search(o, &needle))
        .cloned()
        .collect();

    result.sort_by(|a, b| compare(a, b, criteria.sort));
    result
}

fn matches_search(order: &Order, folded_needle: &str) -> bool {
    folded_needle.is_empty()
        || text::contains_folded(&order.customer.name, folded_needle)
        || text::contains_folded(&order.customer.phone, folded_needle)
        || text::contains_folded(order.display_id(), folded_needle)
}

fn compare(a: &Order, b: &Order, sort: SortKey) -> Ordering {
    let primary = match sort {
        SortKey::CreatedDesc => b.created_at.cmp(&a.created_at),
        SortKey::CreatedAsc => a.created_at.cmp(&b.created_at),
        SortKey::TotalDesc => b.total.total_cmp(&a.total),
        SortKey::TotalAsc => a.total.total_cmp(&b.total),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}
