//! Change-feed events

use super::record::Order;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Kind of change reported by a live feed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One change to one order, carrying the full document at event time.
/// Transient: never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub order: Order,
}

impl ChangeEvent {
    pub fn added(order: Order) -> Self {
        Self {
            kind: ChangeKind::Added,
            order,
        }
    }

    pub fn modified(order: Order) -> Self {
        Self {
            kind: ChangeKind::Modified,
            order,
        }
    }

    pub fn removed(order: Order) -> Self {
        Self {
            kind: ChangeKind::Removed,
            order,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order.id
    }
}

/// Minimal set of events turning `previous` into `current`.
///
/// Unchanged orders produce nothing. Added/modified events follow the order
/// of `current`; removals come last.
pub fn diff_orders<'a, I>(previous: I, current: &[Order]) -> Vec<ChangeEvent>
where
    I: IntoIterator<Item = &'a Order>,
{
    let previous: HashMap<&str, &Order> = previous
        .into_iter()
        .map(|o| (o.id.as_str(), o))
        .collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(current.len());
    let mut events = Vec::new();

    for order in current {
        seen.insert(order.id.as_str());
        match previous.get(order.id.as_str()) {
            None => events.push(ChangeEvent::added(order.clone())),
            Some(old) if *old != order => events.push(ChangeEvent::modified(order.clone())),
            Some(_) => {}
        }
    }

    let mut removed: Vec<&Order> = previous
        .iter()
        .filter(|(id, _)| !seen.contains(*id))
        .map(|(_, o)| *o)
        .collect();
    // HashMap order is random; keep output deterministic
    removed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    events.extend(removed.into_iter().cloned().map(ChangeEvent::removed));
    events
}
