//! Order status transitions
//!
//! ```text
//! pendiente ──► confirmado ──► en_preparacion ──► en_camino ──► entregado
//!     │             │                │                │
//!     └─────────────┴────────────────┴────────────────┴──────► cancelado
//! ```
//!
//! `entregado` and `cancelado` are terminal. Re-applying the current status
//! is a successful no-op.

use super::error::{OrderError, OrderResult};
use crate::utils::now_millis;
use shared::order::{Order, OrderStatus};
use std::fmt;
use std::str::FromStr;

/// What to do with an edge that is not in the transition table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Reject with [`OrderError::InvalidTransition`]
    #[default]
    Strict,
    /// Allow, with a warning. Leaving a terminal status is still rejected.
    Permissive,
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(TransitionPolicy::Strict),
            "permissive" => Ok(TransitionPolicy::Permissive),
            other => Err(format!("unknown transition policy: {}", other)),
        }
    }
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionPolicy::Strict => f.write_str("strict"),
            TransitionPolicy::Permissive => f.write_str("permissive"),
        }
    }
}

/// Result of applying a transition
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub order: Order,
    /// False for a same-status no-op; the caller can skip the write
    pub changed: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderStateMachine {
    policy: TransitionPolicy,
}

impl OrderStateMachine {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Check legality without touching an order.
    /// `Ok(false)` means `from == to`.
    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> OrderResult<bool> {
        if from == to {
            return Ok(false);
        }
        if from.can_transition_to(to) {
            return Ok(true);
        }
        if from.is_terminal() || self.policy == TransitionPolicy::Strict {
            return Err(OrderError::InvalidTransition { from, to });
        }
        tracing::warn!(
            from = %from,
            to = %to,
            "Status transition outside the table allowed by permissive policy"
        );
        Ok(true)
    }

    pub fn transition(&self, order: &Order, target: OrderStatus) -> OrderResult<Order> {
        self.apply(order, target, None, now_millis())
            .map(|outcome| outcome.order)
    }

    /// Apply `target` to a copy of `order` at time `now`.
    ///
    /// On change: status set, history entry added if the status was never
    /// entered before, optional note stored the same way, `updated_at`
    /// refreshed.
    pub fn apply(
        &self,
        order: &Order,
        target: OrderStatus,
        note: Option<&str>,
        now: i64,
    ) -> OrderResult<TransitionOutcome> {
        if !self.check(order.status, target)? {
            return Ok(TransitionOutcome {
                order: order.clone(),
                changed: false,
            });
        }

        let mut next = order.clone();
        next.status = target;
        next.record_status(target, now);
        if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
            next.status_notes
                .entry(target)
                .or_insert_with(|| note.to_string());
        }
        next.updated_at = now;

        Ok(TransitionOutcome {
            order: next,
            changed: true,
        })
    }
}
