//! Shared types for the order engine
//!
//! Wire-level models used by the storefront, the admin console and the
//! engine itself: orders and their status lifecycle, change-feed events,
//! catalog products and structured errors.

pub mod error;
pub mod models;
pub mod order;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ErrorCode, FieldViolation, ValidationError};
pub use order::{ChangeEvent, ChangeKind, Order, OrderQuery, OrderStatus};
