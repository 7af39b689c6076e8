//! Order domain types
//!
//! - [`Order`]: the persisted record
//! - [`OrderStatus`]: lifecycle states and their legal edges
//! - [`ChangeEvent`]: live-feed notifications
//! - [`OrderQuery`]: store-side filters

pub mod event;
pub mod query;
pub mod record;
pub mod status;
pub mod types;

// Re-exports
pub use event::{ChangeEvent, ChangeKind, diff_orders};
pub use query::{OrderQuery, sort_newest_first};
pub use record::Order;
pub use status::{OrderStatus, UnknownStatus};
pub use types::*;
