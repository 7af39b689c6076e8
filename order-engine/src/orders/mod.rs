//! Order lifecycle and live sync
//!
//! - **validator**: raw payload → normalized [`Order`](shared::order::Order)
//! - **state_machine**: legal status transitions and history stamping
//! - **store**: [`OrderBackend`] contract and the embedded redb backend
//! - **client**: [`OrderStoreClient`], the single entry point for writes
//! - **checkout**: storefront cart → order, with offline fallback
//! - **sync**: [`LiveOrderSync`], the admin view's live snapshot
//! - **stats** / **filter**: pure functions over a snapshot
//! - **export**: flat rows for spreadsheet writers
//!
//! # Data Flow
//!
//! ```text
//! CartCache → CheckoutService → validate → OrderStoreClient::create
//!                                               │         └─► NotificationDispatcher
//!                                               ▼
//!                                      OrderBackend (redb)
//!                                               │ change feed
//!                                               ▼
//!                                        LiveOrderSync ─► stats / filter
//!                                               │
//!                                        SyncListener(s)
//! ```

pub mod checkout;
pub mod client;
pub mod error;
pub mod export;
pub mod filter;
pub mod state_machine;
pub mod stats;
pub mod store;
pub mod sync;
pub mod validator;

// Re-exports
pub use checkout::{CheckoutReceipt, CheckoutService, FlushReport};
pub use client::OrderStoreClient;
pub use error::{OrderError, OrderResult};
pub use export::{ExportRow, export_rows};
pub use filter::{FilterCriteria, SortKey, StatusFilter};
pub use state_machine::{OrderStateMachine, TransitionOutcome, TransitionPolicy};
pub use stats::OrderStats;
pub use store::{ChangeFeed, FeedMessage, OrderBackend, RedbOrderStore, StoreAccess};
pub use sync::{LiveOrderSync, SyncListener, SyncNotification};
pub use validator::validate;
