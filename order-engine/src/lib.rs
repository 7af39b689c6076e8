//! Order Engine - order lifecycle and live sync for a storefront + admin console
//!
//! # Module Layout
//!
//! ```text
//! order-engine/src/
//! ├── core/          # config, composition root, startup errors
//! ├── orders/        # validator, state machine, store, client, sync, stats
//! ├── cart/          # client cart cache
//! ├── catalog/       # product API + TTL cache
//! ├── notify/        # best-effort webhook notifications
//! ├── storage/       # local key-value storage (cart, offline orders)
//! └── utils/         # logging, money, time, text folding
//! ```

pub mod cart;
pub mod catalog;
pub mod core;
pub mod notify;
pub mod orders;
pub mod storage;
pub mod utils;

// Re-export common types
pub use cart::CartCache;
pub use crate::core::{Config, EngineError, EngineState};
pub use orders::{
    CheckoutService, FilterCriteria, LiveOrderSync, OrderError, OrderResult, OrderStats,
    OrderStoreClient, SyncNotification,
};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};
