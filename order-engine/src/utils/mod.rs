//! Utility module
//!
//! - [`logger`]: tracing setup and audit macro
//! - [`money`]: decimal-safe totals
//! - [`time`]: millis and local-day boundaries
//! - [`text`]: search folding

pub mod logger;
pub mod money;
pub mod text;
pub mod time;

pub use time::now_millis;
