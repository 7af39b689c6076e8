//! Core: configuration, wiring and startup errors
//!
//! - [`Config`] - environment driven settings
//! - [`EngineState`] - composition root
//! - [`EngineError`] - startup failures

pub mod config;
pub mod error;
pub mod state;

pub use config::Config;
pub use error::{EngineError, Result};
pub use state::{EngineState, build_notifier};
