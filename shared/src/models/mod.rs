//! Data models consumed from external APIs

pub mod product;

// Re-exports
pub use product::*;
