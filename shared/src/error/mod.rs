//! Error types shared by the order engine and its callers
//!
//! - [`ErrorCode`]: stable numeric codes, grouped by domain
//! - [`ValidationError`]: every field-level problem found in an order payload

mod codes;
mod validation;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use validation::{FieldViolation, ValidationError};
