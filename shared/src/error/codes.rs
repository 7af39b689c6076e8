//! Error codes for the order engine
//!
//! Codes are grouped by range:
//! - 0xxx: General errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Product errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a plain `u16` so UI layers can switch on it without
/// parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,

    // ==================== 2xxx: Permission ====================
    /// Store refused the write
    PermissionDenied = 2001,

    // ==================== 4xxx: Order ====================
    /// Order does not exist
    OrderNotFound = 4001,
    /// Status change not allowed from the current status
    InvalidTransition = 4002,
    /// Order is in a terminal status
    OrderTerminal = 4003,

    // ==================== 6xxx: Product ====================
    /// Product does not exist
    ProductNotFound = 6001,
    /// Product API unreachable or returned garbage
    CatalogUnavailable = 6002,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Backing store unreachable
    StoreUnavailable = 9002,
    /// Local storage error
    StorageError = 9003,
    /// Notification delivery failed
    NotificationFailed = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Whether a caller may reasonably retry the same request later
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::StoreUnavailable | ErrorCode::CatalogUnavailable | ErrorCode::StorageError
        )
    }

    /// Developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Invalid status transition",
            ErrorCode::OrderTerminal => "Order is in a terminal status",
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::CatalogUnavailable => "Product catalog unavailable",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::StoreUnavailable => "Order store unavailable",
            ErrorCode::StorageError => "Local storage error",
            ErrorCode::NotificationFailed => "Notification delivery failed",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            2001 => Ok(ErrorCode::PermissionDenied),
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::OrderTerminal),
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::CatalogUnavailable),
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StoreUnavailable),
            9003 => Ok(ErrorCode::StorageError),
            9004 => Ok(ErrorCode::NotificationFailed),
            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::InvalidTransition.code(), 4002);
        assert_eq!(ErrorCode::StoreUnavailable.code(), 9002);
    }

    #[test]
    fn test_try_from_roundtrip() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::PermissionDenied,
            ErrorCode::OrderTerminal,
            ErrorCode::CatalogUnavailable,
            ErrorCode::NotificationFailed,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
        assert_eq!(ErrorCode::try_from(3), Err(InvalidErrorCode(3)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::InvalidTransition).unwrap();
        assert_eq!(json, "4002");
        let back: ErrorCode = serde_json::from_str("9002").unwrap();
        assert_eq!(back, ErrorCode::StoreUnavailable);
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::StoreUnavailable.is_retryable());
        assert!(!ErrorCode::ValidationFailed.is_retryable());
        assert!(!ErrorCode::PermissionDenied.is_retryable());
    }
}
