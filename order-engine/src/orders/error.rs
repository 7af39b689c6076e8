//! Order engine errors

use crate::storage::StorageError;
use shared::error::{ErrorCode, ValidationError};
use shared::order::OrderStatus;
use thiserror::Error;

/// Errors surfaced by validation, the state machine and the store client.
///
/// Store failures are reported as-is; retry and fallback are caller policy.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backing store unreachable or failing; retry or fall back
    #[error("Order store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store refused the write; retrying with the same credentials is pointless
    #[error("Write rejected: {0}")]
    WriteRejected(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::Validation(_) => ErrorCode::ValidationFailed,
            OrderError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            OrderError::WriteRejected(_) => ErrorCode::PermissionDenied,
            OrderError::InvalidTransition { from, .. } if from.is_terminal() => {
                ErrorCode::OrderTerminal
            }
            OrderError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            OrderError::NotFound(_) => ErrorCode::OrderNotFound,
            OrderError::Serialization(_) | OrderError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the offline fallback path applies
    pub fn is_unavailable(&self) -> bool {
        matches!(self, OrderError::StoreUnavailable(_))
    }
}

impl From<StorageError> for OrderError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => OrderError::Serialization(e),
            other => OrderError::StoreUnavailable(other.to_string()),
        }
    }
}

macro_rules! unavailable_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for OrderError {
            fn from(err: $ty) -> Self {
                OrderError::StoreUnavailable(err.to_string())
            }
        })*
    };
}

unavailable_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError
);

pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = OrderError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Delivered,
        };
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
        assert_eq!(err.to_string(), "Invalid transition: pendiente -> entregado");

        let err = OrderError::InvalidTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Pending,
        };
        assert_eq!(err.code(), ErrorCode::OrderTerminal);

        assert!(OrderError::StoreUnavailable("down".into()).is_unavailable());
        assert_eq!(
            OrderError::WriteRejected("read-only".into()).code(),
            ErrorCode::PermissionDenied
        );
    }

    #[test]
    fn test_validation_message_is_transparent() {
        let err: OrderError = ValidationError::single("total", "total must be greater than 0").into();
        assert_eq!(err.to_string(), "Validation failed: total must be greater than 0");
    }
}
