use crate::catalog::CatalogError;
use crate::orders::OrderError;
use crate::storage::StorageError;
use shared::error::ErrorCode;
use thiserror::Error;

/// Startup and wiring failures
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Work directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Order store error: {0}")]
    Orders(#[from] OrderError),

    #[error("Local storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Io(_) => ErrorCode::InternalError,
            EngineError::Orders(e) => e.code(),
            EngineError::Storage(e) => e.code(),
            EngineError::Catalog(e) => e.code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
