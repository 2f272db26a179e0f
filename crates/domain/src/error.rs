//! Domain error types.

use thiserror::Error;

use crate::cart::CartError;
use crate::checkout::ValidationErrors;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A cart mutation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Shipping address validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
