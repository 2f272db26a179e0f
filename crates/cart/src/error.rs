//! Cart engine error types.

use cart_store::StoreError;
use common::RemoteError;
use domain::CartError;
use thiserror::Error;

/// Errors surfaced by cart engine operations.
///
/// A failed operation never leaves a partially applied cart behind: guest
/// carts are written in one piece and server cart mutations are rolled back
/// before the error is returned.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The mutation was rejected before touching storage or the network.
    #[error("Invalid cart mutation: {0}")]
    Cart(#[from] CartError),

    /// Local storage failed.
    #[error("Cart storage error: {0}")]
    Store(#[from] StoreError),

    /// The server cart call failed.
    #[error("Server cart error: {0}")]
    Remote(#[from] RemoteError),
}

impl EngineError {
    /// Returns true if the server rejected the call as unauthenticated.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, EngineError::Remote(RemoteError::AuthRequired))
    }

    /// Returns true if a caller may repeat the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Remote(e) if e.is_retryable())
    }
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;
