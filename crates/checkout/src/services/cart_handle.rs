//! The orchestrator's view of the shopper's cart.

use std::sync::Arc;

use async_trait::async_trait;
use cart::{AuthProvider, CartEngine, EngineError, RemoteCartService};
use cart_store::KeyValueStore;
use domain::Cart;

/// Cart access needed by checkout: read it to build the draft, clear it once
/// the order exists.
#[async_trait]
pub trait CartHandle: Send + Sync {
    /// Returns the current cart.
    async fn current_cart(&self) -> Result<Cart, EngineError>;

    /// Empties the cart.
    async fn clear_cart(&self) -> Result<(), EngineError>;
}

#[async_trait]
impl<S, R, A> CartHandle for CartEngine<S, R, A>
where
    S: KeyValueStore,
    R: RemoteCartService,
    A: AuthProvider,
{
    async fn current_cart(&self) -> Result<Cart, EngineError> {
        self.get_cart().await
    }

    async fn clear_cart(&self) -> Result<(), EngineError> {
        self.clear().await.map(|_| ())
    }
}

#[async_trait]
impl<T: CartHandle + ?Sized> CartHandle for Arc<T> {
    async fn current_cart(&self) -> Result<Cart, EngineError> {
        (**self).current_cart().await
    }

    async fn clear_cart(&self) -> Result<(), EngineError> {
        (**self).clear_cart().await
    }
}
