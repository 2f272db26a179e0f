use domain::Cart;

use crate::{KeyValueStore, Result};

/// Well-known key the guest cart is stored under.
pub const GUEST_CART_KEY: &str = "guest_cart";

/// The guest cart, persisted as one serialized [`Cart`] value.
///
/// An absent key is an empty cart. A value that no longer parses is logged
/// and also treated as an empty cart, so a corrupt entry never blocks the
/// shopper; the next save overwrites it.
#[derive(Clone)]
pub struct LocalCartStore<S> {
    store: S,
}

impl<S: KeyValueStore> LocalCartStore<S> {
    /// Creates a guest cart store on top of a key/value store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying key/value store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Reads the full guest cart.
    pub async fn load(&self) -> Result<Cart> {
        let Some(raw) = self.store.get(GUEST_CART_KEY).await? else {
            return Ok(Cart::new());
        };
        match serde_json::from_str(&raw) {
            Ok(cart) => Ok(cart),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable guest cart");
                metrics::counter!("guest_cart_discarded_total").increment(1);
                Ok(Cart::new())
            }
        }
    }

    /// Writes the full guest cart in one operation.
    pub async fn save(&self, cart: &Cart) -> Result<()> {
        let raw = serde_json::to_string(cart)?;
        self.store.set(GUEST_CART_KEY, &raw).await
    }

    /// Removes the guest cart.
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(GUEST_CART_KEY).await
    }
}
