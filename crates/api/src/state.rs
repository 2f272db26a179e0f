//! Shared server state.

use std::sync::Arc;

use cart::InMemoryRemoteCart;
use checkout::{InMemoryOrderService, ScriptedGateway};

use crate::config::Config;

/// Shared application state accessible from all handlers.
///
/// Carts are kept per bearer token; orders and intents live in the order
/// service, which verifies payment signatures with the gateway secret.
#[derive(Debug, Clone)]
pub struct AppState {
    pub carts: InMemoryRemoteCart,
    pub orders: InMemoryOrderService,
    pub gateway: ScriptedGateway,
}

impl AppState {
    /// Creates the state for a configuration.
    pub fn new(config: &Config) -> Arc<Self> {
        let secret = config.gateway_key_secret.as_bytes().to_vec();
        let orders = InMemoryOrderService::new(secret.clone(), config.shipping())
            .with_tax_rate(config.tax_rate())
            .with_public_key(config.gateway_key_id.clone());

        Arc::new(Self {
            carts: InMemoryRemoteCart::new(),
            orders,
            gateway: ScriptedGateway::new(secret),
        })
    }
}
