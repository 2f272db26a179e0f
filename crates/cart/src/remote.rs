//! Server cart service trait and in-memory implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{AuthToken, RemoteError};
use domain::{Cart, CartLineItem, CartMutation, LineIdentity};

/// Trait for the server-side cart of a signed-in shopper.
///
/// Every call returns the server's cart after the operation. `update_quantity`
/// and `remove_item` on an absent identity leave the cart unchanged.
#[async_trait]
pub trait RemoteCartService: Send + Sync {
    /// Fetches the shopper's cart.
    async fn fetch_cart(&self, token: &AuthToken) -> Result<Cart, RemoteError>;

    /// Adds a line, merging by identity.
    async fn add_item(&self, token: &AuthToken, item: &CartLineItem) -> Result<Cart, RemoteError>;

    /// Sets the quantity of the matching line.
    async fn update_quantity(
        &self,
        token: &AuthToken,
        identity: &LineIdentity,
        quantity: u32,
    ) -> Result<Cart, RemoteError>;

    /// Removes the matching line.
    async fn remove_item(
        &self,
        token: &AuthToken,
        identity: &LineIdentity,
    ) -> Result<Cart, RemoteError>;

    /// Removes every line.
    async fn clear(&self, token: &AuthToken) -> Result<Cart, RemoteError>;

    /// Sends a mutation to the matching endpoint.
    async fn apply(&self, token: &AuthToken, mutation: &CartMutation) -> Result<Cart, RemoteError> {
        match mutation {
            CartMutation::AddItem { item } => self.add_item(token, item).await,
            CartMutation::UpdateQuantity { identity, quantity } => {
                self.update_quantity(token, identity, *quantity).await
            }
            CartMutation::RemoveItem { identity } => self.remove_item(token, identity).await,
            CartMutation::Clear => self.clear(token).await,
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryRemoteCartState {
    carts: HashMap<AuthToken, Cart>,
    fetch_count: usize,
    mutation_count: usize,
    fail_mutations: bool,
    fetch_failures_remaining: usize,
    reject_auth: bool,
    fetch_delay: Option<Duration>,
    mutation_script: VecDeque<MutationResponse>,
}

/// How the in-memory server answers one mutation.
///
/// The mutation is applied (or refused) when it arrives; the response is
/// returned after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationResponse {
    pub delay: Duration,
    pub succeed: bool,
}

impl MutationResponse {
    /// Applies the mutation and answers after `delay`.
    pub fn ok_after(delay: Duration) -> Self {
        Self {
            delay,
            succeed: true,
        }
    }

    /// Refuses the mutation as unreachable and answers after `delay`.
    pub fn fail_after(delay: Duration) -> Self {
        Self {
            delay,
            succeed: false,
        }
    }
}

/// In-memory server cart for testing.
///
/// Keeps one cart per token and applies mutations with the same merge rule
/// as the client.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemoteCart {
    state: Arc<RwLock<InMemoryRemoteCartState>>,
}

impl InMemoryRemoteCart {
    /// Creates a new in-memory server cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the server cart of `token`.
    pub fn seed(&self, token: &AuthToken, cart: Cart) {
        self.state.write().unwrap().carts.insert(token.clone(), cart);
    }

    /// Returns the server cart of `token`.
    pub fn cart_for(&self, token: &AuthToken) -> Cart {
        self.state
            .read()
            .unwrap()
            .carts
            .get(token)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every mutation fail as if the network were down.
    pub fn set_fail_mutations(&self, fail: bool) {
        self.state.write().unwrap().fail_mutations = fail;
    }

    /// Makes the next `count` fetches fail as if the network were down.
    pub fn fail_next_fetches(&self, count: usize) {
        self.state.write().unwrap().fetch_failures_remaining = count;
    }

    /// Makes every call fail with 401.
    pub fn set_reject_auth(&self, reject: bool) {
        self.state.write().unwrap().reject_auth = reject;
    }

    /// Delays every fetch by `delay`.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        self.state.write().unwrap().fetch_delay = delay;
    }

    /// Queues the response of the next mutation. Unscripted mutations follow
    /// the failure toggles and answer at once.
    pub fn queue_mutation(&self, response: MutationResponse) {
        self.state
            .write()
            .unwrap()
            .mutation_script
            .push_back(response);
    }

    /// Returns the number of fetch calls received.
    pub fn fetch_count(&self) -> usize {
        self.state.read().unwrap().fetch_count
    }

    /// Returns the number of mutation calls received.
    pub fn mutation_count(&self) -> usize {
        self.state.read().unwrap().mutation_count
    }

    async fn mutate(&self, token: &AuthToken, mutation: CartMutation) -> Result<Cart, RemoteError> {
        let (result, delay) = {
            let mut state = self.state.write().unwrap();
            state.mutation_count += 1;
            let scripted = state.mutation_script.pop_front();
            let delay = scripted.map(|r| r.delay);
            let fail = scripted.map_or(state.fail_mutations, |r| !r.succeed);

            let result = if state.reject_auth {
                Err(RemoteError::AuthRequired)
            } else if fail {
                Err(RemoteError::Transient("network unreachable".to_string()))
            } else {
                let current = state.carts.get(token).cloned().unwrap_or_default();
                match mutation.apply(&current) {
                    Ok(next) => {
                        state.carts.insert(token.clone(), next.clone());
                        Ok(next)
                    }
                    Err(e) => Err(RemoteError::Rejected {
                        status: 422,
                        message: e.to_string(),
                    }),
                }
            };
            (result, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl RemoteCartService for InMemoryRemoteCart {
    async fn fetch_cart(&self, token: &AuthToken) -> Result<Cart, RemoteError> {
        let delay = self.state.read().unwrap().fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        state.fetch_count += 1;

        if state.reject_auth {
            return Err(RemoteError::AuthRequired);
        }
        if state.fetch_failures_remaining > 0 {
            state.fetch_failures_remaining -= 1;
            return Err(RemoteError::Transient("connection reset".to_string()));
        }

        Ok(state.carts.get(token).cloned().unwrap_or_default())
    }

    async fn add_item(&self, token: &AuthToken, item: &CartLineItem) -> Result<Cart, RemoteError> {
        self.mutate(token, CartMutation::add(item.clone())).await
    }

    async fn update_quantity(
        &self,
        token: &AuthToken,
        identity: &LineIdentity,
        quantity: u32,
    ) -> Result<Cart, RemoteError> {
        self.mutate(
            token,
            CartMutation::update_quantity(identity.clone(), quantity),
        )
        .await
    }

    async fn remove_item(
        &self,
        token: &AuthToken,
        identity: &LineIdentity,
    ) -> Result<Cart, RemoteError> {
        self.mutate(token, CartMutation::remove(identity.clone())).await
    }

    async fn clear(&self, token: &AuthToken) -> Result<Cart, RemoteError> {
        self.mutate(token, CartMutation::Clear).await
    }
}
