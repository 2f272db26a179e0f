//! The cart consistency engine.

use cart_store::{CartCache, KeyValueStore, LocalCartStore};
use common::{AuthToken, RemoteError};
use domain::{Cart, CartLineItem, CartMutation, LineIdentity};
use tokio::sync::Mutex;

use crate::auth::AuthProvider;
use crate::error::Result;
use crate::remote::RemoteCartService;
use crate::retry::RetryPolicy;

/// Cache key of the signed-in shopper's server cart.
pub const SERVER_CART_KEY: &str = "server_cart";

/// Which copy of the cart an operation reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAuthority {
    /// Guest cart in local storage. No network.
    Local,
    /// Server cart of the signed-in shopper, mirrored in the cache.
    Remote(AuthToken),
}

impl CartAuthority {
    /// Returns the authority name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            CartAuthority::Local => "local",
            CartAuthority::Remote(_) => "remote",
        }
    }
}

/// Keeps the shopper's cart consistent across local storage and the server.
///
/// Authentication is checked on every call:
///
/// - **Guest**: read the full cart from local storage, apply the mutation in
///   memory, write the full cart back.
/// - **Signed in**: cancel pending refetches, snapshot the cached server
///   cart, store the optimistic result, then call the server. Success marks
///   the cache stale so the next read reconciles; failure restores the
///   snapshot and returns the error. Rapid mutations each snapshot the
///   previous optimistic write; a rollback that lands under a later write
///   leaves the cache stale.
///
/// Both branches apply the same [`CartMutation`], so lines merge by identity
/// the same way in either mode. Failed mutations are never retried here.
pub struct CartEngine<S, R, A>
where
    S: KeyValueStore,
    R: RemoteCartService,
    A: AuthProvider,
{
    local: LocalCartStore<S>,
    remote: R,
    auth: A,
    cache: CartCache,
    cache_owner: Mutex<Option<AuthToken>>,
    writer: Mutex<()>,
    fetch_retry: RetryPolicy,
}

impl<S, R, A> CartEngine<S, R, A>
where
    S: KeyValueStore,
    R: RemoteCartService,
    A: AuthProvider,
{
    /// Creates a new engine with an empty cache and a single fetch retry.
    pub fn new(store: S, remote: R, auth: A) -> Self {
        Self {
            local: LocalCartStore::new(store),
            remote,
            auth,
            cache: CartCache::new(),
            cache_owner: Mutex::new(None),
            writer: Mutex::new(()),
            fetch_retry: RetryPolicy::single_retry(),
        }
    }

    /// Sets the retry policy used for cart fetches.
    pub fn with_fetch_retry(mut self, policy: RetryPolicy) -> Self {
        self.fetch_retry = policy;
        self
    }

    /// Returns the server cart cache.
    pub fn cache(&self) -> &CartCache {
        &self.cache
    }

    /// Returns the guest cart store.
    pub fn local(&self) -> &LocalCartStore<S> {
        &self.local
    }

    /// Returns the server cart service.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Returns the authentication source.
    pub fn auth(&self) -> &A {
        &self.auth
    }

    /// Decides the authority for one call.
    ///
    /// The cached server cart belongs to one shopper; it is dropped when the
    /// signed-in token changes.
    pub async fn authority(&self) -> CartAuthority {
        let token = self.auth.token();
        let mut owner = self.cache_owner.lock().await;
        if *owner != token {
            self.cache.remove(SERVER_CART_KEY).await;
            *owner = token.clone();
        }
        match token {
            Some(token) => CartAuthority::Remote(token),
            None => CartAuthority::Local,
        }
    }

    /// Returns the current cart.
    ///
    /// Signed-in reads are served from the cache while it is fresh and
    /// fetched otherwise, with a single retry on transient failures.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Cart> {
        match self.authority().await {
            CartAuthority::Local => Ok(self.local.load().await?),
            CartAuthority::Remote(token) => {
                if let Some(cart) = self.cache.get_fresh(SERVER_CART_KEY).await {
                    return Ok(cart);
                }
                let ticket = self.cache.begin_fetch(SERVER_CART_KEY).await;
                let cart = self.fetch(&token).await?;
                if self.cache.complete_fetch(ticket, cart.clone()).await {
                    return Ok(cart);
                }
                // A mutation started while fetching; its optimistic value wins.
                Ok(self.cache.get(SERVER_CART_KEY).await.unwrap_or(cart))
            }
        }
    }

    /// Adds a line, or increases the quantity of the line with the same
    /// identity.
    #[tracing::instrument(skip(self, item), fields(identity = %item.identity(), quantity = item.quantity))]
    pub async fn add_item(&self, item: CartLineItem) -> Result<Cart> {
        self.mutate(CartMutation::add(item)).await
    }

    /// Sets the quantity of a line. Unknown identities leave the cart
    /// unchanged; a quantity of zero is rejected.
    #[tracing::instrument(skip(self, identity), fields(identity = %identity))]
    pub async fn update_quantity(&self, identity: LineIdentity, quantity: u32) -> Result<Cart> {
        self.mutate(CartMutation::update_quantity(identity, quantity))
            .await
    }

    /// Removes a line. Unknown identities leave the cart unchanged.
    #[tracing::instrument(skip(self, identity), fields(identity = %identity))]
    pub async fn remove_item(&self, identity: LineIdentity) -> Result<Cart> {
        self.mutate(CartMutation::remove(identity)).await
    }

    /// Removes every line.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart> {
        self.mutate(CartMutation::Clear).await
    }

    /// Fetches the server cart in the background.
    ///
    /// The result is stored only if no mutation started in the meantime.
    /// Returns whether the fetched cart was stored. Guests have nothing to
    /// refetch.
    #[tracing::instrument(skip(self))]
    pub async fn refetch(&self) -> Result<bool> {
        let CartAuthority::Remote(token) = self.authority().await else {
            return Ok(false);
        };
        let ticket = self.cache.begin_fetch(SERVER_CART_KEY).await;
        let cart = self.fetch(&token).await?;
        let stored = self.cache.complete_fetch(ticket, cart).await;
        if !stored {
            tracing::debug!("refetch superseded by a mutation");
        }
        Ok(stored)
    }

    /// Moves the guest cart into the signed-in shopper's server cart.
    ///
    /// Never runs on its own at login. Each guest line is added through the
    /// normal signed-in path, so it merges with matching server lines, and is
    /// dropped from local storage once the server accepted it. A failure stops
    /// the adoption with the remaining lines still in local storage.
    #[tracing::instrument(skip(self))]
    pub async fn adopt_guest_cart(&self) -> Result<Cart> {
        let CartAuthority::Remote(token) = self.authority().await else {
            return Err(RemoteError::AuthRequired.into());
        };

        let mut guest = self.local.load().await?;
        if guest.is_empty() {
            return self.get_cart().await;
        }

        let lines = guest.items().to_vec();
        let mut cart = Cart::new();
        for item in lines {
            let identity = item.identity();
            cart = self
                .mutate_remote(&token, &CartMutation::add(item))
                .await?;
            guest = CartMutation::remove(identity).apply(&guest)?;
            if guest.is_empty() {
                self.local.clear().await?;
            } else {
                self.local.save(&guest).await?;
            }
        }

        tracing::info!(lines = cart.line_count(), "adopted guest cart");
        Ok(cart)
    }

    async fn mutate(&self, mutation: CartMutation) -> Result<Cart> {
        mutation.validate()?;

        let authority = self.authority().await;
        metrics::counter!(
            "cart_mutations_total",
            "op" => mutation.name(),
            "authority" => authority.name()
        )
        .increment(1);

        match authority {
            CartAuthority::Local => self.mutate_local(&mutation).await,
            CartAuthority::Remote(token) => self.mutate_remote(&token, &mutation).await,
        }
    }

    async fn mutate_local(&self, mutation: &CartMutation) -> Result<Cart> {
        let current = self.local.load().await?;
        let next = mutation.apply(&current)?;
        self.local.save(&next).await?;
        Ok(next)
    }

    async fn mutate_remote(&self, token: &AuthToken, mutation: &CartMutation) -> Result<Cart> {
        // Cold load, snapshot and optimistic write run one mutation at a time;
        // the network call does not.
        let (snapshot, written) = {
            let _writer = self.writer.lock().await;
            self.cache.cancel_refetch(SERVER_CART_KEY).await;

            if self.cache.get(SERVER_CART_KEY).await.is_none() {
                let ticket = self.cache.begin_fetch(SERVER_CART_KEY).await;
                let cart = self.fetch(token).await?;
                if !self.cache.complete_fetch(ticket, cart).await {
                    tracing::debug!("cold cart load superseded");
                }
            }

            let snapshot = self.cache.snapshot(SERVER_CART_KEY).await;
            let base = snapshot.cart().cloned().unwrap_or_default();
            let optimistic = mutation.apply(&base)?;
            let written = self.cache.set(SERVER_CART_KEY, optimistic).await;
            (snapshot, written)
        };

        match self.remote.apply(token, mutation).await {
            Ok(cart) => {
                self.cache.invalidate(SERVER_CART_KEY).await;
                Ok(cart)
            }
            Err(e) => {
                self.cache.rollback(snapshot, written).await;
                metrics::counter!("cart_rollbacks_total", "op" => mutation.name()).increment(1);
                tracing::warn!(op = mutation.name(), error = %e, "server cart mutation rolled back");
                Err(e.into())
            }
        }
    }

    async fn fetch(&self, token: &AuthToken) -> std::result::Result<Cart, RemoteError> {
        self.fetch_retry
            .run(|| self.remote.fetch_cart(token))
            .await
    }
}
