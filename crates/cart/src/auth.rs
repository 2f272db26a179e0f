//! Authentication state consulted by the cart engine on every call.

use std::sync::Arc;

use common::AuthToken;
use tokio::sync::watch;

/// Source of the current bearer token.
///
/// The engine asks on every operation, so a login or logout between two
/// calls switches the cart authority immediately.
pub trait AuthProvider: Send + Sync {
    /// Returns the current token, or `None` for a guest.
    fn token(&self) -> Option<AuthToken>;

    /// Returns true if a shopper is signed in.
    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Shared, observable sign-in state.
#[derive(Debug, Clone)]
pub struct AuthSession {
    state: Arc<watch::Sender<Option<AuthToken>>>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::guest()
    }
}

impl AuthSession {
    /// Creates a session with no signed-in shopper.
    pub fn guest() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(None)),
        }
    }

    /// Creates a session already signed in with `token`.
    pub fn signed_in(token: AuthToken) -> Self {
        Self {
            state: Arc::new(watch::Sender::new(Some(token))),
        }
    }

    /// Signs a shopper in.
    pub fn login(&self, token: AuthToken) {
        self.state.send_replace(Some(token));
        tracing::info!("shopper signed in");
    }

    /// Signs the shopper out.
    pub fn logout(&self) {
        if self.state.send_replace(None).is_some() {
            tracing::info!("shopper signed out");
        }
    }

    /// Returns a receiver notified on every login and logout.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthToken>> {
        self.state.subscribe()
    }
}

impl AuthProvider for AuthSession {
    fn token(&self) -> Option<AuthToken> {
        self.state.borrow().clone()
    }
}
