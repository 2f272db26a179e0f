//! Versioned cache of server carts.
//!
//! Supports the optimistic mutation cycle used for authenticated carts:
//!
//! ```text
//! cancel_refetch ──► snapshot ──► set(optimistic) ──► network
//!                                                      │
//!                              success ◄───────────────┤
//!                              invalidate              │
//!                                                      ▼
//!                                           failure: rollback(snapshot)
//! ```
//!
//! Fetches are ticketed: a fetch started before `cancel_refetch` cannot
//! overwrite the optimistic value when it completes.

use std::collections::HashMap;
use std::sync::Arc;

use domain::Cart;
use tokio::sync::RwLock;

/// Version of a cache entry. Bumped by every write, including restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CacheVersion(u64);

impl CacheVersion {
    /// Returns the version of a key that was never written.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The value of one key captured before an optimistic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot {
    key: String,
    cart: Option<Cart>,
    stale: bool,
    version: CacheVersion,
}

impl CacheSnapshot {
    /// Returns the captured cart, if the key held one.
    pub fn cart(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    /// Returns the version at capture time.
    pub fn version(&self) -> CacheVersion {
        self.version
    }
}

/// Permission to store the result of a fetch, valid until the next
/// `cancel_refetch` on the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: String,
    generation: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    cart: Cart,
    version: CacheVersion,
    stale: bool,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    versions: HashMap<String, CacheVersion>,
    generations: HashMap<String, u64>,
    epoch: u64,
}

impl Inner {
    fn bump(&mut self, key: &str) -> CacheVersion {
        let version = self.versions.entry(key.to_string()).or_default();
        *version = version.next();
        *version
    }

    fn generation(&self, key: &str) -> u64 {
        self.epoch + self.generations.get(key).copied().unwrap_or_default()
    }

    fn restore(&mut self, snapshot: CacheSnapshot) -> CacheVersion {
        let version = self.bump(&snapshot.key);
        match snapshot.cart {
            Some(cart) => {
                self.entries.insert(
                    snapshot.key,
                    Entry {
                        cart,
                        version,
                        stale: snapshot.stale,
                    },
                );
            }
            None => {
                self.entries.remove(&snapshot.key);
            }
        }
        tracing::debug!(%version, "restored cart cache snapshot");
        version
    }
}

/// Shared, versioned cache of carts keyed by cart key.
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone, Default)]
pub struct CartCache {
    inner: Arc<RwLock<Inner>>,
}

impl CartCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached cart, fresh or stale.
    pub async fn get(&self, key: &str) -> Option<Cart> {
        self.inner
            .read()
            .await
            .entries
            .get(key)
            .map(|e| e.cart.clone())
    }

    /// Returns the cached cart only if it has not been invalidated.
    pub async fn get_fresh(&self, key: &str) -> Option<Cart> {
        self.inner
            .read()
            .await
            .entries
            .get(key)
            .filter(|e| !e.stale)
            .map(|e| e.cart.clone())
    }

    /// Returns the current version of `key`.
    pub async fn version(&self, key: &str) -> CacheVersion {
        self.inner
            .read()
            .await
            .versions
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    /// Stores a fresh cart under `key` and cancels its pending fetches.
    pub async fn set(&self, key: &str, cart: Cart) -> CacheVersion {
        let mut inner = self.inner.write().await;
        *inner.generations.entry(key.to_string()).or_default() += 1;
        let version = inner.bump(key);
        inner.entries.insert(
            key.to_string(),
            Entry {
                cart,
                version,
                stale: false,
            },
        );
        version
    }

    /// Captures the current value of `key`.
    pub async fn snapshot(&self, key: &str) -> CacheSnapshot {
        let inner = self.inner.read().await;
        let entry = inner.entries.get(key);
        CacheSnapshot {
            key: key.to_string(),
            cart: entry.map(|e| e.cart.clone()),
            stale: entry.is_some_and(|e| e.stale),
            version: entry.map(|e| e.version).unwrap_or_default(),
        }
    }

    /// Puts a snapshot back, discarding whatever was written since.
    ///
    /// The restored value gets a new version.
    pub async fn restore(&self, snapshot: CacheSnapshot) -> CacheVersion {
        self.inner.write().await.restore(snapshot)
    }

    /// Undoes the optimistic write that produced version `written`.
    ///
    /// When `key` was written again after `written`, the snapshot may predate
    /// that write: it is restored stale so the next read refetches.
    pub async fn rollback(
        &self,
        mut snapshot: CacheSnapshot,
        written: CacheVersion,
    ) -> CacheVersion {
        let mut inner = self.inner.write().await;
        let current = inner.versions.get(&snapshot.key).copied().unwrap_or_default();
        if current != written {
            tracing::debug!(key = %snapshot.key, "rolling back under a concurrent write");
            snapshot.stale = true;
        }
        inner.restore(snapshot)
    }

    /// Marks `key` stale so the next read refetches it. The value stays
    /// readable through [`CartCache::get`].
    pub async fn invalidate(&self, key: &str) {
        if let Some(entry) = self.inner.write().await.entries.get_mut(key) {
            entry.stale = true;
        }
    }

    /// Cancels every fetch of `key` started before this call.
    pub async fn cancel_refetch(&self, key: &str) {
        let mut inner = self.inner.write().await;
        *inner.generations.entry(key.to_string()).or_default() += 1;
    }

    /// Starts a fetch of `key`.
    pub async fn begin_fetch(&self, key: &str) -> FetchTicket {
        FetchTicket {
            key: key.to_string(),
            generation: self.inner.read().await.generation(key),
        }
    }

    /// Stores a fetched cart unless the fetch was cancelled since
    /// `begin_fetch`. Returns whether the cart was stored.
    pub async fn complete_fetch(&self, ticket: FetchTicket, cart: Cart) -> bool {
        let mut inner = self.inner.write().await;
        if inner.generation(&ticket.key) != ticket.generation {
            tracing::debug!(key = %ticket.key, "discarding cancelled cart fetch");
            return false;
        }
        let version = inner.bump(&ticket.key);
        inner.entries.insert(
            ticket.key,
            Entry {
                cart,
                version,
                stale: false,
            },
        );
        true
    }

    /// Removes `key` and cancels its pending fetches.
    pub async fn remove(&self, key: &str) {
        let mut inner = self.inner.write().await;
        inner.entries.remove(key);
        *inner.generations.entry(key.to_string()).or_default() += 1;
    }

    /// Removes every entry and cancels every pending fetch.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.epoch += 1;
    }
}
