//! Client-side cart storage.
//!
//! - [`KeyValueStore`] with in-memory and SQLite backends for durable
//!   client state
//! - [`LocalCartStore`], the guest cart persisted under one well-known key
//! - [`CartCache`], the versioned cache of server carts used for
//!   optimistic mutations

pub mod cache;
pub mod error;
pub mod kv;
pub mod local;
pub mod memory;
pub mod sqlite;

pub use cache::{CacheSnapshot, CacheVersion, CartCache, FetchTicket};
pub use error::{Result, StoreError};
pub use kv::KeyValueStore;
pub use local::{GUEST_CART_KEY, LocalCartStore};
pub use memory::InMemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;
