//! Cart consistency engine.
//!
//! Guests keep their cart in local storage; signed-in shoppers keep it on the
//! server, mirrored in a versioned cache and mutated optimistically. The
//! authority is decided per call from the current [`AuthProvider`].

pub mod auth;
pub mod engine;
pub mod error;
pub mod remote;
pub mod retry;

pub use auth::{AuthProvider, AuthSession};
pub use engine::{CartAuthority, CartEngine, SERVER_CART_KEY};
pub use error::{EngineError, Result};
pub use remote::{InMemoryRemoteCart, MutationResponse, RemoteCartService};
pub use retry::{MAX_ATTEMPTS, RetryPolicy};
