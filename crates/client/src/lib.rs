//! HTTP accessors for the storefront server.
//!
//! Each client implements the matching service trait, so the cart engine
//! and the checkout orchestrator run unchanged against a real server:
//! - [`RemoteCartClient`] for [`cart::RemoteCartService`]
//! - [`OrderClient`] for [`checkout::OrderMaterializationService`]
//! - [`SandboxGateway`] for [`checkout::PaymentGateway`]

pub mod config;
pub mod error;
pub mod gateway;
pub mod orders;
pub mod server_cart;
pub mod wire;

pub use config::ClientConfig;
pub use error::ClientError;
pub use gateway::SandboxGateway;
pub use orders::OrderClient;
pub use server_cart::RemoteCartClient;
