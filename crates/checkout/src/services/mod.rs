//! External service traits and in-memory implementations for checkout steps.

pub mod cart_handle;
pub mod gateway;
pub mod orders;

pub use cart_handle::CartHandle;
pub use gateway::{GatewayStep, PaymentGateway, PaymentOutcome, ScriptedGateway};
pub use orders::{InMemoryOrderService, OrderMaterializationService};
