//! Shared identifiers and the error taxonomy used at every network seam.

pub mod remote;
pub mod types;

pub use remote::RemoteError;
pub use types::{AuthToken, GatewayOrderId, OrderId, PaymentId, ProductId, VariantId};
