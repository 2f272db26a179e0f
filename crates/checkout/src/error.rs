//! Checkout error types.

use cart::EngineError;
use common::RemoteError;
use domain::ValidationErrors;
use thiserror::Error;

use crate::state::CheckoutState;

/// Errors returned by checkout operations.
///
/// Whenever a checkout fails the orchestrator is back in `Idle` before the
/// error is returned.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A checkout is already running.
    #[error("Checkout already in progress ({state})")]
    Busy { state: CheckoutState },

    /// The address or cart failed validation.
    #[error("Invalid checkout: {0}")]
    Validation(#[from] ValidationErrors),

    /// The cart could not be read.
    #[error("Cart error: {0}")]
    Cart(#[from] EngineError),

    /// The shipping quote could not be fetched.
    #[error("Shipping quote failed: {0}")]
    ShippingQuote(RemoteError),

    /// The server did not open a payment intent.
    #[error("Payment intent creation failed: {0}")]
    IntentCreation(RemoteError),

    /// The payment step ended without a payment.
    #[error("Payment cancelled: {reason}")]
    PaymentCancelled { reason: String },

    /// The server refused the payment proof.
    #[error("Payment verification failed: {0}")]
    Verification(RemoteError),

    /// There is no cancelled checkout to retry.
    #[error("No checkout draft to retry")]
    NoDraft,

    /// An order lookup failed.
    #[error("Order lookup failed: {0}")]
    OrderLookup(RemoteError),
}

impl CheckoutError {
    /// Returns the failure label used in metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::Busy { .. } => "busy",
            CheckoutError::Validation(_) => "validation",
            CheckoutError::Cart(_) => "cart",
            CheckoutError::ShippingQuote(_) => "shipping_quote",
            CheckoutError::IntentCreation(_) => "intent_creation",
            CheckoutError::PaymentCancelled { .. } => "payment_cancelled",
            CheckoutError::Verification(_) => "verification",
            CheckoutError::NoDraft => "no_draft",
            CheckoutError::OrderLookup(_) => "order_lookup",
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
