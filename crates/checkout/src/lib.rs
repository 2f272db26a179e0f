//! Checkout orchestration for the storefront.
//!
//! This crate provides:
//! - The checkout state machine and its transition history
//! - Service traits for the order server, the payment gateway and the cart
//! - The orchestrator that drives one checkout at a time from the shipping
//!   form to a verified order

pub mod cancel;
pub mod config;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod services;
pub mod state;

pub use cancel::CancelHandle;
pub use config::CheckoutConfig;
pub use error::{CheckoutError, Result};
pub use history::{TransitionRecord, visited_states};
pub use orchestrator::CheckoutOrchestrator;
pub use services::{
    CartHandle, GatewayStep, InMemoryOrderService, OrderMaterializationService, PaymentGateway,
    PaymentOutcome, ScriptedGateway,
};
pub use state::{CheckoutEvent, CheckoutState, transition};
