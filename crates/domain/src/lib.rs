//! Domain layer for the storefront cart and checkout.
//!
//! This crate provides the pure, I/O-free building blocks:
//! - Cart model with merge-by-identity mutations
//! - Pricing calculator
//! - Shipping address validation and the checkout draft
//! - Payment intent/proof types and the payment signature scheme
//! - The server-owned order record

pub mod cart;
pub mod checkout;
pub mod error;
pub mod order;
pub mod pricing;

pub use cart::{
    Cart, CartError, CartLineItem, CartMutation, LineIdentity, Money, ProductSnapshot,
    VariantSummary,
};
pub use checkout::{
    AddressRules, CheckoutDraft, PaymentIntent, PaymentProof, ShippingAddress, ValidationErrors,
    VerifyPaymentRequest, sign_payment, verify_payment_signature,
};
pub use error::DomainError;
pub use order::{Order, OrderLine, OrderStatus, PaymentStatus};
pub use pricing::{PricingBreakdown, ShippingQuote, TaxRate, price, price_lines};
