//! Checkout draft, shipping address validation and payment types.

mod address;
mod draft;
mod payment;

pub use address::{AddressRules, ShippingAddress, ValidationErrors};
pub use draft::CheckoutDraft;
pub use payment::{
    PaymentIntent, PaymentProof, VerifyPaymentRequest, sign_payment, verify_payment_signature,
};
