//! Payment intent, payment proof and the gateway signature scheme.
//!
//! The gateway signs a successful payment as
//! `hex(HMAC-SHA256(key_secret, "{gateway_order_id}|{payment_id}"))`.
//! Only the server holds the key secret; the client forwards the proof
//! untouched.

use common::{GatewayOrderId, PaymentId};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::CheckoutDraft;

type HmacSha256 = Hmac<Sha256>;

/// A gateway-side order opened for an amount. Implies no business order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub gateway_order_id: GatewayOrderId,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    /// Publishable key the payment widget is opened with.
    pub gateway_public_key: String,
}

/// Proof of payment delivered by the gateway's success callback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentProof {
    pub gateway_order_id: GatewayOrderId,
    pub payment_id: PaymentId,
    pub signature: String,
}

/// Body of the verify-and-create call: the proof plus the original draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(flatten)]
    pub proof: PaymentProof,
    pub draft: CheckoutDraft,
}

fn payload(gateway_order_id: &GatewayOrderId, payment_id: &PaymentId) -> String {
    format!("{gateway_order_id}|{payment_id}")
}

/// Computes the gateway signature for a payment.
pub fn sign_payment(
    key_secret: &[u8],
    gateway_order_id: &GatewayOrderId,
    payment_id: &PaymentId,
) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key_secret)?;
    mac.update(payload(gateway_order_id, payment_id).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a payment proof in constant time.
pub fn verify_payment_signature(key_secret: &[u8], proof: &PaymentProof) -> bool {
    let Ok(expected) = hex::decode(&proof.signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key_secret) else {
        return false;
    };
    mac.update(payload(&proof.gateway_order_id, &proof.payment_id).as_bytes());
    mac.verify_slice(&expected).is_ok()
}
