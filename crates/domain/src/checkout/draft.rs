//! The checkout draft.

use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLineItem};
use crate::pricing::{PricingBreakdown, ShippingQuote, TaxRate, price};

use super::{AddressRules, ShippingAddress, ValidationErrors};

/// Everything the server needs to open a payment and later materialize the
/// order: the lines snapshotted from the cart when checkout began, the
/// computed pricing, and the shipping address.
///
/// Held only by the checkout orchestrator for the duration of one checkout
/// and re-sent verbatim with the payment proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub lines: Vec<CartLineItem>,
    pub pricing: PricingBreakdown,
    pub address: ShippingAddress,
    pub currency: String,
}

impl CheckoutDraft {
    /// Validates the address and cart, then snapshots the cart lines and
    /// prices them.
    ///
    /// An empty cart is reported under the `cart` key alongside any address
    /// field failures.
    pub fn prepare(
        cart: &Cart,
        address: ShippingAddress,
        rules: &AddressRules,
        quote: ShippingQuote,
        tax_rate: TaxRate,
        currency: impl Into<String>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = match address.validate(rules) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if cart.is_empty() {
            errors.add("cart", "is empty");
        }
        let pricing = price(cart, quote, tax_rate);
        if let Err(e) = &pricing {
            errors.add("cart", e.to_string());
        }
        errors.into_result()?;

        Ok(Self {
            lines: cart.items().to_vec(),
            pricing: pricing.unwrap_or_default(),
            address,
            currency: currency.into(),
        })
    }

    /// Returns the amount to collect in gateway minor units, or `None` if
    /// the total does not fit.
    pub fn amount_minor_units(&self) -> Option<i64> {
        self.pricing.total.minor_units()
    }
}
