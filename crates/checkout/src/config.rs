//! Checkout configuration.

use std::time::Duration;

use domain::{AddressRules, TaxRate};

/// Settings applied to every checkout.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Tax rate used to price the draft.
    pub tax_rate: TaxRate,
    /// ISO currency code sent with the payment intent.
    pub currency: String,
    /// How long the shopper may stay in the gateway's payment step.
    pub payment_timeout: Duration,
    /// Phone and postal code digit counts.
    pub address_rules: AddressRules,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            tax_rate: TaxRate::DEFAULT,
            currency: "INR".to_string(),
            payment_timeout: Duration::from_secs(15 * 60),
            address_rules: AddressRules::default(),
        }
    }
}

impl CheckoutConfig {
    /// Sets the payment window.
    pub fn with_payment_timeout(mut self, timeout: Duration) -> Self {
        self.payment_timeout = timeout;
        self
    }

    /// Sets the tax rate.
    pub fn with_tax_rate(mut self, tax_rate: TaxRate) -> Self {
        self.tax_rate = tax_rate;
        self
    }
}
