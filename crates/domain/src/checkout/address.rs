//! Shipping address and its synchronous validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shipping address fields collected on the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Digit-count rules for the address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRules {
    /// Exact number of digits a phone number must contain.
    pub phone_digits: usize,
    /// Exact number of digits a postal code must contain.
    pub postal_code_digits: usize,
}

impl Default for AddressRules {
    fn default() -> Self {
        Self {
            phone_digits: 10,
            postal_code_digits: 6,
        }
    }
}

/// Field-keyed validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Error, Serialize, Deserialize)]
#[error("validation failed for {} field(s)", .0.len())]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    /// Creates an empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for a field, keeping the first message per field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Returns true if no field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Converts into `Err(self)` when any field failed.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn digit_count(value: &str) -> usize {
    value.chars().filter(char::is_ascii_digit).count()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

impl ShippingAddress {
    /// Validates every field, collecting all failures.
    ///
    /// Phone numbers may contain separators (`+`, spaces, dashes); only the
    /// digit count is checked. Postal codes must consist of digits only.
    pub fn validate(&self, rules: &AddressRules) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let required = [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.add(field, "is required");
            }
        }

        let email = self.email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            errors.add("email", "must be a valid email address");
        }

        let phone = self.phone.trim();
        if !phone.is_empty() {
            let allowed = phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
            if !allowed || digit_count(phone) != rules.phone_digits {
                errors.add(
                    "phone",
                    format!("must contain {} digits", rules.phone_digits),
                );
            }
        }

        let postal = self.postal_code.trim();
        if !postal.is_empty()
            && (postal.len() != rules.postal_code_digits
                || !postal.chars().all(|c| c.is_ascii_digit()))
        {
            errors.add(
                "postal_code",
                format!("must contain {} digits", rules.postal_code_digits),
            );
        }

        errors.into_result()
    }
}
