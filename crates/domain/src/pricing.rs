//! Pricing calculator.
//!
//! `price` is a pure function of the cart lines, discount, server shipping
//! quote and tax rate. Shipping is never computed locally: the quote is
//! fetched from the server once per checkout entry.

use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartError, CartLineItem, Money, checked_subtotal};

/// Tax rate expressed in basis points (1800 = 18%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Default storefront rate (18%).
    pub const DEFAULT: TaxRate = TaxRate(1800);

    /// Creates a rate from basis points.
    pub const fn from_basis_points(bps: u32) -> Self {
        Self(bps)
    }

    /// Creates a rate from a whole percentage.
    pub const fn percent(percent: u32) -> Self {
        Self(percent * 100)
    }

    /// Returns the rate in basis points.
    pub fn basis_points(&self) -> u32 {
        self.0
    }

    /// Tax on `amount`, rounded half away from zero to the nearest whole
    /// unit, or `None` if it does not fit in [`Money`].
    pub fn apply(&self, amount: Money) -> Option<Money> {
        let scaled = i128::from(amount.units()) * i128::from(self.0);
        let rounded = if scaled >= 0 {
            (scaled + 5_000) / 10_000
        } else {
            (scaled - 5_000) / 10_000
        };
        i64::try_from(rounded).ok().map(Money::from_units)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Shipping cost quoted by the server for the current checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub shipping: Money,
}

impl ShippingQuote {
    /// Creates a quote.
    pub fn new(shipping: Money) -> Self {
        Self { shipping }
    }
}

/// Computed amounts for a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl PricingBreakdown {
    /// Returns true if `total == subtotal - discount + shipping + tax`.
    pub fn is_consistent(&self) -> bool {
        total(self.subtotal, self.discount, self.shipping, self.tax) == Some(self.total)
    }
}

fn total(subtotal: Money, discount: Money, shipping: Money, tax: Money) -> Option<Money> {
    subtotal
        .checked_sub(discount)?
        .checked_add(shipping)?
        .checked_add(tax)
}

/// Prices a cart.
pub fn price(
    cart: &Cart,
    quote: ShippingQuote,
    tax_rate: TaxRate,
) -> Result<PricingBreakdown, CartError> {
    price_lines(cart.items(), cart.discount(), quote, tax_rate)
}

/// Prices a list of lines.
///
/// Fails with [`CartError::AmountOverflow`] when any amount does not fit in
/// [`Money`], including the total in gateway minor units.
pub fn price_lines(
    lines: &[CartLineItem],
    discount: Money,
    quote: ShippingQuote,
    tax_rate: TaxRate,
) -> Result<PricingBreakdown, CartError> {
    let subtotal = checked_subtotal(lines)?;
    let tax = tax_rate.apply(subtotal).ok_or(CartError::AmountOverflow)?;
    let shipping = quote.shipping;
    let total = total(subtotal, discount, shipping, tax)
        .filter(|total| total.minor_units().is_some())
        .ok_or(CartError::AmountOverflow)?;

    Ok(PricingBreakdown {
        subtotal,
        discount,
        shipping,
        tax,
        total,
    })
}
