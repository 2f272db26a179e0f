//! Value objects for the cart domain.

use common::{ProductId, VariantId};
use serde::{Deserialize, Serialize};

/// Money amount in whole currency units.
///
/// Prices, tax and shipping are integral in this storefront; the gateway
/// receives the same amount in minor units (see [`Money::minor_units`]).
/// Operators saturate; pricing uses the `checked_*` forms and reports
/// overflow instead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new amount from whole units.
    pub const fn from_units(units: i64) -> Self {
        Self(units)
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in whole units.
    pub fn units(&self) -> i64 {
        self.0
    }

    /// Returns the amount in minor units (units × 100) as expected by the
    /// gateway, or `None` if it does not fit.
    pub fn minor_units(&self) -> Option<i64> {
        self.0.checked_mul(100)
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity, saturating at the bounds.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Subtracts two amounts, or `None` on overflow.
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// One selectable variant of a product, as shown on the product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub variant_id: VariantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Display data copied from the catalog when the line is added.
///
/// Lets a guest cart render without a catalog round trip. Never updated
/// after capture.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub variants: Vec<VariantSummary>,
}

impl ProductSnapshot {
    /// Creates a snapshot with just a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the image URL.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the variant list.
    pub fn with_variants(mut self, variants: Vec<VariantSummary>) -> Self {
        self.variants = variants;
        self
    }
}

/// Key used to deduplicate and merge cart lines.
///
/// A variant id alone identifies the line when present; otherwise the
/// product id together with the chosen size and color does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineIdentity {
    Variant {
        variant_id: VariantId,
    },
    Attributes {
        product_id: ProductId,
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },
}

impl LineIdentity {
    /// Identity of a specific variant.
    pub fn variant(variant_id: impl Into<VariantId>) -> Self {
        LineIdentity::Variant {
            variant_id: variant_id.into(),
        }
    }

    /// Identity of a product with optional size/color attributes.
    pub fn attributes(
        product_id: impl Into<ProductId>,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Self {
        LineIdentity::Attributes {
            product_id: product_id.into(),
            size: size.map(str::to_string),
            color: color.map(str::to_string),
        }
    }
}

impl std::fmt::Display for LineIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineIdentity::Variant { variant_id } => write!(f, "variant:{variant_id}"),
            LineIdentity::Attributes {
                product_id,
                size,
                color,
            } => write!(
                f,
                "product:{product_id}/{}/{}",
                size.as_deref().unwrap_or("-"),
                color.as_deref().unwrap_or("-")
            ),
        }
    }
}

/// A line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub unit_price: Money,
    pub product_snapshot: ProductSnapshot,
}

impl CartLineItem {
    /// Creates a single-quantity line without variant attributes.
    pub fn new(
        product_id: impl Into<ProductId>,
        unit_price: Money,
        product_snapshot: ProductSnapshot,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: None,
            quantity: 1,
            size: None,
            color: None,
            unit_price,
            product_snapshot,
        }
    }

    /// Sets the variant id.
    pub fn with_variant(mut self, variant_id: impl Into<VariantId>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }

    /// Sets the size attribute.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Sets the color attribute.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the quantity.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Returns the merge key of this line.
    pub fn identity(&self) -> LineIdentity {
        match &self.variant_id {
            Some(variant_id) => LineIdentity::Variant {
                variant_id: variant_id.clone(),
            },
            None => LineIdentity::Attributes {
                product_id: self.product_id.clone(),
                size: self.size.clone(),
                color: self.color.clone(),
            },
        }
    }

    /// Returns the total price for this line (quantity × unit price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Returns the line total, or `None` if it overflows.
    pub fn checked_line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity)
    }
}
