//! The cart value.

use serde::{Deserialize, Serialize};

use super::{CartError, CartLineItem, LineIdentity, Money};

/// A shopper's cart.
///
/// Invariants held by every mutating method:
/// - no two lines share a [`LineIdentity`];
/// - every quantity is at least 1.
///
/// A cart is plain data: the same value is stored locally for guests,
/// returned by the server for authenticated shoppers, and held in the
/// client-side cache.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    items: Vec<CartLineItem>,
    #[serde(default)]
    discount: Money,
    #[serde(default)]
    shipping: Money,
    #[serde(default)]
    tax: Money,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart by adding each line in order, merging duplicates.
    pub fn from_items(items: impl IntoIterator<Item = CartLineItem>) -> Result<Self, CartError> {
        let mut cart = Cart::new();
        for item in items {
            cart.add_item(item)?;
        }
        Ok(cart)
    }

    /// Sets the discount applied at pricing time.
    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    /// Returns the lines in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Returns the discount.
    pub fn discount(&self) -> Money {
        self.discount
    }

    /// Returns the shipping amount last attached to this cart.
    pub fn shipping(&self) -> Money {
        self.shipping
    }

    /// Returns the tax amount last attached to this cart.
    pub fn tax(&self) -> Money {
        self.tax
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Returns Σ unit price × quantity.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Returns the subtotal, or [`CartError::AmountOverflow`] if it does not
    /// fit. Always `Ok` for carts built through [`Cart::add_item`].
    pub fn checked_subtotal(&self) -> Result<Money, CartError> {
        checked_subtotal(&self.items)
    }

    /// Finds the line with the given identity.
    pub fn find(&self, identity: &LineIdentity) -> Option<&CartLineItem> {
        self.items.iter().find(|i| &i.identity() == identity)
    }

    /// Adds a line, summing quantities when the identity already exists.
    pub fn add_item(&mut self, item: CartLineItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity: 0 });
        }
        if item.unit_price.is_negative() {
            return Err(CartError::InvalidPrice {
                price: item.unit_price.units(),
            });
        }

        let identity = item.identity();
        let mut items = self.items.clone();
        match items.iter_mut().find(|i| i.identity() == identity) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(item.quantity).ok_or(
                    CartError::QuantityOverflow {
                        identity: identity.to_string(),
                    },
                )?;
            }
            None => items.push(item),
        }
        checked_subtotal(&items)?;
        self.items = items;
        Ok(())
    }

    /// Sets the quantity of a line.
    ///
    /// Returns `Ok(false)` without touching the cart when the identity is
    /// absent. Zero is rejected: use [`Cart::remove_item`] to delete.
    pub fn update_quantity(
        &mut self,
        identity: &LineIdentity,
        quantity: u32,
    ) -> Result<bool, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }
        let Some(index) = self.items.iter().position(|i| &i.identity() == identity) else {
            return Ok(false);
        };
        let mut items = self.items.clone();
        items[index].quantity = quantity;
        checked_subtotal(&items)?;
        self.items = items;
        Ok(true)
    }

    /// Removes a line. Returns false if the identity was absent.
    pub fn remove_item(&mut self, identity: &LineIdentity) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.identity() != identity);
        self.items.len() != before
    }

    /// Removes every line and resets the attached amounts.
    pub fn clear(&mut self) {
        *self = Cart::new();
    }
}

/// Σ unit price × quantity without overflow.
pub(crate) fn checked_subtotal(items: &[CartLineItem]) -> Result<Money, CartError> {
    items
        .iter()
        .try_fold(Money::zero(), |acc, item| {
            item.checked_line_total().and_then(|total| acc.checked_add(total))
        })
        .ok_or(CartError::AmountOverflow)
}
