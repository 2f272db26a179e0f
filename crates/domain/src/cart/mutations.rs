//! Cart mutations.

use serde::{Deserialize, Serialize};

use super::{Cart, CartError, CartLineItem, LineIdentity};

/// A change to a cart.
///
/// The same mutation value is applied to the guest cart read from local
/// storage and to the cached server cart before the network call, so both
/// authorities follow one merge rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CartMutation {
    /// Add a line or increase the quantity of the matching line.
    AddItem { item: CartLineItem },

    /// Set the quantity of the matching line.
    UpdateQuantity {
        identity: LineIdentity,
        quantity: u32,
    },

    /// Remove the matching line.
    RemoveItem { identity: LineIdentity },

    /// Remove every line.
    Clear,
}

impl CartMutation {
    /// Creates an add mutation.
    pub fn add(item: CartLineItem) -> Self {
        CartMutation::AddItem { item }
    }

    /// Creates an update-quantity mutation.
    pub fn update_quantity(identity: LineIdentity, quantity: u32) -> Self {
        CartMutation::UpdateQuantity { identity, quantity }
    }

    /// Creates a remove mutation.
    pub fn remove(identity: LineIdentity) -> Self {
        CartMutation::RemoveItem { identity }
    }

    /// Returns the mutation name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            CartMutation::AddItem { .. } => "add_item",
            CartMutation::UpdateQuantity { .. } => "update_quantity",
            CartMutation::RemoveItem { .. } => "remove_item",
            CartMutation::Clear => "clear",
        }
    }

    /// Checks the mutation without a cart, so invalid input never reaches
    /// storage or the network.
    pub fn validate(&self) -> Result<(), CartError> {
        match self {
            CartMutation::AddItem { item } if item.quantity == 0 => {
                Err(CartError::InvalidQuantity { quantity: 0 })
            }
            CartMutation::AddItem { item } if item.unit_price.is_negative() => {
                Err(CartError::InvalidPrice {
                    price: item.unit_price.units(),
                })
            }
            CartMutation::UpdateQuantity { quantity: 0, .. } => {
                Err(CartError::InvalidQuantity { quantity: 0 })
            }
            _ => Ok(()),
        }
    }

    /// Applies the mutation to a copy of `cart`.
    ///
    /// The input is never modified, so the caller can keep it as a rollback
    /// snapshot. Absent identities leave the cart unchanged.
    pub fn apply(&self, cart: &Cart) -> Result<Cart, CartError> {
        let mut next = cart.clone();
        match self {
            CartMutation::AddItem { item } => next.add_item(item.clone())?,
            CartMutation::UpdateQuantity { identity, quantity } => {
                next.update_quantity(identity, *quantity)?;
            }
            CartMutation::RemoveItem { identity } => {
                next.remove_item(identity);
            }
            CartMutation::Clear => next.clear(),
        }
        Ok(next)
    }
}
