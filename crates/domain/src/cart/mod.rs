//! Cart model and related types.

mod model;
mod mutations;
mod value_objects;

pub(crate) use model::checked_subtotal;
pub use model::Cart;
pub use mutations::CartMutation;
pub use value_objects::{CartLineItem, LineIdentity, Money, ProductSnapshot, VariantSummary};

use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantities must be at least 1; removal represents deletion.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Merging quantities would overflow.
    #[error("Quantity overflow for line {identity}")]
    QuantityOverflow { identity: String },

    /// Unit price must not be negative.
    #[error("Invalid price: {price} (must not be negative)")]
    InvalidPrice { price: i64 },

    /// A line total or the cart amount does not fit in [`Money`].
    #[error("Cart amount out of range")]
    AmountOverflow,
}
