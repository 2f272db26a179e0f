//! Request and response bodies that have no domain type of their own.

use domain::{LineIdentity, Order};
use serde::{Deserialize, Serialize};

/// Body of `PATCH /api/cart/items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateQuantityBody {
    pub identity: LineIdentity,
    pub quantity: u32,
}

/// Body of `POST /api/cart/items/remove`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveItemBody {
    pub identity: LineIdentity,
}

/// Response of `POST /api/payments/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEnvelope {
    pub order: Order,
}

/// Error body returned with every non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
