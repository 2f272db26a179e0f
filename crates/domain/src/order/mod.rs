//! The durable order record.
//!
//! Orders are created by the server inside payment verification, exactly
//! once per gateway order. The client only reads them.

mod state;

pub use state::{OrderStatus, PaymentStatus};

use chrono::{DateTime, Utc};
use common::{GatewayOrderId, OrderId, PaymentId, ProductId, VariantId};
use serde::{Deserialize, Serialize};

use crate::cart::{CartLineItem, Money};
use crate::checkout::{CheckoutDraft, PaymentProof, ShippingAddress};
use crate::pricing::PricingBreakdown;

/// A priced line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl From<&CartLineItem> for OrderLine {
    fn from(item: &CartLineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            variant_id: item.variant_id.clone(),
            name: item.product_snapshot.name.clone(),
            size: item.size.clone(),
            color: item.color.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total(),
        }
    }
}

/// A materialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub lines: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub pricing: PricingBreakdown,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub gateway_order_id: GatewayOrderId,
    pub payment_id: PaymentId,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a paid order from a verified proof and a draft the server has
    /// already re-priced.
    pub fn materialize(
        order_number: impl Into<String>,
        draft: &CheckoutDraft,
        proof: &PaymentProof,
    ) -> Self {
        Self {
            id: OrderId::new(),
            order_number: order_number.into(),
            lines: draft.lines.iter().map(OrderLine::from).collect(),
            shipping_address: draft.address.clone(),
            pricing: draft.pricing,
            currency: draft.currency.clone(),
            payment_status: PaymentStatus::Paid,
            status: OrderStatus::Placed,
            gateway_order_id: proof.gateway_order_id.clone(),
            payment_id: proof.payment_id.clone(),
            created_at: Utc::now(),
        }
    }

    /// Returns the order total.
    pub fn total(&self) -> Money {
        self.pricing.total
    }
}
