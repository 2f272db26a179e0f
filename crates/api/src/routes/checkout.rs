//! Shipping quote, payment intent, verification, order and sandbox payment
//! endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use cart::RemoteCartService;
use checkout::{OrderMaterializationService, PaymentGateway, PaymentOutcome};
use client::wire::OrderEnvelope;
use common::{GatewayOrderId, OrderId};
use domain::{CheckoutDraft, Order, PaymentIntent, PaymentProof, ShippingQuote, VerifyPaymentRequest};

use super::bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/checkout/shipping-quote
pub async fn shipping_quote(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ShippingQuote>, ApiError> {
    Ok(Json(state.orders.shipping_quote().await?))
}

/// POST /api/payments/intents: opens a gateway order. Creates no order.
pub async fn create_intent(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<CheckoutDraft>,
) -> Result<Json<PaymentIntent>, ApiError> {
    if draft.lines.is_empty() {
        return Err(ApiError::BadRequest("draft has no lines".to_string()));
    }
    let intent = state.orders.create_payment_intent(&draft).await?;
    tracing::info!(
        gateway_order_id = %intent.gateway_order_id,
        amount = intent.amount,
        "payment intent created"
    );
    Ok(Json(intent))
}

/// POST /api/payments/verify: verifies the proof, checks the draft against
/// the paid intent, re-prices it and creates the order at most once per
/// gateway order.
///
/// A newly created order clears the server cart of the caller, if signed in.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let before = state.orders.order_count();
    let order = match state.orders.verify_and_create_order(&request).await {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!(
                gateway_order_id = %request.proof.gateway_order_id,
                error = %e,
                "payment verification rejected"
            );
            return Err(e.into());
        }
    };

    if state.orders.order_count() > before {
        metrics::counter!("orders_materialized_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total(),
            "order materialized"
        );
        if let Some(token) = bearer_token(&headers) {
            if let Err(e) = state.carts.clear(&token).await {
                tracing::warn!(order_id = %order.id, error = %e, "failed to clear server cart");
            }
        }
    }

    Ok(Json(OrderEnvelope { order }))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id: OrderId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid order id: {id}")))?;
    Ok(Json(state.orders.get_order(order_id).await?))
}

/// POST /sandbox/pay/{gateway_order_id}: pays an open intent and returns
/// the signed proof the gateway widget would deliver.
pub async fn sandbox_pay(
    State(state): State<Arc<AppState>>,
    Path(gateway_order_id): Path<String>,
) -> Result<Json<PaymentProof>, ApiError> {
    let gateway_order_id = GatewayOrderId::new(gateway_order_id);
    let intent = state
        .orders
        .intent(&gateway_order_id)
        .ok_or_else(|| ApiError::NotFound(format!("unknown gateway order {gateway_order_id}")))?;

    match state.gateway.collect_payment(&intent).await? {
        PaymentOutcome::Succeeded(proof) => Ok(Json(proof)),
        PaymentOutcome::Cancelled { reason } => Err(ApiError::BadRequest(reason)),
    }
}
