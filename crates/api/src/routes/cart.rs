//! Server cart endpoints. Every route requires a bearer token.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use cart::RemoteCartService;
use client::wire::{RemoveItemBody, UpdateQuantityBody};
use domain::{Cart, CartLineItem};

use super::require_token;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/cart
pub async fn get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Cart>, ApiError> {
    let token = require_token(&headers)?;
    Ok(Json(state.carts.fetch_cart(&token).await?))
}

/// POST /api/cart/items: adds a line, merging by identity.
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(item): Json<CartLineItem>,
) -> Result<Json<Cart>, ApiError> {
    let token = require_token(&headers)?;
    let cart = state.carts.add_item(&token, &item).await?;
    tracing::info!(identity = %item.identity(), quantity = item.quantity, "server cart item added");
    Ok(Json(cart))
}

/// PATCH /api/cart/items
pub async fn update_quantity(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateQuantityBody>,
) -> Result<Json<Cart>, ApiError> {
    let token = require_token(&headers)?;
    Ok(Json(
        state
            .carts
            .update_quantity(&token, &body.identity, body.quantity)
            .await?,
    ))
}

/// POST /api/cart/items/remove: removing an absent line is a no-op.
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RemoveItemBody>,
) -> Result<Json<Cart>, ApiError> {
    let token = require_token(&headers)?;
    Ok(Json(state.carts.remove_item(&token, &body.identity).await?))
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Cart>, ApiError> {
    let token = require_token(&headers)?;
    Ok(Json(state.carts.clear(&token).await?))
}
