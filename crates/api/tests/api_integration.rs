//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::config::Config;
use api::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::{
    AddressRules, Cart, CartLineItem, CheckoutDraft, Money, Order, PaymentIntent, PaymentProof,
    ProductSnapshot, ShippingAddress, ShippingQuote, TaxRate,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, Arc<AppState>) {
    let state = api::create_default_state(&Config::default());
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn kettle(qty: u32) -> CartLineItem {
    CartLineItem::new("P-KETTLE", Money::from_units(1_000), ProductSnapshot::named("Kettle"))
        .with_variant("KETTLE-STEEL")
        .with_quantity(qty)
}

fn draft(cart: &Cart) -> CheckoutDraft {
    let address = ShippingAddress {
        full_name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        phone: "9876543210".into(),
        address_line1: "12 MG Road".into(),
        address_line2: None,
        city: "Bengaluru".into(),
        state: "KA".into(),
        postal_code: "560001".into(),
        country: "IN".into(),
    };
    CheckoutDraft::prepare(
        cart,
        address,
        &AddressRules::default(),
        ShippingQuote::new(Money::from_units(80)),
        TaxRate::DEFAULT,
        "INR",
    )
    .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let (status, json) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["orders"], 0);
}

#[tokio::test]
async fn test_cart_requires_bearer_token() {
    let (app, _) = setup();

    let (status, json) = send(&app, "GET", "/api/cart", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_cart_merges_by_identity() {
    let (app, state) = setup();
    let body = serde_json::to_value(kettle(1)).unwrap();

    send(&app, "POST", "/api/cart/items", Some("t1"), Some(body.clone())).await;
    let (status, json) = send(&app, "POST", "/api/cart/items", Some("t1"), Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    let cart: Cart = serde_json::from_value(json).unwrap();
    assert_eq!(cart.line_count(), 1);
    assert_eq!(cart.items()[0].quantity, 2);
    assert_eq!(state.carts.cart_for(&common::AuthToken::new("t1")), cart);

    // Carts are kept per shopper.
    let (_, other) = send(&app, "GET", "/api/cart", Some("t2"), None).await;
    let other: Cart = serde_json::from_value(other).unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_update_remove_and_clear() {
    let (app, _) = setup();
    let identity = json!({ "kind": "variant", "variant_id": "KETTLE-STEEL" });
    send(
        &app,
        "POST",
        "/api/cart/items",
        Some("t1"),
        Some(serde_json::to_value(kettle(1)).unwrap()),
    )
    .await;

    let (status, json) = send(
        &app,
        "PATCH",
        "/api/cart/items",
        Some("t1"),
        Some(json!({ "identity": identity, "quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["items"][0]["quantity"], 5);

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/cart/items",
        Some("t1"),
        Some(json!({ "identity": identity, "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing = json!({ "identity": { "kind": "variant", "variant_id": "NOPE" } });
    let (status, json) = send(
        &app,
        "POST",
        "/api/cart/items/remove",
        Some("t1"),
        Some(missing),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);

    let (status, json) = send(&app, "DELETE", "/api/cart", Some("t1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let cart: Cart = serde_json::from_value(json).unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_out_of_range_line_is_unprocessable() {
    let (app, state) = setup();
    let line = CartLineItem::new(
        "P-GOLD",
        Money::from_units(i64::MAX / 2),
        ProductSnapshot::named("Gold"),
    )
    .with_variant("GOLD")
    .with_quantity(3);

    let (status, json) = send(
        &app,
        "POST",
        "/api/cart/items",
        Some("t1"),
        Some(serde_json::to_value(line).unwrap()),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Cart amount out of range");
    assert!(state.carts.cart_for(&common::AuthToken::new("t1")).is_empty());
}

#[tokio::test]
async fn test_shipping_quote() {
    let (app, _) = setup();

    let (status, json) = send(&app, "GET", "/api/checkout/shipping-quote", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["shipping"], 80);
}

#[tokio::test]
async fn test_checkout_flow_materializes_one_order() {
    let (app, state) = setup();
    let (_, cart) = send(
        &app,
        "POST",
        "/api/cart/items",
        Some("t1"),
        Some(serde_json::to_value(kettle(10)).unwrap()),
    )
    .await;
    let cart: Cart = serde_json::from_value(cart).unwrap();
    let draft = draft(&cart);

    let (status, intent) = send(
        &app,
        "POST",
        "/api/payments/intents",
        None,
        Some(serde_json::to_value(&draft).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let intent: PaymentIntent = serde_json::from_value(intent).unwrap();
    assert_eq!(intent.amount, 1_188_000);
    assert_eq!(intent.gateway_public_key, "key_sandbox");
    assert_eq!(state.orders.order_count(), 0);

    let (status, proof) = send(
        &app,
        "POST",
        &format!("/sandbox/pay/{}", intent.gateway_order_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let proof: PaymentProof = serde_json::from_value(proof).unwrap();

    let mut verify_body = serde_json::to_value(&proof).unwrap();
    verify_body["draft"] = serde_json::to_value(&draft).unwrap();

    let (status, json) = send(
        &app,
        "POST",
        "/api/payments/verify",
        Some("t1"),
        Some(verify_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_value(json["order"].clone()).unwrap();
    assert_eq!(order.total(), Money::from_units(11_880));
    assert!(state.carts.cart_for(&common::AuthToken::new("t1")).is_empty());

    // A repeated callback returns the same order.
    let (_, again) = send(
        &app,
        "POST",
        "/api/payments/verify",
        Some("t1"),
        Some(verify_body),
    )
    .await;
    assert_eq!(again["order"]["id"], json["order"]["id"]);
    assert_eq!(state.orders.order_count(), 1);

    let (status, fetched) = send(&app, "GET", &format!("/api/orders/{}", order.id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_value::<Order>(fetched).unwrap(), order);

    let (_, metrics) = {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    };
    assert!(metrics.contains("orders_materialized_total"));
}

#[tokio::test]
async fn test_forged_signature_is_rejected() {
    let (app, state) = setup();
    let draft = draft(&Cart::from_items([kettle(1)]).unwrap());
    let (_, intent) = send(
        &app,
        "POST",
        "/api/payments/intents",
        None,
        Some(serde_json::to_value(&draft).unwrap()),
    )
    .await;

    let body = json!({
        "gateway_order_id": intent["gateway_order_id"],
        "payment_id": "pay_forged",
        "signature": "00".repeat(32),
        "draft": draft,
    });
    let (status, json) = send(&app, "POST", "/api/payments/verify", None, Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid payment signature");
    assert_eq!(state.orders.order_count(), 0);
}

async fn open_and_pay(app: &axum::Router, draft: &CheckoutDraft) -> PaymentProof {
    let (_, intent) = send(
        app,
        "POST",
        "/api/payments/intents",
        None,
        Some(serde_json::to_value(draft).unwrap()),
    )
    .await;
    let (status, proof) = send(
        app,
        "POST",
        &format!("/sandbox/pay/{}", intent["gateway_order_id"].as_str().unwrap()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(proof).unwrap()
}

#[tokio::test]
async fn test_verify_requires_draft_matching_paid_intent() {
    let (app, state) = setup();
    let paid = draft(&Cart::from_items([kettle(1)]).unwrap());
    let proof = open_and_pay(&app, &paid).await;

    let mut body = serde_json::to_value(&proof).unwrap();
    body["draft"] = serde_json::to_value(draft(&Cart::from_items([kettle(50)]).unwrap())).unwrap();
    let (status, json) = send(&app, "POST", "/api/payments/verify", None, Some(body)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().is_some());
    assert_eq!(state.orders.order_count(), 0);
}

#[tokio::test]
async fn test_forged_replay_of_paid_intent_is_rejected() {
    let (app, _) = setup();
    let paid = draft(&Cart::from_items([kettle(1)]).unwrap());
    let proof = open_and_pay(&app, &paid).await;

    let mut body = serde_json::to_value(&proof).unwrap();
    body["draft"] = serde_json::to_value(&paid).unwrap();
    let (status, _) = send(&app, "POST", "/api/payments/verify", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);

    body["signature"] = json!("00".repeat(32));
    let (status, json) = send(&app, "POST", "/api/payments/verify", None, Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("order").is_none());
}

#[tokio::test]
async fn test_sandbox_pay_unknown_intent() {
    let (app, _) = setup();

    let (status, _) = send(&app, "POST", "/sandbox/pay/order_missing", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_lookup_errors() {
    let (app, _) = setup();

    let (status, _) = send(&app, "GET", "/api/orders/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/orders/{}", common::OrderId::new()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_empty_draft_is_rejected() {
    let (app, _) = setup();
    let mut draft = draft(&Cart::from_items([kettle(1)]).unwrap());
    draft.lines.clear();

    let (status, _) = send(
        &app,
        "POST",
        "/api/payments/intents",
        None,
        Some(serde_json::to_value(&draft).unwrap()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
