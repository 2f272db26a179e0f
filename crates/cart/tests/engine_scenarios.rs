//! Integration tests for the cart consistency engine.

use std::sync::Arc;
use std::time::Duration;

use cart::{
    AuthSession, CartEngine, EngineError, InMemoryRemoteCart, MutationResponse, SERVER_CART_KEY,
};
use cart_store::{InMemoryKeyValueStore, KeyValueStore, StoreError};
use common::AuthToken;
use domain::{Cart, CartError, CartLineItem, LineIdentity, Money, ProductSnapshot};

type TestEngine = CartEngine<InMemoryKeyValueStore, InMemoryRemoteCart, AuthSession>;

struct TestHarness {
    engine: TestEngine,
    kv: InMemoryKeyValueStore,
    remote: InMemoryRemoteCart,
    session: AuthSession,
}

impl TestHarness {
    fn new() -> Self {
        let kv = InMemoryKeyValueStore::new();
        let remote = InMemoryRemoteCart::new();
        let session = AuthSession::guest();
        let engine = CartEngine::new(kv.clone(), remote.clone(), session.clone());
        Self {
            engine,
            kv,
            remote,
            session,
        }
    }

    fn login(&self) -> AuthToken {
        let token = AuthToken::new("token-asha");
        self.session.login(token.clone());
        token
    }
}

fn item(variant: &str, qty: u32, price: i64) -> CartLineItem {
    CartLineItem::new(
        format!("P-{variant}"),
        Money::from_units(price),
        ProductSnapshot::named(format!("Product {variant}")),
    )
    .with_variant(variant)
    .with_quantity(qty)
}

#[tokio::test]
async fn test_guest_adds_merge_by_identity() {
    let h = TestHarness::new();

    h.engine.add_item(item("A", 1, 1_000)).await.unwrap();
    let cart = h.engine.add_item(item("A", 2, 1_000)).await.unwrap();

    assert_eq!(cart.line_count(), 1);
    assert_eq!(cart.items()[0].quantity, 3);
    assert_eq!(cart.subtotal(), Money::from_units(3_000));

    // Persisted, and no network involved.
    assert_eq!(h.engine.get_cart().await.unwrap(), cart);
    assert_eq!(h.remote.fetch_count(), 0);
    assert_eq!(h.remote.mutation_count(), 0);
}

#[tokio::test]
async fn test_signed_in_adds_merge_by_identity() {
    let h = TestHarness::new();
    let token = h.login();

    h.engine.add_item(item("A", 1, 1_000)).await.unwrap();
    h.engine.add_item(item("A", 2, 1_000)).await.unwrap();

    let cart = h.engine.get_cart().await.unwrap();
    assert_eq!(cart.items()[0].quantity, 3);
    assert_eq!(h.remote.cart_for(&token), cart);
}

#[tokio::test]
async fn test_offline_remove_rolls_back() {
    let h = TestHarness::new();
    let token = h.login();
    h.remote
        .seed(&token, Cart::from_items([item("B", 1, 500)]).unwrap());

    let before = h.engine.get_cart().await.unwrap();
    assert_eq!(before.line_count(), 1);

    h.remote.set_fail_mutations(true);
    let err = h
        .engine
        .remove_item(LineIdentity::variant("B"))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(h.engine.cache().get(SERVER_CART_KEY).await, Some(before.clone()));
    let fetches = h.remote.fetch_count();
    assert_eq!(h.engine.get_cart().await.unwrap(), before);
    assert_eq!(h.remote.fetch_count(), fetches);
}

#[tokio::test]
async fn test_successful_mutation_marks_cache_stale() {
    let h = TestHarness::new();
    let token = h.login();
    h.remote
        .seed(&token, Cart::from_items([item("A", 1, 100)]).unwrap());

    h.engine.get_cart().await.unwrap();
    h.engine
        .update_quantity(LineIdentity::variant("A"), 4)
        .await
        .unwrap();

    assert_eq!(h.engine.cache().get_fresh(SERVER_CART_KEY).await, None);
    let fetches = h.remote.fetch_count();
    let cart = h.engine.get_cart().await.unwrap();
    assert_eq!(cart.items()[0].quantity, 4);
    assert_eq!(h.remote.fetch_count(), fetches + 1);
}

#[tokio::test]
async fn test_unauthorized_mutation_surfaces_and_rolls_back() {
    let h = TestHarness::new();
    h.login();
    h.engine.get_cart().await.unwrap();

    h.remote.set_reject_auth(true);
    let err = h.engine.add_item(item("A", 1, 100)).await.unwrap_err();

    assert!(err.is_auth_required());
    assert_eq!(
        h.engine.cache().get(SERVER_CART_KEY).await,
        Some(Cart::new())
    );
}

#[tokio::test]
async fn test_zero_quantity_is_rejected_before_network() {
    let h = TestHarness::new();
    h.login();

    let err = h
        .engine
        .update_quantity(LineIdentity::variant("A"), 0)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Cart(CartError::InvalidQuantity { quantity: 0 })
    ));
    assert_eq!(h.remote.mutation_count(), 0);
}

#[tokio::test]
async fn test_absent_identity_is_noop_in_both_modes() {
    let h = TestHarness::new();
    h.engine.add_item(item("A", 1, 100)).await.unwrap();

    let guest = h
        .engine
        .remove_item(LineIdentity::variant("Z"))
        .await
        .unwrap();
    assert_eq!(guest.line_count(), 1);

    let token = h.login();
    h.remote
        .seed(&token, Cart::from_items([item("B", 2, 100)]).unwrap());
    let server = h
        .engine
        .update_quantity(LineIdentity::variant("Z"), 3)
        .await
        .unwrap();
    assert_eq!(server.line_count(), 1);
    assert_eq!(server.items()[0].quantity, 2);
}

#[tokio::test]
async fn test_authority_is_checked_per_call() {
    let h = TestHarness::new();
    h.engine.add_item(item("A", 1, 100)).await.unwrap();

    let token = h.login();
    h.engine.add_item(item("B", 1, 100)).await.unwrap();
    assert_eq!(h.remote.cart_for(&token).line_count(), 1);
    assert!(
        h.remote
            .cart_for(&token)
            .find(&LineIdentity::variant("B"))
            .is_some()
    );

    h.session.logout();
    let guest = h.engine.get_cart().await.unwrap();
    assert_eq!(guest.line_count(), 1);
    assert!(guest.find(&LineIdentity::variant("A")).is_some());
}

#[tokio::test]
async fn test_login_does_not_merge_guest_cart() {
    let h = TestHarness::new();
    h.engine.add_item(item("A", 1, 100)).await.unwrap();

    h.login();
    assert!(h.engine.get_cart().await.unwrap().is_empty());
    assert_eq!(h.engine.local().load().await.unwrap().line_count(), 1);
}

#[tokio::test]
async fn test_switching_shoppers_drops_cached_cart() {
    let h = TestHarness::new();
    let asha = h.login();
    h.remote
        .seed(&asha, Cart::from_items([item("A", 1, 100)]).unwrap());
    assert_eq!(h.engine.get_cart().await.unwrap().line_count(), 1);

    h.session.login(AuthToken::new("token-ravi"));
    assert!(h.engine.get_cart().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_guest_storage_failure_keeps_previous_cart() {
    let h = TestHarness::new();
    h.engine.add_item(item("A", 1, 100)).await.unwrap();

    h.kv.set_fail_on_write(true);
    let err = h.engine.add_item(item("A", 1, 100)).await.unwrap_err();

    assert!(matches!(err, EngineError::Store(StoreError::Unavailable(_))));
    h.kv.set_fail_on_write(false);
    assert_eq!(h.engine.get_cart().await.unwrap().items()[0].quantity, 1);
}

#[tokio::test]
async fn test_corrupt_guest_cart_reads_as_empty() {
    let h = TestHarness::new();
    h.kv.set("guest_cart", "not json").await.unwrap();

    assert!(h.engine.get_cart().await.unwrap().is_empty());
    let cart = h.engine.add_item(item("A", 1, 100)).await.unwrap();
    assert_eq!(cart.line_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_is_retried_once() {
    let h = TestHarness::new();
    h.login();

    h.remote.fail_next_fetches(1);
    assert!(h.engine.get_cart().await.is_ok());
    assert_eq!(h.remote.fetch_count(), 2);

    h.engine.cache().clear().await;
    h.remote.fail_next_fetches(2);
    let err = h.engine.get_cart().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(h.remote.fetch_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_mutation_cancels_inflight_refetch() {
    let h = TestHarness::new();
    let token = h.login();
    h.remote
        .seed(&token, Cart::from_items([item("A", 1, 100)]).unwrap());
    h.engine.get_cart().await.unwrap();

    h.remote.set_fetch_delay(Some(Duration::from_millis(100)));
    let engine = Arc::new(h.engine);
    let background = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.refetch().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    engine.add_item(item("A", 1, 100)).await.unwrap();

    let stored = background.await.unwrap().unwrap();
    assert!(!stored);
    let cached = engine.cache().get(SERVER_CART_KEY).await.unwrap();
    assert_eq!(cached.items()[0].quantity, 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_mutations_on_cold_cache_match_server() {
    let h = TestHarness::new();
    let token = h.login();
    h.remote.set_fetch_delay(Some(Duration::from_millis(20)));
    h.remote
        .queue_mutation(MutationResponse::ok_after(Duration::from_millis(10)));
    h.remote
        .queue_mutation(MutationResponse::fail_after(Duration::from_millis(50)));

    let (first, second) = tokio::join!(
        h.engine.add_item(item("A", 1, 100)),
        h.engine.add_item(item("B", 1, 100)),
    );

    assert!(first.is_ok());
    assert!(second.unwrap_err().is_retryable());
    let server = h.remote.cart_for(&token);
    assert_eq!(server.line_count(), 1);
    assert_eq!(h.engine.get_cart().await.unwrap(), server);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_mutations_compose_optimistically() {
    let h = TestHarness::new();
    let token = h.login();
    h.engine.get_cart().await.unwrap();
    h.remote
        .queue_mutation(MutationResponse::ok_after(Duration::from_millis(30)));
    h.remote
        .queue_mutation(MutationResponse::ok_after(Duration::from_millis(30)));

    let (first, second, in_flight) = tokio::join!(
        h.engine.add_item(item("A", 1, 100)),
        h.engine.add_item(item("B", 2, 100)),
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            h.engine.cache().get(SERVER_CART_KEY).await
        },
    );

    first.unwrap();
    second.unwrap();
    let in_flight = in_flight.unwrap();
    assert_eq!(in_flight.line_count(), 2);
    assert_eq!(in_flight.item_count(), 3);

    let cart = h.engine.get_cart().await.unwrap();
    assert_eq!(cart, h.remote.cart_for(&token));
    assert_eq!(cart.item_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_rollbacks_reconcile_with_server() {
    let h = TestHarness::new();
    let token = h.login();
    h.engine.get_cart().await.unwrap();
    h.remote
        .queue_mutation(MutationResponse::fail_after(Duration::from_millis(10)));
    h.remote
        .queue_mutation(MutationResponse::fail_after(Duration::from_millis(50)));

    let (first, second) = tokio::join!(
        h.engine.add_item(item("A", 1, 100)),
        h.engine.add_item(item("B", 1, 100)),
    );

    assert!(first.is_err());
    assert!(second.is_err());
    assert_eq!(h.engine.cache().get_fresh(SERVER_CART_KEY).await, None);
    let fetches = h.remote.fetch_count();
    assert!(h.engine.get_cart().await.unwrap().is_empty());
    assert_eq!(h.remote.fetch_count(), fetches + 1);
    assert!(h.remote.cart_for(&token).is_empty());
}

#[tokio::test]
async fn test_adopt_guest_cart_merges_into_server_cart() {
    let h = TestHarness::new();
    h.engine.add_item(item("A", 1, 100)).await.unwrap();
    h.engine.add_item(item("B", 2, 250)).await.unwrap();

    let token = h.login();
    h.remote
        .seed(&token, Cart::from_items([item("A", 2, 100)]).unwrap());

    let cart = h.engine.adopt_guest_cart().await.unwrap();

    assert_eq!(cart.line_count(), 2);
    assert_eq!(
        cart.find(&LineIdentity::variant("A")).unwrap().quantity,
        3
    );
    assert_eq!(h.remote.cart_for(&token), cart);
    assert!(h.kv.get("guest_cart").await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_adoption_keeps_guest_lines() {
    let h = TestHarness::new();
    h.engine.add_item(item("A", 1, 100)).await.unwrap();
    h.login();

    h.remote.set_fail_mutations(true);
    assert!(h.engine.adopt_guest_cart().await.is_err());
    assert_eq!(h.engine.local().load().await.unwrap().line_count(), 1);
}

#[tokio::test]
async fn test_adoption_requires_sign_in() {
    let h = TestHarness::new();
    let err = h.engine.adopt_guest_cart().await.unwrap_err();
    assert!(err.is_auth_required());
}

#[tokio::test]
async fn test_clear_in_both_modes() {
    let h = TestHarness::new();
    h.engine.add_item(item("A", 1, 100)).await.unwrap();
    assert!(h.engine.clear().await.unwrap().is_empty());

    let token = h.login();
    h.remote
        .seed(&token, Cart::from_items([item("B", 1, 100)]).unwrap());
    assert!(h.engine.clear().await.unwrap().is_empty());
    assert!(h.remote.cart_for(&token).is_empty());
}
