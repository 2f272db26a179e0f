//! SQLite integration tests.
//!
//! Each test opens its own database, so they are independent of each other.

use cart_store::{GUEST_CART_KEY, KeyValueStore, LocalCartStore, SqliteKeyValueStore};
use domain::{Cart, CartLineItem, CartMutation, Money, ProductSnapshot};

async fn memory_store() -> SqliteKeyValueStore {
    SqliteKeyValueStore::connect("sqlite::memory:").await.unwrap()
}

fn line(variant: &str, qty: u32) -> CartLineItem {
    CartLineItem::new("P-1", Money::from_units(1_000), ProductSnapshot::named("Mug"))
        .with_variant(variant)
        .with_quantity(qty)
}

#[tokio::test]
async fn test_get_absent_key() {
    let store = memory_store().await;
    assert_eq!(store.get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_set_overwrites_value() {
    let store = memory_store().await;
    store.set("k", "one").await.unwrap();
    store.set("k", "two").await.unwrap();

    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_store")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let store = memory_store().await;
    store.set("k", "v").await.unwrap();
    store.remove("k").await.unwrap();
    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn test_migrations_can_run_twice() {
    let store = memory_store().await;
    store.run_migrations().await.unwrap();
}

#[tokio::test]
async fn test_guest_cart_merges_across_reads() {
    let carts = LocalCartStore::new(memory_store().await);

    for mutation in [CartMutation::add(line("A", 1)), CartMutation::add(line("A", 2))] {
        let current = carts.load().await.unwrap();
        let next = mutation.apply(&current).unwrap();
        carts.save(&next).await.unwrap();
    }

    let cart = carts.load().await.unwrap();
    assert_eq!(cart.line_count(), 1);
    assert_eq!(cart.items()[0].quantity, 3);
    assert_eq!(cart.subtotal(), Money::from_units(3_000));
}

#[tokio::test]
async fn test_corrupt_guest_cart_reads_as_empty() {
    let store = memory_store().await;
    store.set(GUEST_CART_KEY, "[1, 2").await.unwrap();

    let carts = LocalCartStore::new(store);
    assert_eq!(carts.load().await.unwrap(), Cart::new());
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let path = std::env::temp_dir().join(format!("cart-store-{}.db", std::process::id()));
    let url = format!("sqlite://{}", path.display());

    {
        let carts = LocalCartStore::new(SqliteKeyValueStore::connect(&url).await.unwrap());
        let cart = Cart::from_items([line("B", 2)]).unwrap();
        carts.save(&cart).await.unwrap();
        carts.inner().pool().close().await;
    }

    let carts = LocalCartStore::new(SqliteKeyValueStore::connect(&url).await.unwrap());
    let cart = carts.load().await.unwrap();
    assert_eq!(cart.items()[0].quantity, 2);

    carts.inner().pool().close().await;
    let _ = std::fs::remove_file(&path);
}
