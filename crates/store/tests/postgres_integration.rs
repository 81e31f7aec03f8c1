//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency and are
//! serialized because they truncate tables between runs:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{AddressId, CartId, OrderId, ProductId, UserId};
use domain::{
    Address, Cart, CartItem, Category, ORDER_ACCEPTED, Order, OrderItem, PageRequest, Payment,
    Product, ProductDraft, ProductSort, SortOrder,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{CartChange, OrderPlacement, PostgresStore, StoreError, StorefrontStore};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_storefront_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query(
        "TRUNCATE TABLE order_idempotency, order_items, orders, payments, \
         cart_items, carts, addresses, products, categories CASCADE",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

async fn seed_product(store: &PostgresStore, name: &str, stock: u32, price: f64) -> Product {
    let category = Category::new(format!("{name} category"));
    store.insert_category(&category).await.unwrap();

    let product = Product::from_draft(
        category.id,
        UserId::new(),
        ProductDraft {
            name: name.to_string(),
            description: format!("{name} description"),
            quantity: stock,
            price,
            discount: 10.0,
        },
    );
    store.insert_product(&product).await.unwrap();
    product
}

async fn seed_cart_with_line(store: &PostgresStore, product: &Product, quantity: u32) -> Cart {
    let mut cart = Cart::new(UserId::new());
    store.create_cart(&cart).await.unwrap();

    let item = CartItem::new(
        cart.id,
        product.id,
        quantity,
        product.special_price,
        product.discount,
    );
    cart.items.push(item.clone());
    cart.recompute_total();
    store
        .commit_cart(&cart, &CartChange::UpsertItem(item))
        .await
        .unwrap();

    store.find_cart(cart.id).await.unwrap().unwrap()
}

async fn seed_address(store: &PostgresStore) -> Address {
    let address = Address {
        id: AddressId::new(),
        user_id: UserId::new(),
        street: "1 Main St".to_string(),
        building_name: "Suite 4".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        country: "US".to_string(),
        pincode: "62704".to_string(),
    };
    store.insert_address(&address).await.unwrap();
    address
}

fn placement_for(cart: &Cart, address: &Address, key: Option<&str>) -> OrderPlacement {
    let payment = Payment::new("card", "stripe", "pg-1", "success", "approved");
    let order = Order {
        id: OrderId::new(),
        email: "user@example.com".to_string(),
        order_date: Utc::now().date_naive(),
        total_amount: cart.total_price,
        order_status: ORDER_ACCEPTED.to_string(),
        address_id: address.id,
        payment_id: payment.id,
    };
    let items = cart
        .items
        .iter()
        .map(|item| OrderItem::from_cart_item(order.id, item))
        .collect();
    OrderPlacement {
        order,
        payment,
        items,
        cart_id: cart.id,
        cart_version: cart.version,
        idempotency_key: key.map(String::from),
    }
}

#[tokio::test]
#[serial]
async fn product_roundtrip() {
    let store = get_test_store().await;
    let product = seed_product(&store, "Widget", 5, 100.0).await;

    let loaded = store.find_product(product.id).await.unwrap().unwrap();
    assert_eq!(loaded, product);
    assert_eq!(loaded.special_price, 90.0);

    assert!(
        store
            .find_product(ProductId::new())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[serial]
async fn create_cart_is_insert_if_absent() {
    let store = get_test_store().await;
    let user = UserId::new();

    let first = Cart::new(user);
    store.create_cart(&first).await.unwrap();

    // Second insert for the same user is a no-op.
    let second = Cart::new(user);
    store.create_cart(&second).await.unwrap();

    let resolved = store.find_cart_by_user(user).await.unwrap().unwrap();
    assert_eq!(resolved.id, first.id);
}

#[tokio::test]
#[serial]
async fn commit_cart_persists_line_and_total() {
    let store = get_test_store().await;
    let product = seed_product(&store, "Widget", 5, 100.0).await;

    let cart = seed_cart_with_line(&store, &product, 2).await;

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.items[0].product_price, 90.0);
    assert!((cart.total_price - 180.0).abs() < 1e-9);
    assert_eq!(cart.version, 1);
}

#[tokio::test]
#[serial]
async fn commit_cart_rejects_stale_version() {
    let store = get_test_store().await;
    let product = seed_product(&store, "Widget", 5, 100.0).await;

    let mut stale = Cart::new(UserId::new());
    store.create_cart(&stale).await.unwrap();

    let item = CartItem::new(
        stale.id,
        product.id,
        1,
        product.special_price,
        product.discount,
    );
    stale.items.push(item.clone());
    stale.recompute_total();
    store
        .commit_cart(&stale, &CartChange::UpsertItem(item.clone()))
        .await
        .unwrap();

    // Re-using the pre-commit version must conflict.
    let result = store
        .commit_cart(&stale, &CartChange::UpsertItem(item))
        .await;
    assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
}

#[tokio::test]
#[serial]
async fn duplicate_cart_line_hits_unique_index() {
    let store = get_test_store().await;
    let product = seed_product(&store, "Widget", 5, 100.0).await;
    let cart = seed_cart_with_line(&store, &product, 2).await;

    // A second line for the same product with a fresh item id.
    let mut with_dup = cart.clone();
    let duplicate = CartItem::new(cart.id, product.id, 1, 90.0, 10.0);
    with_dup.items.push(duplicate.clone());
    with_dup.recompute_total();

    let result = store
        .commit_cart(&with_dup, &CartChange::UpsertItem(duplicate))
        .await;
    assert!(matches!(result, Err(StoreError::DuplicateCartLine { .. })));
}

#[tokio::test]
#[serial]
async fn remove_item_change_deletes_line() {
    let store = get_test_store().await;
    let product = seed_product(&store, "Widget", 5, 100.0).await;
    let mut cart = seed_cart_with_line(&store, &product, 2).await;

    let item = cart.take_item(product.id).unwrap();
    cart.recompute_total();
    store
        .commit_cart(&cart, &CartChange::RemoveItem(item.id))
        .await
        .unwrap();

    let loaded = store.find_cart(cart.id).await.unwrap().unwrap();
    assert!(loaded.items.is_empty());
    assert_eq!(loaded.total_price, 0.0);
}

#[tokio::test]
#[serial]
async fn place_order_is_atomic_and_decrements_stock() {
    let store = get_test_store().await;
    let product = seed_product(&store, "Widget", 5, 100.0).await;
    let cart = seed_cart_with_line(&store, &product, 3).await;
    let address = seed_address(&store).await;

    let placement = placement_for(&cart, &address, None);
    store.place_order(&placement).await.unwrap();

    let stocked = store.find_product(product.id).await.unwrap().unwrap();
    assert_eq!(stocked.quantity, 2);

    let emptied = store.find_cart(cart.id).await.unwrap().unwrap();
    assert!(emptied.items.is_empty());
    assert_eq!(emptied.total_price, 0.0);

    let record = store
        .find_order(placement.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.items.len(), 1);
    assert_eq!(record.items[0].quantity, 3);
    assert_eq!(record.payment.payment_method, "card");
    assert!((record.order.total_amount - 270.0).abs() < 1e-9);
}

#[tokio::test]
#[serial]
async fn place_order_rolls_back_on_stock_conflict() {
    let store = get_test_store().await;
    let mut product = seed_product(&store, "Widget", 5, 100.0).await;
    let cart = seed_cart_with_line(&store, &product, 3).await;
    let address = seed_address(&store).await;

    // Stock shrinks after the cart was filled.
    product.quantity = 1;
    store.update_product(&product).await.unwrap();

    let placement = placement_for(&cart, &address, None);
    let result = store.place_order(&placement).await;
    assert!(matches!(result, Err(StoreError::StockConflict { .. })));

    // Everything rolled back: no order, no payment rows, cart intact.
    assert!(
        store
            .find_order(placement.order.id)
            .await
            .unwrap()
            .is_none()
    );
    let untouched = store.find_cart(cart.id).await.unwrap().unwrap();
    assert_eq!(untouched.items.len(), 1);
    let stocked = store.find_product(product.id).await.unwrap().unwrap();
    assert_eq!(stocked.quantity, 1);
}

#[tokio::test]
#[serial]
async fn idempotency_key_resolves_to_order() {
    let store = get_test_store().await;
    let product = seed_product(&store, "Widget", 5, 100.0).await;
    let cart = seed_cart_with_line(&store, &product, 1).await;
    let address = seed_address(&store).await;

    let placement = placement_for(&cart, &address, Some("retry-token"));
    store.place_order(&placement).await.unwrap();

    assert_eq!(
        store.order_id_for_key("retry-token").await.unwrap(),
        Some(placement.order.id)
    );
    assert_eq!(store.order_id_for_key("other-token").await.unwrap(), None);

    // Replaying the key conflicts instead of double-writing, and the
    // replayed placement leaves no partial rows behind.
    let cart = store.find_cart(cart.id).await.unwrap().unwrap();
    let replay = placement_for(&cart, &address, Some("retry-token"));
    let result = store.place_order(&replay).await;
    assert!(matches!(result, Err(StoreError::IdempotencyConflict { .. })));
    assert!(store.find_order(replay.order.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn paged_listing_sorts_by_price() {
    let store = get_test_store().await;
    let category = Category::new("Tools");
    store.insert_category(&category).await.unwrap();

    for (name, price) in [("Anvil", 90.0), ("Bolt", 10.0), ("Clamp", 50.0)] {
        let product = Product::from_draft(
            category.id,
            UserId::new(),
            ProductDraft {
                name: name.to_string(),
                description: format!("{name} description"),
                quantity: 5,
                price,
                discount: 0.0,
            },
        );
        store.insert_product(&product).await.unwrap();
    }

    let page = store
        .list_products(&PageRequest {
            page_number: 0,
            page_size: 2,
            sort_by: ProductSort::Price,
            sort_order: SortOrder::Asc,
        })
        .await
        .unwrap();

    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 2);
    assert!(!page.last);
    assert_eq!(page.content[0].name, "Bolt");
    assert_eq!(page.content[1].name, "Clamp");

    let search = store
        .search_products("anv", &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(search.total_elements, 1);
    assert_eq!(search.content[0].name, "Anvil");
}

#[tokio::test]
#[serial]
async fn carts_with_product_finds_every_holder() {
    let store = get_test_store().await;
    let product = seed_product(&store, "Widget", 50, 100.0).await;

    let first = seed_cart_with_line(&store, &product, 1).await;
    let second = seed_cart_with_line(&store, &product, 2).await;

    let mut holders = store.carts_with_product(product.id).await.unwrap();
    holders.sort_by_key(CartId::as_uuid);
    let mut expected = vec![first.id, second.id];
    expected.sort_by_key(CartId::as_uuid);
    assert_eq!(holders, expected);
}

#[tokio::test]
#[serial]
async fn address_roundtrip() {
    let store = get_test_store().await;
    let address = seed_address(&store).await;

    let loaded = store.find_address(address.id).await.unwrap().unwrap();
    assert_eq!(loaded, address);

    // Unused ids resolve to nothing, not an error.
    assert!(
        store
            .find_address(AddressId::new())
            .await
            .unwrap()
            .is_none()
    );
}
