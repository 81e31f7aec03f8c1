use chrono::NaiveDate;
use common::{AddressId, CartId, CategoryId, OrderId, ProductId, UserId};
use domain::{
    Address, Cart, CartItem, Category, Order, OrderItem, PageRequest, Payment, Product,
    ProductPage, ProductSort, SortOrder,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{CartChange, OrderPlacement, OrderRecord, StorefrontStore},
};

use async_trait::async_trait;

/// PostgreSQL-backed storefront store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_category(row: PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            name: row.try_get("name")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            seller_id: UserId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            image: row.try_get("image")?,
            quantity: row.try_get::<i64, _>("quantity")? as u32,
            price: row.try_get("price")?,
            discount: row.try_get("discount")?,
            special_price: row.try_get("special_price")?,
        })
    }

    fn row_to_address(row: PgRow) -> Result<Address> {
        Ok(Address {
            id: AddressId::from_uuid(row.try_get::<Uuid, _>("address_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            street: row.try_get("street")?,
            building_name: row.try_get("building_name")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            country: row.try_get("country")?,
            pincode: row.try_get("pincode")?,
        })
    }

    fn row_to_cart_item(row: PgRow) -> Result<CartItem> {
        Ok(CartItem {
            id: common::CartItemId::from_uuid(row.try_get::<Uuid, _>("cart_item_id")?),
            cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get::<i64, _>("quantity")? as u32,
            product_price: row.try_get("product_price")?,
            discount: row.try_get("discount")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            email: row.try_get("email")?,
            order_date: row.try_get::<NaiveDate, _>("order_date")?,
            total_amount: row.try_get("total_amount")?,
            order_status: row.try_get("order_status")?,
            address_id: AddressId::from_uuid(row.try_get::<Uuid, _>("address_id")?),
            payment_id: common::PaymentId::from_uuid(row.try_get::<Uuid, _>("payment_id")?),
        })
    }

    fn row_to_payment(row: PgRow) -> Result<Payment> {
        Ok(Payment {
            id: common::PaymentId::from_uuid(row.try_get::<Uuid, _>("payment_id")?),
            payment_method: row.try_get("payment_method")?,
            pg_name: row.try_get("pg_name")?,
            pg_payment_id: row.try_get("pg_payment_id")?,
            pg_status: row.try_get("pg_status")?,
            pg_response_message: row.try_get("pg_response_message")?,
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: common::OrderItemId::from_uuid(row.try_get::<Uuid, _>("order_item_id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get::<i64, _>("quantity")? as u32,
            discount: row.try_get("discount")?,
            ordered_product_price: row.try_get("ordered_product_price")?,
        })
    }

    fn order_clause(page: &PageRequest) -> String {
        let column = match page.sort_by {
            ProductSort::Name => "name",
            ProductSort::Price => "price",
        };
        let direction = match page.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        format!("ORDER BY {column} {direction}")
    }

    async fn load_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>> {
        let rows = sqlx::query(
            r#"
            SELECT cart_item_id, cart_id, product_id, quantity, product_price, discount
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart_item).collect()
    }

    async fn assemble_cart(&self, row: PgRow) -> Result<Cart> {
        let id = CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?);
        let items = self.load_cart_items(id).await?;
        Ok(Cart {
            id,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            total_price: row.try_get("total_price")?,
            version: row.try_get("version")?,
        })
    }
}

#[async_trait]
impl StorefrontStore for PostgresStore {
    async fn insert_category(&self, category: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (category_id, name) VALUES ($1, $2)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT category_id, name FROM categories WHERE category_id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_category).transpose()
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products
                (product_id, category_id, seller_id, name, description, image,
                 quantity, price, discount, special_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.category_id.as_uuid())
        .bind(product.seller_id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image)
        .bind(i64::from(product.quantity))
        .bind(product.price)
        .bind(product.discount)
        .bind(product.special_price)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT product_id, category_id, seller_id, name, description, image,
                   quantity, price, discount, special_price
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_product).transpose()
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, image = $4, quantity = $5,
                price = $6, discount = $7, special_price = $8
            WHERE product_id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image)
        .bind(i64::from(product.quantity))
        .bind(product.price)
        .bind(product.discount)
        .bind(product.special_price)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn category_has_product_named(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE category_id = $1 AND name = $2",
        )
        .bind(category_id.as_uuid())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn list_products(&self, page: &PageRequest) -> Result<ProductPage> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT product_id, category_id, seller_id, name, description, image,
                   quantity, price, discount, special_price
            FROM products
            {}
            LIMIT $1 OFFSET $2
            "#,
            Self::order_clause(page)
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(page.page_size))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let content = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;
        Ok(ProductPage::new(content, page, total as u64))
    }

    async fn products_by_category(
        &self,
        category_id: CategoryId,
        page: &PageRequest,
    ) -> Result<ProductPage> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(category_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT product_id, category_id, seller_id, name, description, image,
                   quantity, price, discount, special_price
            FROM products
            WHERE category_id = $1
            {}
            LIMIT $2 OFFSET $3
            "#,
            Self::order_clause(page)
        );
        let rows = sqlx::query(&sql)
            .bind(category_id.as_uuid())
            .bind(i64::from(page.page_size))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let content = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;
        Ok(ProductPage::new(content, page, total as u64))
    }

    async fn search_products(&self, keyword: &str, page: &PageRequest) -> Result<ProductPage> {
        let pattern = format!("%{keyword}%");

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE name ILIKE $1")
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT product_id, category_id, seller_id, name, description, image,
                   quantity, price, discount, special_price
            FROM products
            WHERE name ILIKE $1
            {}
            LIMIT $2 OFFSET $3
            "#,
            Self::order_clause(page)
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(i64::from(page.page_size))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let content = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;
        Ok(ProductPage::new(content, page, total as u64))
    }

    async fn insert_address(&self, address: &Address) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO addresses
                (address_id, user_id, street, building_name, city, state, country, pincode)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(address.id.as_uuid())
        .bind(address.user_id.as_uuid())
        .bind(&address.street)
        .bind(&address.building_name)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.pincode)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_address(&self, id: AddressId) -> Result<Option<Address>> {
        let row = sqlx::query(
            r#"
            SELECT address_id, user_id, street, building_name, city, state, country, pincode
            FROM addresses
            WHERE address_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_address).transpose()
    }

    async fn create_cart(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (cart_id, user_id, total_price, version)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.user_id.as_uuid())
        .bind(cart.total_price)
        .bind(cart.version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>> {
        let row =
            sqlx::query("SELECT cart_id, user_id, total_price, version FROM carts WHERE cart_id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some(row) => Ok(Some(self.assemble_cart(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        let row =
            sqlx::query("SELECT cart_id, user_id, total_price, version FROM carts WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some(row) => Ok(Some(self.assemble_cart(row).await?)),
            None => Ok(None),
        }
    }

    async fn all_carts(&self) -> Result<Vec<Cart>> {
        let rows = sqlx::query("SELECT cart_id, user_id, total_price, version FROM carts")
            .fetch_all(&self.pool)
            .await?;

        let mut carts = Vec::with_capacity(rows.len());
        for row in rows {
            carts.push(self.assemble_cart(row).await?);
        }
        Ok(carts)
    }

    async fn carts_with_product(&self, product_id: ProductId) -> Result<Vec<CartId>> {
        let rows = sqlx::query("SELECT DISTINCT cart_id FROM cart_items WHERE product_id = $1")
            .bind(product_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| Ok(CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?)))
            .collect()
    }

    #[tracing::instrument(skip(self, cart, change), fields(cart_id = %cart.id))]
    async fn commit_cart(&self, cart: &Cart, change: &CartChange) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE carts
            SET total_price = $2, version = version + 1
            WHERE cart_id = $1 AND version = $3
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.total_price)
        .bind(cart.version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::VersionConflict {
                cart_id: cart.id,
                expected: cart.version,
            });
        }

        match change {
            CartChange::UpsertItem(item) => {
                sqlx::query(
                    r#"
                    INSERT INTO cart_items
                        (cart_item_id, cart_id, product_id, quantity, product_price, discount)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (cart_item_id) DO UPDATE
                    SET quantity = EXCLUDED.quantity,
                        product_price = EXCLUDED.product_price,
                        discount = EXCLUDED.discount
                    "#,
                )
                .bind(item.id.as_uuid())
                .bind(item.cart_id.as_uuid())
                .bind(item.product_id.as_uuid())
                .bind(i64::from(item.quantity))
                .bind(item.product_price)
                .bind(item.discount)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    // The unique (cart_id, product_id) index backstops the
                    // one-line-per-product invariant.
                    if let sqlx::Error::Database(ref db_err) = e
                        && db_err.constraint() == Some("uq_cart_items_cart_product")
                    {
                        return StoreError::DuplicateCartLine {
                            cart_id: item.cart_id,
                            product_id: item.product_id,
                        };
                    }
                    StoreError::Database(e)
                })?;
            }
            CartChange::RemoveItem(item_id) => {
                sqlx::query("DELETE FROM cart_items WHERE cart_item_id = $1")
                    .bind(item_id.as_uuid())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, placement), fields(order_id = %placement.order.id))]
    async fn place_order(&self, placement: &OrderPlacement) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let payment = &placement.payment;
        sqlx::query(
            r#"
            INSERT INTO payments
                (payment_id, payment_method, pg_name, pg_payment_id, pg_status, pg_response_message)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(&payment.payment_method)
        .bind(&payment.pg_name)
        .bind(&payment.pg_payment_id)
        .bind(&payment.pg_status)
        .bind(&payment.pg_response_message)
        .execute(&mut *tx)
        .await?;

        let order = &placement.order;
        sqlx::query(
            r#"
            INSERT INTO orders
                (order_id, email, order_date, total_amount, order_status, address_id, payment_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.email)
        .bind(order.order_date)
        .bind(order.total_amount)
        .bind(&order.order_status)
        .bind(order.address_id.as_uuid())
        .bind(order.payment_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        if let Some(key) = &placement.idempotency_key {
            sqlx::query("INSERT INTO order_idempotency (idempotency_key, order_id) VALUES ($1, $2)")
                .bind(key)
                .bind(order.id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e
                        && db_err.constraint() == Some("order_idempotency_pkey")
                    {
                        return StoreError::IdempotencyConflict { key: key.clone() };
                    }
                    StoreError::Database(e)
                })?;
        }

        for item in &placement.items {
            sqlx::query(
                r#"
                INSERT INTO order_items
                    (order_item_id, order_id, product_id, quantity, discount, ordered_product_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .bind(item.discount)
            .bind(item.ordered_product_price)
            .execute(&mut *tx)
            .await?;
        }

        // Compare-and-decrement: losers of a stock race fail here and the
        // whole placement rolls back.
        for item in &placement.items {
            let decremented = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity - $2
                WHERE product_id = $1 AND quantity >= $2
                "#,
            )
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                return Err(StoreError::StockConflict {
                    product_id: item.product_id,
                });
            }
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(placement.cart_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        let emptied = sqlx::query(
            r#"
            UPDATE carts
            SET total_price = 0, version = version + 1
            WHERE cart_id = $1 AND version = $2
            "#,
        )
        .bind(placement.cart_id.as_uuid())
        .bind(placement.cart_version)
        .execute(&mut *tx)
        .await?;

        if emptied.rows_affected() == 0 {
            return Err(StoreError::VersionConflict {
                cart_id: placement.cart_id,
                expected: placement.cart_version,
            });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, email, order_date, total_amount, order_status, address_id, payment_id
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = Self::row_to_order(row)?;

        let payment_row = sqlx::query(
            r#"
            SELECT payment_id, payment_method, pg_name, pg_payment_id, pg_status, pg_response_message
            FROM payments
            WHERE payment_id = $1
            "#,
        )
        .bind(order.payment_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        let payment = Self::row_to_payment(payment_row)?;

        let item_rows = sqlx::query(
            r#"
            SELECT order_item_id, order_id, product_id, quantity, discount, ordered_product_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let items = item_rows
            .into_iter()
            .map(Self::row_to_order_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(OrderRecord {
            order,
            payment,
            items,
        }))
    }

    async fn order_id_for_key(&self, key: &str) -> Result<Option<OrderId>> {
        let row = sqlx::query("SELECT order_id FROM order_idempotency WHERE idempotency_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Ok(OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?)))
            .transpose()
    }
}
