//! Catalog write paths and paged reads.
//!
//! Product mutations re-apply the pricing policy and propagate into live
//! carts: price changes reprice every cart line holding the product, and a
//! deletion removes the product's line from every cart first.

use common::{CategoryId, ProductId, UserId};
use domain::{Category, PageRequest, Product, ProductDraft, ProductPage, ProductView};
use store::StorefrontStore;

use crate::cart::CartService;
use crate::error::{CheckoutError, Result};

/// Service owning the catalog surface consumed by the cart and order core.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
    carts: CartService<S>,
}

impl<S: StorefrontStore + Clone> CatalogService<S> {
    /// Creates a new catalog service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            carts: CartService::new(store.clone()),
            store,
        }
    }

    /// Creates a new category.
    pub async fn add_category(&self, name: impl Into<String>) -> Result<Category> {
        let category = Category::new(name);
        self.store.insert_category(&category).await?;
        Ok(category)
    }

    /// Loads a category by id.
    pub async fn get_category(&self, category_id: CategoryId) -> Result<Category> {
        self.store
            .find_category(category_id)
            .await?
            .ok_or(CheckoutError::CategoryNotFound { category_id })
    }

    /// Adds a product to a category, applying the pricing policy.
    ///
    /// Rejects a name that already exists within the category.
    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn add_product(
        &self,
        category_id: CategoryId,
        seller_id: UserId,
        draft: ProductDraft,
    ) -> Result<ProductView> {
        self.get_category(category_id).await?;
        if self
            .store
            .category_has_product_named(category_id, &draft.name)
            .await?
        {
            return Err(CheckoutError::DuplicateProduct { name: draft.name });
        }

        let product = Product::from_draft(category_id, seller_id, draft);
        self.store.insert_product(&product).await?;
        Ok(ProductView::of_product(&product))
    }

    /// Updates a product's fields, re-derives its special price, and
    /// reprices every cart currently holding the product.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update_product(
        &self,
        product_id: ProductId,
        draft: ProductDraft,
    ) -> Result<ProductView> {
        let mut product = self.require_product(product_id).await?;
        product.apply_draft(draft);
        self.store.update_product(&product).await?;

        for cart_id in self.store.carts_with_product(product_id).await? {
            self.carts.reprice(cart_id, product_id).await?;
        }

        Ok(ProductView::of_product(&product))
    }

    /// Deletes a product, removing its line from every cart first so cart
    /// totals stay consistent.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<ProductView> {
        let product = self.require_product(product_id).await?;

        for cart_id in self.store.carts_with_product(product_id).await? {
            self.carts.remove_from_cart(cart_id, product_id).await?;
        }

        self.store.delete_product(product_id).await?;
        Ok(ProductView::of_product(&product))
    }

    /// Stores the filename produced by the image-upload collaborator.
    #[tracing::instrument(skip(self))]
    pub async fn update_product_image(
        &self,
        product_id: ProductId,
        filename: String,
    ) -> Result<ProductView> {
        let mut product = self.require_product(product_id).await?;
        product.image = filename;
        self.store.update_product(&product).await?;
        Ok(ProductView::of_product(&product))
    }

    /// Loads a product by id.
    pub async fn get_product(&self, product_id: ProductId) -> Result<ProductView> {
        let product = self.require_product(product_id).await?;
        Ok(ProductView::of_product(&product))
    }

    /// Lists all products, paged.
    pub async fn get_products(&self, page: &PageRequest) -> Result<ProductPage> {
        Ok(self.store.list_products(page).await?)
    }

    /// Lists a category's products, paged.
    pub async fn get_products_by_category(
        &self,
        category_id: CategoryId,
        page: &PageRequest,
    ) -> Result<ProductPage> {
        self.get_category(category_id).await?;
        Ok(self.store.products_by_category(category_id, page).await?)
    }

    /// Searches products by a case-insensitive name keyword, paged.
    pub async fn search_products(&self, keyword: &str, page: &PageRequest) -> Result<ProductPage> {
        Ok(self.store.search_products(keyword, page).await?)
    }

    async fn require_product(&self, product_id: ProductId) -> Result<Product> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound { product_id })
    }
}
