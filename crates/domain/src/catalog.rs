//! Catalog entities: products and categories.

use common::{CategoryId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::pricing;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Creates a new category with a fresh identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
        }
    }
}

/// A sellable product.
///
/// `special_price` is derived from `price` and `discount` by the pricing
/// policy and must be re-applied on every price or discount mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub seller_id: UserId,
    pub name: String,
    pub description: String,
    pub image: String,
    /// On-hand stock.
    pub quantity: u32,
    pub price: f64,
    /// Discount percentage, 0–100.
    pub discount: f64,
    pub special_price: f64,
}

impl Product {
    /// Creates a product from a draft, applying the pricing policy.
    pub fn from_draft(category_id: CategoryId, seller_id: UserId, draft: ProductDraft) -> Self {
        Self {
            id: ProductId::new(),
            category_id,
            seller_id,
            name: draft.name,
            description: draft.description,
            image: "default.png".to_string(),
            quantity: draft.quantity,
            price: draft.price,
            discount: draft.discount,
            special_price: pricing::special_price(draft.price, draft.discount),
        }
    }

    /// Applies a draft's fields onto the product and re-derives the
    /// special price.
    pub fn apply_draft(&mut self, draft: ProductDraft) {
        self.name = draft.name;
        self.description = draft.description;
        self.quantity = draft.quantity;
        self.price = draft.price;
        self.discount = draft.discount;
        self.special_price = pricing::special_price(self.price, self.discount);
    }
}

/// Caller-supplied product fields for create and update paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub price: f64,
    pub discount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            quantity: 5,
            price: 100.0,
            discount: 10.0,
        }
    }

    #[test]
    fn test_from_draft_derives_special_price() {
        let product = Product::from_draft(CategoryId::new(), UserId::new(), draft());
        assert_eq!(product.special_price, 90.0);
        assert_eq!(product.image, "default.png");
    }

    #[test]
    fn test_apply_draft_rederives_special_price() {
        let mut product = Product::from_draft(CategoryId::new(), UserId::new(), draft());
        let mut updated = draft();
        updated.price = 200.0;
        updated.discount = 25.0;
        product.apply_draft(updated);
        assert_eq!(product.special_price, 150.0);
    }
}
