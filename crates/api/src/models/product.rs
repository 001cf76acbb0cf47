//! Catalog models.

use chrono::{DateTime, Utc};

use horologe_core::{Price, Product, ProductCategory, ProductId};

use crate::images::ImageResolver;

/// A catalog entry as stored. `image` is the raw stored reference.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    pub category: ProductCategory,
    pub is_bestseller: bool,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Convert into the API representation, resolving the image URL.
    #[must_use]
    pub fn into_product(self, images: &ImageResolver) -> Product {
        let image_url = images.resolve(&self.image);
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            image: self.image,
            image_url,
            category: self.category,
            is_bestseller: self.is_bestseller,
            in_stock: self.in_stock,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Catalog listing criteria. Results are newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub bestseller_only: bool,
    /// Case-insensitive substring matched against name and description.
    pub search: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            bestseller_only: false,
            search: None,
            offset: 0,
            limit: 10,
        }
    }
}

impl ProductFilter {
    /// Whether a record satisfies the category, bestseller and search criteria.
    #[must_use]
    pub fn matches(&self, product: &ProductRecord) -> bool {
        if self.category.is_some_and(|c| c != product.category) {
            return false;
        }
        if self.bestseller_only && !product.is_bestseller {
            return false;
        }
        self.search.as_deref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            product.name.to_lowercase().contains(&needle)
                || product.description.to_lowercase().contains(&needle)
        })
    }
}
