//! Product catalog wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Price, ProductCategory, ProductId};

/// A watch in the catalog, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Stored image reference (file name, `/uploads/...` path or URL).
    pub image: String,
    /// `image` resolved to a URL a browser can fetch.
    pub image_url: String,
    pub category: ProductCategory,
    pub is_bestseller: bool,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total_pages: u32,
    pub current_page: u32,
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    pub category: ProductCategory,
    #[serde(default)]
    pub is_bestseller: bool,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

/// Body of `PUT /api/products/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub image: Option<String>,
    pub category: Option<ProductCategory>,
    pub is_bestseller: Option<bool>,
    pub in_stock: Option<bool>,
}

impl ProductUpdate {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image.is_none()
            && self.category.is_none()
            && self.is_bestseller.is_none()
            && self.in_stock.is_none()
    }
}
