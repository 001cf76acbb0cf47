//! Product catalog service.

use std::time::Duration;

use thiserror::Error;

use horologe_core::{NewProduct, Product, ProductCategory, ProductId, ProductPage, ProductUpdate};

use crate::db::{Repositories, RepositoryError, with_timeout};
use crate::images::ImageResolver;
use crate::models::{ProductFilter, ProductRecord};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("product {0} not found")]
    NotFound(ProductId),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One page of catalog search criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: Option<ProductCategory>,
    pub bestseller_only: bool,
    pub search: Option<String>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            category: None,
            bestseller_only: false,
            search: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogQuery {
    /// Clamp page and limit into range and drop blank search terms.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self.search = self
            .search
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        self
    }

    fn filter(&self) -> ProductFilter {
        ProductFilter {
            category: self.category,
            bestseller_only: self.bestseller_only,
            search: self.search.clone(),
            offset: i64::from(self.page - 1) * i64::from(self.limit),
            limit: i64::from(self.limit),
        }
    }
}

/// Catalog reads and admin writes.
pub struct CatalogService<'a> {
    repos: &'a Repositories,
    images: &'a ImageResolver,
    timeout: Duration,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories, images: &'a ImageResolver, timeout: Duration) -> Self {
        Self {
            repos,
            images,
            timeout,
        }
    }

    /// List matching products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if storage fails.
    pub async fn list(&self, query: CatalogQuery) -> Result<ProductPage, CatalogError> {
        let query = query.normalized();
        let filter = query.filter();
        let (records, total) = with_timeout(self.timeout, self.repos.products.list(&filter)).await?;

        let total = u64::try_from(total).unwrap_or(0);
        let total_pages = u32::try_from(total.div_ceil(u64::from(query.limit))).unwrap_or(u32::MAX);

        Ok(ProductPage {
            products: records
                .into_iter()
                .map(|r| r.into_product(self.images))
                .collect(),
            total_pages,
            current_page: query.page,
        })
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist.
    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        let record = with_timeout(self.timeout, self.repos.products.get(id))
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        Ok(record.into_product(self.images))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the name is blank.
    pub async fn create(&self, product: NewProduct) -> Result<Product, CatalogError> {
        if product.name.trim().is_empty() {
            return Err(CatalogError::Validation("product name is required".to_owned()));
        }
        let record = with_timeout(self.timeout, self.repos.products.create(product)).await?;
        tracing::info!(product_id = %record.id, name = %record.name, "product created");
        Ok(record.into_product(self.images))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for an empty or blank-named update
    /// and `CatalogError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        if update.is_empty() {
            return Err(CatalogError::Validation("no fields to update".to_owned()));
        }
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(CatalogError::Validation("product name cannot be blank".to_owned()));
        }
        let record: ProductRecord =
            with_timeout(self.timeout, self.repos.products.update(id, update))
                .await?
                .ok_or(CatalogError::NotFound(id))?;
        Ok(record.into_product(self.images))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        if !with_timeout(self.timeout, self.repos.products.delete(id)).await? {
            return Err(CatalogError::NotFound(id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}
