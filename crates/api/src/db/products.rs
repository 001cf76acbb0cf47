//! Product catalog repository.

use async_trait::async_trait;
use sqlx::PgPool;

use horologe_core::{NewProduct, ProductId, ProductUpdate};

use super::RepositoryError;
use crate::models::{ProductFilter, ProductRecord};

const PRODUCT_COLUMNS: &str = "id, name, description, price, image, category, is_bestseller, \
                               in_stock, created_at, updated_at";

const FILTER_CLAUSE: &str = r"
    WHERE ($1::shop.product_category IS NULL OR category = $1)
      AND (NOT $2 OR is_bestseller)
      AND ($3::TEXT IS NULL
           OR name ILIKE '%' || $3 || '%'
           OR description ILIKE '%' || $3 || '%')
";

/// Catalog storage.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// One page of matching products, newest first, plus the total match count.
    async fn list(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<ProductRecord>, i64), RepositoryError>;

    async fn get(&self, id: ProductId) -> Result<Option<ProductRecord>, RepositoryError>;

    async fn create(&self, product: NewProduct) -> Result<ProductRecord, RepositoryError>;

    /// Apply a partial update. Returns `None` if the product does not exist.
    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<ProductRecord>, RepositoryError>;

    /// Returns whether a product was deleted.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}

/// Escape `LIKE` wildcards so the search term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `PostgreSQL`-backed [`ProductRepository`].
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<ProductRecord>, i64), RepositoryError> {
        let search = filter.search.as_deref().map(escape_like);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM shop.product {FILTER_CLAUSE}"))
                .bind(filter.category)
                .bind(filter.bestseller_only)
                .bind(search.as_deref())
                .fetch_one(&self.pool)
                .await?;

        let products = sqlx::query_as::<_, ProductRecord>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product
            {FILTER_CLAUSE}
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "
        ))
        .bind(filter.category)
        .bind(filter.bestseller_only)
        .bind(search.as_deref())
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((products, total))
    }

    async fn get(&self, id: ProductId) -> Result<Option<ProductRecord>, RepositoryError> {
        let product = sqlx::query_as::<_, ProductRecord>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn create(&self, product: NewProduct) -> Result<ProductRecord, RepositoryError> {
        let record = sqlx::query_as::<_, ProductRecord>(&format!(
            r"
            INSERT INTO shop.product
                (name, description, price, image, category, is_bestseller, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(product.category)
        .bind(product.is_bestseller)
        .bind(product.in_stock)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<ProductRecord>, RepositoryError> {
        let record = sqlx::query_as::<_, ProductRecord>(&format!(
            r"
            UPDATE shop.product
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                image = COALESCE($5, image),
                category = COALESCE($6, category),
                is_bestseller = COALESCE($7, is_bestseller),
                in_stock = COALESCE($8, in_stock),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.description)
        .bind(update.price)
        .bind(update.image)
        .bind(update.category)
        .bind(update.is_bestseller)
        .bind(update.in_stock)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.product")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
