//! Seed the catalog with sample watches.
//!
//! # Usage
//!
//! ```bash
//! horologe seed products            # only into an empty catalog
//! horologe seed products --append   # add the samples regardless
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use horologe_api::db::{RepositoryError, with_timeout};
use horologe_core::{NewProduct, Price, PriceError, ProductCategory};

use super::{DB_TIMEOUT, DatabaseError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid sample price: {0}")]
    Price(#[from] PriceError),
}

/// The four watches of the demo catalog.
///
/// # Errors
///
/// Returns `PriceError` if a sample price is invalid.
pub fn sample_products() -> Result<Vec<NewProduct>, PriceError> {
    let watch = |name: &str,
                 cents: i64,
                 description: &str,
                 image: &str,
                 category: ProductCategory,
                 is_bestseller: bool|
     -> Result<NewProduct, PriceError> {
        Ok(NewProduct {
            name: name.to_owned(),
            description: description.to_owned(),
            price: Price::new(Decimal::new(cents, 2))?,
            image: image.to_owned(),
            category,
            is_bestseller,
            in_stock: true,
        })
    };

    Ok(vec![
        watch(
            "Classic Silver Watch",
            19_999,
            "Elegant silver watch with leather strap",
            "watch1.jpg",
            ProductCategory::Male,
            true,
        )?,
        watch(
            "Gold Luxury Watch",
            29_999,
            "Luxury gold watch with metal strap",
            "watch2.jpg",
            ProductCategory::Female,
            true,
        )?,
        watch(
            "Sport Black Watch",
            14_999,
            "Sports watch with digital display",
            "watch3.jpg",
            ProductCategory::Male,
            false,
        )?,
        watch(
            "Rose Gold Watch",
            24_999,
            "Elegant rose gold watch for women",
            "watch4.jpg",
            ProductCategory::Female,
            true,
        )?,
    ])
}

/// Insert the sample watches.
///
/// Returns how many products were inserted.
///
/// # Errors
///
/// Returns `SeedError` if the database is unreachable or an insert fails.
pub async fn products(append: bool) -> Result<usize, SeedError> {
    let repos = connect().await?;

    let existing = with_timeout(DB_TIMEOUT, repos.products.count()).await?;
    if existing > 0 && !append {
        tracing::warn!(
            existing,
            "Catalog already has products; skipping (use --append to add the samples anyway)"
        );
        return Ok(0);
    }

    let samples = sample_products()?;
    let count = samples.len();
    for product in samples {
        let created = with_timeout(DB_TIMEOUT, repos.products.create(product)).await?;
        tracing::info!("  Seeded #{}: {} ({})", created.id, created.name, created.price);
    }

    tracing::info!("Seeding complete! {} products inserted", count);
    Ok(count)
}
