//! Local cart and checkout commands.
//!
//! The cart is a JSON file (default `.horologe/cart.json`) that survives
//! between invocations. Adding a product fetches its current name, price and
//! image from the API; checkout posts the cart as an order and clears it once
//! the server accepts.
//!
//! # Usage
//!
//! ```bash
//! horologe cart add 3 --quantity 2
//! horologe cart set 3 1
//! horologe cart list
//! horologe checkout --token $HOROLOGE_TOKEN --first-name Ada ...
//! ```

use std::fmt::Write as _;

use thiserror::Error;

use horologe_cart::{CartError, CartProduct, CartStorage, CartStore, CheckoutError, StoreClient};
use horologe_core::{Order, ProductId, ShippingAddress};

#[derive(Debug, Error)]
pub enum CartCommandError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Fetch a product from the API and add it to the cart.
///
/// # Errors
///
/// Returns `CartCommandError` if the product cannot be fetched or the cart
/// cannot be saved.
pub async fn add<S: CartStorage>(
    store: &mut CartStore<S>,
    client: &StoreClient,
    product_id: ProductId,
    quantity: u32,
) -> Result<CartProduct, CartCommandError> {
    if quantity == 0 {
        return Err(CartCommandError::InvalidQuantity);
    }
    let product = client.product(product_id).await?;
    store.add_item(product.clone(), quantity)?;
    tracing::info!("Added {} x {} to the cart", quantity, product.name);
    Ok(product)
}

/// # Errors
///
/// Returns `CartCommandError::Cart` if the cart cannot be saved.
pub fn remove<S: CartStorage>(
    store: &mut CartStore<S>,
    product_id: ProductId,
) -> Result<(), CartCommandError> {
    store.remove_item(product_id)?;
    Ok(())
}

/// Set a line's quantity. Zero or less removes the line.
///
/// # Errors
///
/// Returns `CartCommandError::Cart` if the cart cannot be saved.
pub fn set<S: CartStorage>(
    store: &mut CartStore<S>,
    product_id: ProductId,
    quantity: i64,
) -> Result<(), CartCommandError> {
    store.update_quantity(product_id, quantity)?;
    Ok(())
}

/// # Errors
///
/// Returns `CartCommandError::Cart` if the cart cannot be saved.
pub fn clear<S: CartStorage>(store: &mut CartStore<S>) -> Result<(), CartCommandError> {
    store.clear_cart()?;
    Ok(())
}

/// Render the cart as a plain-text table.
#[must_use]
pub fn summary<S: CartStorage>(store: &CartStore<S>) -> String {
    if store.items().is_empty() {
        return "Your cart is empty.\n".to_owned();
    }

    let mut out = String::new();
    for item in store.items() {
        let _ = writeln!(
            out,
            "{:<6} {:<28} {:>3} x {:>10} = {:>10}",
            format!("#{}", item.product_id),
            item.name,
            item.quantity,
            item.unit_price.to_string(),
            item.subtotal().to_string(),
        );
    }
    let _ = writeln!(
        out,
        "{} item(s), total {}",
        store.total_item_count(),
        store.total_amount()
    );
    out
}

/// Place an order for the whole cart.
///
/// # Errors
///
/// Returns `CartCommandError::Checkout` if the cart is empty or the server
/// rejects the order. The cart is left untouched in that case.
pub async fn checkout<S: CartStorage>(
    store: &mut CartStore<S>,
    client: &StoreClient,
    shipping_address: ShippingAddress,
    payment_method: &str,
) -> Result<Order, CartCommandError> {
    let order = client
        .place_order(store, shipping_address, payment_method)
        .await?;
    tracing::info!(
        "Order #{} placed: {} ({})",
        order.id,
        order.total_price,
        order.state
    );
    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use horologe_cart::{JsonFileCartStorage, MemoryCartStorage};
    use horologe_core::Price;
    use rust_decimal::Decimal;

    use super::*;

    fn watch(id: i32, cents: i64) -> CartProduct {
        CartProduct {
            product_id: ProductId::new(id),
            name: format!("Watch {id}"),
            unit_price: Price::new(Decimal::new(cents, 2)).unwrap(),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_summary_lists_lines_and_total() {
        let mut store = CartStore::open(MemoryCartStorage::new()).unwrap();
        assert_eq!(summary(&store), "Your cart is empty.\n");

        store.add_item(watch(1, 10_000), 2).unwrap();
        store.add_item(watch(2, 5_000), 1).unwrap();
        let text = summary(&store);

        assert!(text.contains("Watch 1"));
        assert!(text.contains("Watch 2"));
        assert!(text.ends_with("3 item(s), total ₹250.00\n"));
    }

    #[test]
    fn test_file_cart_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".horologe").join("cart.json");

        let mut store = CartStore::open(JsonFileCartStorage::new(&path)).unwrap();
        store.add_item(watch(1, 10_000), 2).unwrap();
        set(&mut store, ProductId::new(1), 5).unwrap();
        drop(store);

        let mut store = CartStore::open(JsonFileCartStorage::new(&path)).unwrap();
        assert_eq!(store.total_item_count(), 5);

        remove(&mut store, ProductId::new(1)).unwrap();
        let store = CartStore::open(JsonFileCartStorage::new(&path)).unwrap();
        assert_eq!(store.total_item_count(), 0);
    }
}
