//! A cart bound to its storage.
//!
//! `CartStore` owns the in-memory cart and a storage backend. Every mutation
//! updates memory first and then synchronously writes the whole cart, so
//! reopening a store over the same storage restores the last committed
//! state.

use thiserror::Error;

use horologe_core::{Price, ProductId};

use crate::cart::{Cart, CartItem, CartProduct};
use crate::storage::CartStorage;

/// Errors from persisting or restoring a cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// Reading or writing the backing store failed.
    #[error("cart storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored cart could not be encoded or decoded.
    #[error("cart serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The shopper's cart plus the storage it is persisted to.
#[derive(Debug)]
pub struct CartStore<S> {
    cart: Cart,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Open a store, restoring the saved cart or starting empty.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the saved cart exists but cannot be read.
    pub fn open(storage: S) -> Result<Self, CartError> {
        let cart = storage.load()?.unwrap_or_default();
        tracing::debug!(items = cart.items().len(), "cart restored");
        Ok(Self { cart, storage })
    }

    /// Read-only view of the cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    /// See [`Cart::add_item`].
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be persisted.
    pub fn add_item(&mut self, product: CartProduct, quantity: u32) -> Result<(), CartError> {
        self.cart.add_item(product, quantity);
        self.persist()
    }

    /// See [`Cart::remove_item`].
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be persisted.
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<(), CartError> {
        self.cart.remove_item(product_id);
        self.persist()
    }

    /// See [`Cart::update_quantity`].
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be persisted.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) -> Result<(), CartError> {
        self.cart.update_quantity(product_id, quantity);
        self.persist()
    }

    /// Empty the cart. Checkout calls this once the order is accepted.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be persisted.
    pub fn clear_cart(&mut self) -> Result<(), CartError> {
        self.cart.clear();
        self.persist()
    }

    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.cart.total_item_count()
    }

    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.cart.total_amount()
    }

    fn persist(&mut self) -> Result<(), CartError> {
        self.storage.save(&self.cart)?;
        tracing::debug!(
            items = self.cart.items().len(),
            quantity = self.cart.total_item_count(),
            "cart persisted"
        );
        Ok(())
    }
}
