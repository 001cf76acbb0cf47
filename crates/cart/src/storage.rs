//! Durable storage backends for a cart.
//!
//! A backend stores one serialized cart. Writes replace the whole cart; the
//! cart is small, so there is no incremental format.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::cart::Cart;
use crate::store::CartError;

/// Where a [`Cart`] is persisted between sessions.
pub trait CartStorage {
    /// Load the last saved cart, or `None` if nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the stored cart cannot be read or parsed.
    fn load(&self) -> Result<Option<Cart>, CartError>;

    /// Replace the stored cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be written.
    fn save(&mut self, cart: &Cart) -> Result<(), CartError>;
}

/// In-memory storage holding the serialized cart.
///
/// Clones share the same slot, so a test can reopen a store over the same
/// storage and observe what the previous store committed.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw JSON last written, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<Cart>, CartError> {
        self.raw()
            .map(|json| serde_json::from_str(&json).map_err(CartError::from))
            .transpose()
    }

    fn save(&mut self, cart: &Cart) -> Result<(), CartError> {
        let json = serde_json::to_string(cart)?;
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }
}

/// Stores the cart as pretty-printed JSON in a single file.
///
/// Saves write a sibling temp file and rename it over the target, so a
/// crash mid-write leaves the previous cart intact.
#[derive(Debug, Clone)]
pub struct JsonFileCartStorage {
    path: PathBuf,
}

impl JsonFileCartStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CartStorage for JsonFileCartStorage {
    fn load(&self) -> Result<Option<Cart>, CartError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&mut self, cart: &Cart) -> Result<(), CartError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(cart)?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use horologe_core::{Price, ProductId};

    use super::*;
    use crate::cart::CartProduct;

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(
            CartProduct {
                product_id: ProductId::new(2),
                name: "Gold Luxury Watch".into(),
                unit_price: Price::new(Decimal::new(29_999, 2)).unwrap(),
                image_url: "http://localhost:5000/uploads/watch2.jpg".into(),
            },
            2,
        );
        cart
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileCartStorage::new(dir.path().join("cart.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cart.json");
        let mut storage = JsonFileCartStorage::new(&path);

        storage.save(&sample_cart()).unwrap();

        assert!(path.exists());
        assert!(!storage.temp_path().exists());
        assert_eq!(storage.load().unwrap(), Some(sample_cart()));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, "{not json").unwrap();

        let storage = JsonFileCartStorage::new(&path);
        assert!(matches!(storage.load(), Err(CartError::Serialization(_))));
    }

    #[test]
    fn test_memory_clones_share_slot() {
        let mut storage = MemoryCartStorage::new();
        let observer = storage.clone();

        storage.save(&sample_cart()).unwrap();

        assert_eq!(observer.load().unwrap(), Some(sample_cart()));
        assert!(observer.raw().unwrap().contains("Gold Luxury Watch"));
    }
}
