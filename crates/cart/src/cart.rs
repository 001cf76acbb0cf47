//! Pure cart data structure.
//!
//! Nothing in here performs I/O or can fail: every operation is a plain
//! transformation of an in-memory list.

use serde::{Deserialize, Serialize};

use horologe_core::{Price, ProductId};

/// The product snapshot a cart line is created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image_url: String,
}

/// One line of the cart. `quantity` is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image_url: String,
    pub quantity: u32,
}

impl CartItem {
    fn new(product: CartProduct, quantity: u32) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name,
            unit_price: product.unit_price,
            image_url: product.image_url,
            quantity,
        }
    }

    /// `unit_price * quantity`, saturating at [`Price::MAX`].
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Ordered collection of cart lines, at most one per product.
///
/// Items keep insertion order. Deserialization goes through the same
/// mutation functions, so a stored file with duplicate products or zero
/// quantities is normalized on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCart")]
pub struct Cart {
    items: Vec<CartItem>,
}

#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    items: Vec<CartItem>,
}

impl From<StoredCart> for Cart {
    fn from(stored: StoredCart) -> Self {
        let mut cart = Self::new();
        for item in stored.items.into_iter().filter(|item| item.quantity > 0) {
            let quantity = item.quantity;
            cart.add_item(
                CartProduct {
                    product_id: item.product_id,
                    name: item.name,
                    unit_price: item.unit_price,
                    image_url: item.image_url,
                },
                quantity,
            );
        }
        cart
    }
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line is incremented (saturating, there is no upper
    /// bound); otherwise a new line is appended. A quantity of 0 counts as 1.
    pub fn add_item(&mut self, product: CartProduct, quantity: u32) {
        let quantity = quantity.max(1);
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.product_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(quantity);
            }
            None => self.items.push(CartItem::new(product, quantity)),
        }
    }

    /// Remove a product's line. No-op if absent.
    pub fn remove_item(&mut self, product_id: ProductId) {
        self.items.retain(|item| item.product_id != product_id);
    }

    /// Set a line's quantity exactly.
    ///
    /// Zero or below removes the line. Unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) {
        let Ok(quantity @ 1..) = u32::try_from(quantity.min(i64::from(u32::MAX))) else {
            self.remove_item(product_id);
            return;
        };
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            item.quantity = quantity;
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` across all lines, saturating at
    /// [`Price::MAX`].
    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.items.iter().map(CartItem::subtotal).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn watch(id: i32, price: i64) -> CartProduct {
        CartProduct {
            product_id: ProductId::new(id),
            name: format!("Watch {id}"),
            unit_price: Price::new(Decimal::from(price)).unwrap(),
            image_url: format!("/uploads/watch{id}.jpg"),
        }
    }

    fn rupees(amount: i64) -> Price {
        Price::new(Decimal::from(amount)).unwrap()
    }

    #[test]
    fn test_adding_same_product_merges_quantities() {
        let mut cart = Cart::new();
        cart.add_item(watch(1, 100), 2);
        cart.add_item(watch(1, 100), 3);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 5);
    }

    #[test]
    fn test_zero_quantity_add_counts_as_one() {
        let mut cart = Cart::new();
        cart.add_item(watch(1, 100), 0);
        assert_eq!(cart.total_item_count(), 1);
    }

    #[test]
    fn test_add_saturates() {
        let mut cart = Cart::new();
        cart.add_item(watch(1, 1), u32::MAX);
        cart.add_item(watch(1, 1), 10);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut cart = Cart::new();
        cart.add_item(watch(3, 10), 1);
        cart.add_item(watch(1, 10), 1);
        cart.add_item(watch(3, 10), 1);

        let ids: Vec<i32> = cart.items().iter().map(|i| i.product_id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_update_quantity_sets_exactly() {
        let mut cart = Cart::new();
        cart.add_item(watch(1, 100), 2);
        cart.update_quantity(ProductId::new(1), 7);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 7);
    }

    #[test]
    fn test_update_quantity_zero_or_negative_removes() {
        let mut cart = Cart::new();
        cart.add_item(watch(1, 100), 2);
        cart.add_item(watch(2, 100), 2);

        cart.update_quantity(ProductId::new(1), 0);
        cart.update_quantity(ProductId::new(2), -1);

        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_unknown_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(watch(1, 100), 2);
        let before = cart.clone();

        cart.update_quantity(ProductId::new(99), 5);

        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(watch(1, 100), 1);
        cart.remove_item(ProductId::new(2));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_totals_scenario() {
        let mut cart = Cart::new();
        cart.add_item(watch(1, 100), 2);
        cart.add_item(watch(2, 50), 1);
        assert_eq!(cart.total_amount(), rupees(250));
        assert_eq!(cart.total_item_count(), 3);

        cart.remove_item(ProductId::new(1));
        assert_eq!(cart.total_amount(), rupees(50));
        assert_eq!(cart.total_item_count(), 1);
    }

    #[test]
    fn test_clear_resets_totals() {
        let mut cart = Cart::new();
        cart.add_item(watch(1, 100), 4);
        cart.clear();
        assert_eq!(cart.total_item_count(), 0);
        assert_eq!(cart.total_amount(), Price::ZERO);
    }

    #[test]
    fn test_huge_totals_saturate() {
        let mut cart = Cart::new();
        let mut luxury = watch(1, 0);
        luxury.unit_price = Price::MAX;
        cart.add_item(luxury, u32::MAX);
        cart.add_item(watch(2, 50), 1);

        assert_eq!(cart.items()[0].subtotal(), Price::MAX);
        assert_eq!(cart.total_amount(), Price::MAX);
    }

    #[test]
    fn test_totals_track_arbitrary_sequences() {
        // Deterministic pseudo-random walk over the three mutations
        let mut cart = Cart::new();
        let mut seed: u64 = 0x5eed;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let id = i32::try_from((seed >> 33) % 6).unwrap();
            let n = i64::try_from((seed >> 40) % 7).unwrap() - 2;
            match (seed >> 20) % 3 {
                0 => cart.add_item(watch(id, i64::from(id) * 10 + 5), u32::try_from(n.max(0)).unwrap()),
                1 => cart.remove_item(ProductId::new(id)),
                _ => cart.update_quantity(ProductId::new(id), n),
            }

            let count: u64 = cart.items().iter().map(|i| u64::from(i.quantity)).sum();
            let amount: Price = cart
                .items()
                .iter()
                .map(|i| i.unit_price.times(i.quantity))
                .sum();
            assert_eq!(cart.total_item_count(), count);
            assert_eq!(cart.total_amount(), amount);
            assert!(cart.items().iter().all(|i| i.quantity >= 1));
        }
    }

    #[test]
    fn test_load_normalizes_stored_items() {
        let json = r#"{"items": [
            {"productId": 1, "name": "A", "unitPrice": "10", "imageUrl": "", "quantity": 2},
            {"productId": 2, "name": "B", "unitPrice": "20", "imageUrl": "", "quantity": 0},
            {"productId": 1, "name": "A", "unitPrice": "10", "imageUrl": "", "quantity": 1}
        ]}"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_item_count(), 3);
    }
}
