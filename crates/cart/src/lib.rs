//! Horologe cart - the shopper's pending selections.
//!
//! The cart lives on the client. It is an ordered list of products with
//! quantities, kept in memory and written to durable local storage after
//! every change so a restart restores the last committed state. Checkout
//! reads the cart, turns it into an order request and clears it once the
//! server has accepted the order.
//!
//! # Modules
//!
//! - [`cart`] - Pure cart data structure and aggregates
//! - [`storage`] - Where a cart is persisted (memory, JSON file)
//! - [`store`] - A cart bound to its storage
//! - [`checkout`] - Order placement against the REST API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod storage;
pub mod store;

pub use cart::{Cart, CartItem, CartProduct};
pub use checkout::{CheckoutError, StoreClient, build_order_request};
pub use storage::{CartStorage, JsonFileCartStorage, MemoryCartStorage};
pub use store::{CartError, CartStore};
