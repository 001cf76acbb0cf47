//! Horologe Core - Shared types library.
//!
//! This crate provides the types shared by every Horologe component:
//! - `api` - The REST backend (auth, catalog, orders)
//! - `cart` - The client-side cart store and checkout client
//! - `cli` - Command-line tools for migrations, seeding and local carts
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Request and response bodies live here so the server
//! and its clients cannot drift apart.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, emails, statuses and order wire types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
