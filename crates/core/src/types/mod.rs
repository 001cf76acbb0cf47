//! Core types for Horologe.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the request/response bodies of the REST API.

pub mod account;
pub mod catalog;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use account::*;
pub use catalog::*;
pub use email::{Email, EmailError};
pub use id::*;
pub use order::*;
pub use price::{Price, PriceError};
pub use status::*;
