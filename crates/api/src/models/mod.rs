//! Domain models for the API.
//!
//! These are the server-side records the repositories hand back. The wire
//! types clients see live in `horologe-core`.

pub mod order;
pub mod product;
pub mod user;

use horologe_core::{Email, UserId};

pub use order::{NewOrder, OrderRecord, Transition};
pub use product::{ProductFilter, ProductRecord};
pub use user::{NewUser, ProfileChanges, User};

/// The authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub is_admin: bool,
}
