//! Business logic.
//!
//! Services borrow the shared repositories from `AppState` for the length
//! of one request. Authorization decisions that depend on the caller live
//! here rather than in the route layer.

pub mod auth;
pub mod catalog;
pub mod orders;
