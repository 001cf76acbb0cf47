//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (configured storefront origins)
//!
//! Authentication is per-route, through the [`RequireAuth`] and
//! [`RequireAdmin`] extractors.

pub mod auth;
pub mod request_id;

pub use auth::{BearerToken, RequireAdmin, RequireAuth};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
