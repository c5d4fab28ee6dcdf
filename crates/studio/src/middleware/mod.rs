//! HTTP middleware and extractors for the studio API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Security headers (JSON API responses are never cached or framed)
//!
//! Authentication is an extractor rather than a layer: handlers that take
//! [`RequireUser`] reject unauthenticated requests.

pub mod auth;
pub mod security_headers;

pub use auth::RequireUser;
pub use security_headers::security_headers_middleware;
