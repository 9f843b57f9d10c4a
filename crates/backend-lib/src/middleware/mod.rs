// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the linkshelf API.

pub mod auth;
pub mod cors;

pub use auth::require_auth;
pub use cors::cors_layer;
