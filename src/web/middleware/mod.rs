//! HTTP middleware
//!
//! Tower layers and `axum::middleware` functions used by the chain builder.

pub mod auth;
pub mod csrf;
pub mod recover;
pub mod security_headers;

pub use auth::{authenticate, require_authenticated_user};
pub use csrf::{CsrfLayer, CsrfToken};
pub use recover::handle_panic;
pub use security_headers::SecurityHeadersLayer;
