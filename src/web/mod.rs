//! The HTTP surface: handlers, routing and the middleware around them.

pub mod chain;
pub mod context;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

pub use context::{AuthenticatedUser, RequestContext};
pub use routes::app;
pub use state::AppState;
