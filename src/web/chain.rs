//! Assembles the middleware stacks around the routers.
//!
//! Requests pass through the layers in this order:
//!
//! ```text
//! panic recovery -> request trace -> security headers
//!     -> /static/*                               (files, no session)
//!     -> csrf -> session -> authenticate -> dynamic routes
//! ```

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    middleware, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnRequest, TraceLayer},
};
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer, SessionStore};
use tracing::{info_span, Level, Span};

use crate::config::SessionSettings;
use crate::web::middleware::{authenticate, handle_panic, CsrfLayer, SecurityHeadersLayer};
use crate::web::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Wraps the dynamic routes with CSRF protection, sessions and user lookup,
/// then applies `state`.
pub fn dynamic<Store>(
    router: Router<AppState>,
    state: AppState,
    store: Store,
    settings: &SessionSettings,
) -> Router
where
    Store: SessionStore + Clone,
{
    let sessions = SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_secure(settings.secure)
        .with_same_site(SameSite::Strict)
        .with_expiry(Expiry::OnInactivity(settings.lifetime))
        .with_signed(settings.key.clone());

    router
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(sessions)
        .layer(CsrfLayer::new(settings.secure))
        .with_state(state)
}

/// Wraps everything, static files included, with panic recovery, request
/// tracing and security headers.
pub fn outer(router: Router) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(request_span)
        .on_request(DefaultOnRequest::new().level(Level::INFO));

    router
        .layer(SecurityHeadersLayer::new())
        .layer(trace)
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// The remote address is `-` when served without connect info, as in tests.
fn request_span(req: &Request) -> Span {
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_owned(), |ConnectInfo(addr)| addr.to_string());

    info_span!(
        "request",
        remote_addr = %remote_addr,
        version = ?req.version(),
        method = %req.method(),
        uri = %req.uri(),
    )
}
