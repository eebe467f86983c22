use std::path::Path;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_sessions::SessionStore;

use crate::config::SessionSettings;
use crate::web::chain;
use crate::web::handlers;
use crate::web::middleware::require_authenticated_user;
use crate::web::state::AppState;

/// Routes that need sessions, CSRF protection and the current user.
pub fn dynamic_routes() -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/session/create",
            get(handlers::create_session_form).post(handlers::create_session),
        )
        .route("/user/logout", post(handlers::logout))
        .route_layer(middleware::from_fn(require_authenticated_user));

    Router::new()
        .route("/", get(handlers::home))
        .route("/session/{id}", get(handlers::show_session))
        .route("/user/signup", get(handlers::signup_form).post(handlers::signup))
        .route("/user/login", get(handlers::login_form).post(handlers::login))
        .merge(protected)
        .fallback(handlers::not_found)
}

/// The complete application: static files plus the dynamic routes, each
/// behind its own middleware stack.
pub fn app<Store>(
    state: AppState,
    store: Store,
    settings: &SessionSettings,
    static_dir: impl AsRef<Path>,
) -> Router
where
    Store: SessionStore + Clone,
{
    let dynamic = chain::dynamic(dynamic_routes(), state, store, settings);
    chain::outer(dynamic.nest_service("/static", ServeDir::new(static_dir)))
}
