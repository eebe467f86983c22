//! Resolves the session's user id into an [`AuthenticatedUser`].

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::debug;

use crate::error::AppError;
use crate::models::{ModelError, User};
use crate::web::context::AuthenticatedUser;
use crate::web::session::{SessionExt, AUTHENTICATED_USER_ID};
use crate::web::state::AppState;

/// Attaches the logged-in user to the request, if there is one.
///
/// A session pointing at a user that no longer exists is cleaned up and the
/// request carries on as anonymous. Any other storage failure is a 500.
pub async fn authenticate(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_user(&state, &session).await {
        Ok(Some(user)) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser(Arc::new(user)));
        }
        Ok(None) => {}
        Err(err) => return err.into_response(),
    }
    next.run(request).await
}

async fn resolve_user(state: &AppState, session: &Session) -> Result<Option<User>, AppError> {
    if !session.exists(AUTHENTICATED_USER_ID).await? {
        return Ok(None);
    }
    let Some(id) = session.get::<i32>(AUTHENTICATED_USER_ID).await? else {
        return Ok(None);
    };

    match state.users.get(id).await {
        Ok(user) => Ok(Some(user)),
        Err(ModelError::NoRecord) => {
            debug!(user_id = id, "session refers to a missing user, dropping it");
            session.remove_value(AUTHENTICATED_USER_ID).await?;
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Sends anonymous requests to the login page.
///
/// Pages behind this gate are marked `Cache-Control: no-store` so they are
/// not kept by shared caches.
pub async fn require_authenticated_user(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        return (StatusCode::FOUND, [(header::LOCATION, "/user/login")]).into_response();
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
