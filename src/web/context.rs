use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::User;
use crate::web::middleware::csrf::CsrfToken;

/// The logged-in user, attached to the request by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Arc<User>);

/// Everything a handler needs to know about who is asking.
///
/// Built from request extensions only, so it reflects exactly what the
/// middleware chain attached to this request. `user` is `None` for anonymous
/// requests, including ones whose session names a user that no longer exists.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: Option<Arc<User>>,
    pub csrf_token: String,
    pub session: Session,
}

impl RequestContext {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AppError::MissingExtension("Session"))?;
        let csrf_token = parts
            .extensions
            .get::<CsrfToken>()
            .map(|token| token.0.clone())
            .ok_or(AppError::MissingExtension("CsrfToken"))?;
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|user| Arc::clone(&user.0));

        Ok(Self {
            user,
            csrf_token,
            session,
        })
    }
}
