//! Request-level errors and the centralized responses for them.

use std::backtrace::Backtrace;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::models::ModelError;
use crate::templates::TemplateError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("request is missing the {0} extension; is its layer installed?")]
    MissingExtension(&'static str),

    /// A problem with the request itself; answered with the status as-is.
    #[error("client error: {0}")]
    Client(StatusCode),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Client(status) => client_error(status),
            other => server_error(&other),
        }
    }
}

/// Logs `err` with a backtrace and answers with a generic 500.
pub fn server_error(err: &dyn std::error::Error) -> Response {
    let backtrace = Backtrace::force_capture();
    error!(error = %err, %backtrace, "server error");
    client_error(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A bare response carrying the status and its reason phrase.
pub fn client_error(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, reason.to_owned()).into_response()
}

pub fn not_found() -> Response {
    client_error(StatusCode::NOT_FOUND)
}
