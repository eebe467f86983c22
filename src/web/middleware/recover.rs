//! Panic recovery.
//!
//! Used through `tower_http::catch_panic::CatchPanicLayer::custom`, so a
//! panic anywhere below it becomes a 500 and the process keeps serving.

use std::any::Any;
use std::backtrace::Backtrace;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::error;

use super::security_headers;

/// Builds the response for a recovered panic.
///
/// The connection is closed afterwards since the failed handler may have
/// left it mid-request. Security headers are added here because the panic
/// unwinds past the layer that normally sets them.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    let backtrace = Backtrace::force_capture();
    error!(panic = %message, %backtrace, "recovered from panic");

    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    security_headers::apply(headers);
    response
}
