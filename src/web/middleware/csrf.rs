//! Cross-site request forgery protection.
//!
//! A random 32-byte token lives in the `csrf_token` cookie. Every request is
//! handed a freshly masked copy of it (`CsrfToken`) for embedding in forms;
//! the mask changes per request while the underlying token does not.
//!
//! Requests with an unsafe method must echo a masked token back, either in
//! the `X-CSRF-Token` header or in the `csrf_token` field of a URL-encoded
//! body. Anything else is answered with `400 Bad Request` and never reaches
//! the wrapped service.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::Response,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use subtle::ConstantTimeEq;
use tower::{Layer, Service};
use tower_sessions::cookie::{Cookie, SameSite};
use tracing::warn;

use crate::error::client_error;

pub const COOKIE_NAME: &str = "csrf_token";
pub const FORM_FIELD: &str = "csrf_token";
pub const HEADER_NAME: &str = "x-csrf-token";

const TOKEN_LEN: usize = 32;
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

type Token = [u8; TOKEN_LEN];

/// The masked token for the current request, ready to embed in a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

#[derive(Clone, Debug)]
pub struct CsrfLayer {
    secure: bool,
}

impl CsrfLayer {
    /// `secure` sets the `Secure` attribute on the token cookie.
    #[must_use]
    pub const fn new(secure: bool) -> Self {
        Self { secure }
    }
}

impl<S> Layer<S> for CsrfLayer {
    type Service = Csrf<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Csrf {
            inner,
            secure: self.secure,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Csrf<S> {
    inner: S,
    secure: bool,
}

impl<S> Service<Request> for Csrf<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let (token, issued) = match cookie_token(req.headers()) {
            Some(token) => (token, false),
            None => (random_token(), true),
        };
        req.extensions_mut().insert(CsrfToken(mask(&token)));

        let set_cookie = if issued {
            token_cookie(&token, self.secure)
        } else {
            None
        };
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let req = if is_safe(req.method()) {
                req
            } else {
                match verify(req, &token).await {
                    Ok(req) => req,
                    Err(reason) => {
                        warn!(reason, "rejected request failing the csrf check");
                        let mut response = client_error(StatusCode::BAD_REQUEST);
                        append_cookie(&mut response, set_cookie);
                        return Ok(response);
                    }
                }
            };

            let mut response = inner.call(req).await?;
            append_cookie(&mut response, set_cookie);
            Ok(response)
        })
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn random_token() -> Token {
    let mut token = [0u8; TOKEN_LEN];
    rand::rng().fill_bytes(&mut token);
    token
}

/// The base token from the request's cookie, if it is present and well formed.
fn cookie_token(headers: &HeaderMap) -> Option<Token> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == COOKIE_NAME)
        .and_then(|cookie| decode_token(cookie.value()))
}

fn decode_token(encoded: &str) -> Option<Token> {
    URL_SAFE_NO_PAD.decode(encoded).ok()?.try_into().ok()
}

fn token_cookie(token: &Token, secure: bool) -> Option<HeaderValue> {
    let cookie = Cookie::build((COOKIE_NAME, URL_SAFE_NO_PAD.encode(token)))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::days(365))
        .build();
    HeaderValue::from_str(&cookie.to_string()).ok()
}

fn append_cookie(response: &mut Response, cookie: Option<HeaderValue>) {
    if let Some(value) = cookie {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// `pad ‖ pad ⊕ token`, base64 encoded, with a fresh random pad.
fn mask(token: &Token) -> String {
    let mut pad = [0u8; TOKEN_LEN];
    rand::rng().fill_bytes(&mut pad);

    let mut masked = Vec::with_capacity(TOKEN_LEN * 2);
    masked.extend_from_slice(&pad);
    masked.extend(pad.iter().zip(token).map(|(p, t)| p ^ t));
    URL_SAFE_NO_PAD.encode(masked)
}

fn unmask(submitted: &str) -> Option<Token> {
    let bytes = URL_SAFE_NO_PAD.decode(submitted.trim()).ok()?;
    if bytes.len() != TOKEN_LEN * 2 {
        return None;
    }
    let (pad, masked) = bytes.split_at(TOKEN_LEN);
    let mut token = [0u8; TOKEN_LEN];
    for (out, (p, m)) in token.iter_mut().zip(pad.iter().zip(masked)) {
        *out = p ^ m;
    }
    Some(token)
}

fn matches(expected: &Token, submitted: &str) -> bool {
    unmask(submitted).is_some_and(|token| bool::from(token.ct_eq(expected)))
}

/// Checks the submitted token, returning the request with its body intact.
async fn verify(req: Request, expected: &Token) -> Result<Request, &'static str> {
    if let Some(value) = req.headers().get(HEADER_NAME) {
        let submitted = value.to_str().map_err(|_| "malformed token header")?;
        return if matches(expected, submitted) {
            Ok(req)
        } else {
            Err("token header does not match")
        };
    }

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| "request body unreadable or too large")?;

    let submitted = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
        .ok()
        .and_then(|pairs| {
            pairs
                .into_iter()
                .find(|(key, _)| key == FORM_FIELD)
                .map(|(_, value)| value)
        })
        .ok_or("no token submitted")?;

    if !matches(expected, &submitted) {
        return Err("submitted token does not match");
    }
    Ok(Request::from_parts(parts, Body::from(bytes)))
}
