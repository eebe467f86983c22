#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use axum::Router;
use chrono::Utc;
use tower::ServiceExt;
use tower_sessions::cookie::Key;

use courtside::config::SessionSettings;
use courtside::models::{ModelError, TennisSession, TennisSessionRepository, User, UserRepository};

pub fn settings() -> SessionSettings {
    SessionSettings {
        key: Key::from(&[7u8; 64][..]),
        lifetime: time::Duration::hours(12),
        secure: true,
    }
}

pub fn ui_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("ui")
}

/// Remembers cookies set by responses and sends them back, like a browser.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn store<B>(&mut self, response: &Response<B>) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            let pair = value.split(';').next().unwrap();
            let (name, cookie_value) = pair.split_once('=').unwrap();
            let expired = value.contains("Max-Age=0") || cookie_value.is_empty();
            if expired {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_owned(), cookie_value.to_owned());
            }
        }
    }

    pub fn header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Drives a router one request at a time, keeping cookies between requests.
pub struct Browser {
    pub app: Router,
    pub jar: CookieJar,
}

pub struct Page {
    pub response: Response<Body>,
    pub body: String,
}

impl Page {
    pub fn status(&self) -> axum::http::StatusCode {
        self.response.status()
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.response
            .headers()
            .get(name)
            .map(|value| value.to_str().unwrap())
    }

    /// The masked CSRF token embedded in the page's first form.
    pub fn csrf_token(&self) -> String {
        let marker = r#"name="csrf_token" value=""#;
        let start = self.body.find(marker).expect("page has a csrf field") + marker.len();
        let end = start + self.body[start..].find('"').unwrap();
        self.body[start..end].to_owned()
    }
}

impl Browser {
    pub fn new(app: Router) -> Self {
        Self {
            app,
            jar: CookieJar::default(),
        }
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> Page {
        let cookies = self.jar.header();
        if !cookies.is_empty() {
            request
                .headers_mut()
                .insert(header::COOKIE, cookies.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();
        self.jar.store(&response);

        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        Page {
            response: Response::from_parts(parts, Body::empty()),
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> Page {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> Page {
        let body = serde_urlencoded::to_string(fields).unwrap();
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

/// In-memory users, for exercising the middleware without a database.
#[derive(Debug, Default)]
pub struct FakeUsers {
    users: Mutex<HashMap<i32, User>>,
}

impl FakeUsers {
    pub fn with_user(id: i32, name: &str) -> Self {
        let users = Self::default();
        users.users.lock().unwrap().insert(
            id,
            User {
                id,
                name: name.to_owned(),
                email: format!("{}@example.com", name.to_lowercase()),
                hashed_password: String::new(),
                created: Utc::now(),
            },
        );
        users
    }
}

#[async_trait]
impl UserRepository for FakeUsers {
    async fn insert(&self, _name: &str, _email: &str, _password: &str) -> Result<(), ModelError> {
        unimplemented!("not needed by these tests")
    }

    async fn authenticate(&self, _email: &str, _password: &str) -> Result<i32, ModelError> {
        Err(ModelError::InvalidCredentials)
    }

    async fn get(&self, id: i32) -> Result<User, ModelError> {
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ModelError::NoRecord)
    }

    async fn delete(&self, id: i32) -> Result<(), ModelError> {
        self.users
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(ModelError::NoRecord)
    }
}

#[derive(Debug, Default)]
pub struct NoTennisSessions;

#[async_trait]
impl TennisSessionRepository for NoTennisSessions {
    async fn insert(&self, _: &str, _: &str, _: i64) -> Result<i32, ModelError> {
        unimplemented!("not needed by these tests")
    }

    async fn get(&self, _id: i32) -> Result<TennisSession, ModelError> {
        Err(ModelError::NoRecord)
    }

    async fn latest(&self) -> Result<Vec<TennisSession>, ModelError> {
        Ok(Vec::new())
    }
}
