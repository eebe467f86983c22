//! Per-request session helpers.
//!
//! Sessions themselves are managed by `tower_sessions`; values are written
//! with [`Session::insert`], read with [`Session::get`] and deleted with
//! [`Session::remove`]. This module adds the two operations handlers need on
//! top of that.

use async_trait::async_trait;
use tower_sessions::session::Error;
use tower_sessions::Session;

/// Session key holding the logged-in user's id.
pub const AUTHENTICATED_USER_ID: &str = "authenticated_user_id";

/// Session key holding a one-shot message for the next rendered page.
pub const FLASH: &str = "flash";

#[async_trait]
pub trait SessionExt {
    /// Whether `key` is present, without decoding its value.
    async fn exists(&self, key: &str) -> Result<bool, Error>;

    /// Removes `key` and returns its string value.
    ///
    /// The removal happens under the session's own lock, so two concurrent
    /// calls never both observe the value.
    async fn pop_string(&self, key: &str) -> Result<Option<String>, Error>;
}

#[async_trait]
impl SessionExt for Session {
    async fn exists(&self, key: &str) -> Result<bool, Error> {
        Ok(self.get_value(key).await?.is_some())
    }

    async fn pop_string(&self, key: &str) -> Result<Option<String>, Error> {
        self.remove::<String>(key).await
    }
}
