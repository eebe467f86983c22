//! Storage collaborators.
//!
//! Handlers and middleware only talk to storage through the
//! [`UserRepository`] and [`TennisSessionRepository`] traits, which keeps the
//! web layer testable with in-memory fakes. [`UserModel`] and
//! [`TennisSessionModel`] are the Sea-ORM implementations used by the binary.

mod tennis_sessions;
mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::entity;

pub use tennis_sessions::TennisSessionModel;
pub use users::UserModel;

/// Errors reported by the storage layer.
///
/// `NoRecord`, `InvalidCredentials` and `DuplicateEmail` are domain
/// conditions that handlers resolve themselves; everything else is a server
/// error.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no matching record found")]
    NoRecord,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("invalid expiry of {0} days")]
    InvalidExpiry(i64),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// An authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub hashed_password: String,
    pub created: DateTime<Utc>,
}

impl From<entity::user::Model> for User {
    fn from(model: entity::user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            hashed_password: model.hashed_password,
            created: model.created,
        }
    }
}

/// A bookable tennis session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TennisSession {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl From<entity::tennis_session::Model> for TennisSession {
    fn from(model: entity::tennis_session::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            content: model.content,
            created: model.created,
            expires: model.expires,
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user, hashing `password` first.
    ///
    /// Returns [`ModelError::DuplicateEmail`] when the address is taken.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), ModelError>;

    /// Checks an email/password pair and returns the user's id.
    ///
    /// Unknown addresses and wrong passwords both report
    /// [`ModelError::InvalidCredentials`].
    async fn authenticate(&self, email: &str, password: &str) -> Result<i32, ModelError>;

    async fn get(&self, id: i32) -> Result<User, ModelError>;

    async fn delete(&self, id: i32) -> Result<(), ModelError>;
}

#[async_trait]
pub trait TennisSessionRepository: Send + Sync {
    /// Stores a session expiring `expires_in_days` from now and returns its id.
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_in_days: i64,
    ) -> Result<i32, ModelError>;

    /// Fetches an unexpired session.
    async fn get(&self, id: i32) -> Result<TennisSession, ModelError>;

    /// The ten most recently created unexpired sessions, newest first.
    async fn latest(&self) -> Result<Vec<TennisSession>, ModelError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;

    use crate::migration::Migrator;

    pub async fn connection() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1);
        let conn = Database::connect(opt).await.unwrap();
        Migrator::up(&conn, None).await.unwrap();
        conn
    }
}
