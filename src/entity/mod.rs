//! Database entity models.
//!
//! These are the Sea-ORM entity definitions backing the HTTP session store
//! and the application's domain tables. The schema for all of them is created
//! by [`crate::migration::Migrator`].

/// HTTP session records persisted by [`crate::store::SeaOrmStore`].
pub mod session;

/// Tennis sessions that users book and browse.
pub mod tennis_session;

/// Registered users.
pub mod user;
