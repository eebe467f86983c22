//! HTTP session entity model.
//!
//! Maps to the `http_sessions` table. Each row holds one `tower_sessions`
//! record keyed by the session id that the signed cookie carries.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing a persisted HTTP session.
///
/// # Database Schema
///
/// | Column      | Type                    | Description                           |
/// |-------------|-------------------------|---------------------------------------|
/// | id          | TEXT (Primary Key)      | Session ID                            |
/// | data        | BLOB / BYTEA            | MessagePack-serialized session record |
/// | expiry_date | TIMESTAMP WITH TIMEZONE | Session expiration timestamp          |
///
/// This entity is used internally by [`crate::store::SeaOrmStore`]; handlers
/// only ever see the `tower_sessions::Session` built on top of it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "http_sessions")]
pub struct Model {
    /// The session identifier in its string form.
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    /// The MessagePack representation of the whole `tower_sessions` record.
    pub data: Vec<u8>,

    /// Rows at or past this instant are treated as absent and swept by
    /// `delete_expired`.
    pub expiry_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
