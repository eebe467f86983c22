use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use time::OffsetDateTime;
use tower_sessions::{session::Id, session::Record, session_store, ExpiredDeletion, SessionStore};
use tracing::debug;

use crate::entity::session::{self, ActiveModel as SessionActiveModel, Entity as SessionEntity};

/// A database-backed session store for tower-sessions using Sea-ORM.
///
/// `SeaOrmStore` keeps each session's record in the `http_sessions` table and
/// leaves only the random session id in the (signed) cookie. Any backend
/// Sea-ORM can reach works; the crate enables SQLite by default and
/// PostgreSQL behind the `postgres` feature.
///
/// Session data is serialized using MessagePack for compact storage.
///
/// # Usage
///
/// ```no_run
/// use courtside::store::SeaOrmStore;
/// use sea_orm::Database;
/// use time::Duration;
/// use tower_sessions::{Expiry, SessionManagerLayer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let conn = Database::connect("sqlite://courtside.db?mode=rwc").await?;
/// let store = SeaOrmStore::new(conn);
///
/// let session_layer = SessionManagerLayer::new(store)
///     .with_expiry(Expiry::OnInactivity(Duration::hours(12)));
/// # Ok(())
/// # }
/// ```
///
/// # Error Handling
///
/// Errors from the underlying operations map to `tower_sessions::session_store::Error`:
///
/// - Database errors → `session_store::Error::Backend`
/// - Serialization errors → `session_store::Error::Encode`
/// - Deserialization errors → `session_store::Error::Decode`
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    conn: DatabaseConnection,
}

impl SeaOrmStore {
    /// Creates a new session store over the given connection.
    ///
    /// The `http_sessions` table must already exist; see
    /// [`crate::migration::Migrator`].
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for SeaOrmStore {
    /// Inserts a new session record.
    ///
    /// Runs in a transaction and regenerates the record id until it does not
    /// collide with an existing row.
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let txn = self.conn.begin().await.map_err(backend)?;

        while SessionEntity::find_by_id(record.id.to_string())
            .one(&txn)
            .await
            .map_err(backend)?
            .is_some()
        {
            record.id = Id::default();
        }

        let session_model = SessionActiveModel {
            id: Set(record.id.to_string()),
            data: Set(encode(record)?),
            expiry_date: Set(to_chrono(record.expiry_date)?),
        };

        session_model.insert(&txn).await.map_err(backend)?;
        txn.commit().await.map_err(backend)?;

        debug!("created session record");
        Ok(())
    }

    /// Saves a session record, inserting it if the row does not exist yet.
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let data = encode(record)?;
        let expiry_date = to_chrono(record.expiry_date)?;

        match SessionEntity::find_by_id(record.id.to_string())
            .one(&self.conn)
            .await
            .map_err(backend)?
        {
            Some(existing) => {
                let mut active_model = existing.into_active_model();
                active_model.data = Set(data);
                active_model.expiry_date = Set(expiry_date);
                active_model.update(&self.conn).await.map_err(backend)?;
            }
            None => {
                let session_model = SessionActiveModel {
                    id: Set(record.id.to_string()),
                    data: Set(data),
                    expiry_date: Set(expiry_date),
                };
                session_model.insert(&self.conn).await.map_err(backend)?;
            }
        }

        Ok(())
    }

    /// Loads a session record by id.
    ///
    /// Expired rows are filtered out in the query, so an expired session is
    /// indistinguishable from one that never existed.
    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = to_chrono(OffsetDateTime::now_utc())?;

        let session = SessionEntity::find_by_id(session_id.to_string())
            .filter(session::Column::ExpiryDate.gt(now))
            .one(&self.conn)
            .await
            .map_err(backend)?;

        match session {
            Some(model) => {
                let record = rmp_serde::from_slice(&model.data)
                    .map_err(|e| session_store::Error::Decode(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        SessionEntity::delete_by_id(session_id.to_string())
            .exec(&self.conn)
            .await
            .map_err(backend)?;

        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SeaOrmStore {
    /// Deletes every session whose expiry date has passed.
    ///
    /// The binary calls this periodically from a background task.
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now = to_chrono(OffsetDateTime::now_utc())?;

        let result = SessionEntity::delete_many()
            .filter(session::Column::ExpiryDate.lte(now))
            .exec(&self.conn)
            .await
            .map_err(backend)?;

        debug!(deleted = result.rows_affected, "swept expired sessions");
        Ok(())
    }
}

fn backend(e: sea_orm::DbErr) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

fn encode(record: &Record) -> session_store::Result<Vec<u8>> {
    rmp_serde::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))
}

// tower-sessions speaks `time`, the entities speak `chrono`
fn to_chrono(time: OffsetDateTime) -> session_store::Result<DateTime<Utc>> {
    DateTime::from_timestamp(time.unix_timestamp(), time.nanosecond()).ok_or_else(|| {
        session_store::Error::Encode(format!("timestamp out of range: {time}"))
    })
}
