use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::debug;

use super::{ModelError, TennisSession, TennisSessionRepository};
use crate::entity::tennis_session;

const LATEST_LIMIT: u64 = 10;

/// Sea-ORM backed [`TennisSessionRepository`].
#[derive(Debug, Clone)]
pub struct TennisSessionModel {
    conn: DatabaseConnection,
}

impl TennisSessionModel {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl TennisSessionRepository for TennisSessionModel {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_in_days: i64,
    ) -> Result<i32, ModelError> {
        let created = Utc::now();
        let lifetime =
            Duration::try_days(expires_in_days).ok_or(ModelError::InvalidExpiry(expires_in_days))?;
        let expires = created
            .checked_add_signed(lifetime)
            .ok_or(ModelError::InvalidExpiry(expires_in_days))?;

        let model = tennis_session::ActiveModel {
            title: Set(title.to_owned()),
            content: Set(content.to_owned()),
            created: Set(created),
            expires: Set(expires),
            ..Default::default()
        };
        let inserted = model.insert(&self.conn).await?;

        debug!(id = inserted.id, "inserted tennis session");
        Ok(inserted.id)
    }

    async fn get(&self, id: i32) -> Result<TennisSession, ModelError> {
        tennis_session::Entity::find_by_id(id)
            .filter(tennis_session::Column::Expires.gt(Utc::now()))
            .one(&self.conn)
            .await?
            .map(TennisSession::from)
            .ok_or(ModelError::NoRecord)
    }

    async fn latest(&self) -> Result<Vec<TennisSession>, ModelError> {
        let rows = tennis_session::Entity::find()
            .filter(tennis_session::Column::Expires.gt(Utc::now()))
            .order_by_desc(tennis_session::Column::Created)
            .limit(LATEST_LIMIT)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(TennisSession::from).collect())
    }
}
