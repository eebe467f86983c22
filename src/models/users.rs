use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use tracing::{debug, instrument};

use super::{ModelError, User, UserRepository};
use crate::entity::user;

/// Sea-ORM backed [`UserRepository`].
#[derive(Debug, Clone)]
pub struct UserModel {
    conn: DatabaseConnection,
}

impl UserModel {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl UserRepository for UserModel {
    #[instrument(skip(self, password))]
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), ModelError> {
        let password = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ModelError::PasswordHash(e.to_string()))??;

        let model = user::ActiveModel {
            name: Set(name.to_owned()),
            email: Set(email.to_owned()),
            hashed_password: Set(hashed_password),
            created: Set(Utc::now()),
            ..Default::default()
        };

        match model.insert(&self.conn).await {
            Ok(inserted) => {
                debug!(id = inserted.id, "inserted user");
                Ok(())
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ModelError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, password))]
    async fn authenticate(&self, email: &str, password: &str) -> Result<i32, ModelError> {
        let Some(found) = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.conn)
            .await?
        else {
            return Err(ModelError::InvalidCredentials);
        };

        let password = password.to_owned();
        let hash = found.hashed_password.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ModelError::PasswordHash(e.to_string()))??;

        if matches {
            Ok(found.id)
        } else {
            Err(ModelError::InvalidCredentials)
        }
    }

    async fn get(&self, id: i32) -> Result<User, ModelError> {
        user::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(User::from)
            .ok_or(ModelError::NoRecord)
    }

    async fn delete(&self, id: i32) -> Result<(), ModelError> {
        let result = user::Entity::delete_by_id(id).exec(&self.conn).await?;
        if result.rows_affected == 0 {
            return Err(ModelError::NoRecord);
        }
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String, ModelError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ModelError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, ModelError> {
    let parsed = PasswordHash::new(hash).map_err(|e| ModelError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ModelError::PasswordHash(e.to_string())),
    }
}
