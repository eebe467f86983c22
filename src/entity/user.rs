//! User entity model.

use sea_orm::entity::prelude::*;

/// A registered user.
///
/// `email` carries a unique constraint; inserting a second row with the same
/// address fails with a unique-constraint violation, which
/// [`crate::models::UserModel`] reports as a duplicate email.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// PHC-formatted Argon2id hash.
    pub hashed_password: String,
    pub created: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
