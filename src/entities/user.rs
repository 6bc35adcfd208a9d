//! User entity - Represents an account that can own and share baskets.
//!
//! The password hash is never serialized, so a `Model` can be returned to
//! clients directly. Peer connections live in [`super::user_connection`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across the directory
    #[sea_orm(unique)]
    pub username: String,
    /// Contact address, unique across the directory
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string, salted
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Optional avatar URL
    pub profile_image: Option<String>,
    /// Administrative flag, informational only
    pub is_staff: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many baskets
    #[sea_orm(has_many = "super::basket::Entity")]
    OwnedBaskets,
    /// One user created many items
    #[sea_orm(has_many = "super::item::Entity")]
    CreatedItems,
    /// One user appears in many basket share rows
    #[sea_orm(has_many = "super::basket_share::Entity")]
    Shares,
}

impl Related<super::basket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OwnedBaskets.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreatedItems.def()
    }
}

impl Related<super::basket_share::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
