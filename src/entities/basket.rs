//! Basket entity - A shopping list with one owner and a set of shared users.
//!
//! Sharing is stored in [`super::basket_share`]; items in [`super::item`].
//! Both are removed explicitly when a basket is deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a basket, persisted as a lowercase string
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BasketStatus {
    /// Planned but not started
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Currently being shopped
    #[sea_orm(string_value = "open")]
    Open,
    /// Done
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// Basket database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "baskets")]
pub struct Model {
    /// Unique identifier for the basket
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Groceries")
    pub name: String,
    /// Optional store label (e.g., "Corner Market")
    pub store: Option<String>,
    /// Current lifecycle status
    pub status: BasketStatus,
    /// The user who created the basket; sole holder of delete rights
    pub owner_id: i64,
    /// When the basket was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Basket and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each basket belongs to one owner
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
    /// One basket has many items
    #[sea_orm(has_many = "super::item::Entity")]
    Items,
    /// One basket has many share rows
    #[sea_orm(has_many = "super::basket_share::Entity")]
    Shares,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::basket_share::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
