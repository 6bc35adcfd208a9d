//! Item entity - A line entry within exactly one basket.
//!
//! The creator is recorded for display only; access to an item is decided by
//! its parent basket.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of an item, persisted as a lowercase string
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Still to buy
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    /// Already in the cart
    #[sea_orm(string_value = "bought")]
    Bought,
    /// Skipped this time
    #[sea_orm(string_value = "ignored")]
    Ignored,
}

/// Item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the item (e.g., "Milk")
    pub name: String,
    /// Free-form notes, may be empty
    pub description: String,
    /// Current lifecycle status
    pub status: ItemStatus,
    /// ID of the basket this item belongs to
    pub basket_id: i64,
    /// ID of the user who added the item
    pub creator_id: i64,
    /// When the item was added
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Item and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one basket
    #[sea_orm(
        belongs_to = "super::basket::Entity",
        from = "Column::BasketId",
        to = "super::basket::Column::Id"
    )]
    Basket,
    /// Each item was created by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatorId",
        to = "super::user::Column::Id"
    )]
    Creator,
}

impl Related<super::basket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Basket.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
