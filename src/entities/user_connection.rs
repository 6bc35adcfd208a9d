//! User connection entity - One row per undirected edge between two users.
//!
//! Rows are stored with `low_user_id < high_user_id`, so a connection between
//! A and B exists exactly once regardless of who initiated it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Connection edge database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_connections")]
pub struct Model {
    /// Smaller of the two user ids
    #[sea_orm(primary_key, auto_increment = false)]
    pub low_user_id: i64,
    /// Larger of the two user ids
    #[sea_orm(primary_key, auto_increment = false)]
    pub high_user_id: i64,
    /// When the edge was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Returns the endpoint that is not `user_id`.
    #[must_use]
    pub const fn peer_of(&self, user_id: i64) -> i64 {
        if self.low_user_id == user_id {
            self.high_user_id
        } else {
            self.low_user_id
        }
    }
}

/// Defines relationships between the edge and its endpoints
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Lower endpoint
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::LowUserId",
        to = "super::user::Column::Id"
    )]
    LowUser,
    /// Higher endpoint
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::HighUserId",
        to = "super::user::Column::Id"
    )]
    HighUser,
}

impl ActiveModelBehavior for ActiveModel {}
