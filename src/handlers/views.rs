use crate::{
    core::{baskets, items, users},
    entities::{basket, item, user},
    errors::Result,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;

/// A basket with its shared users and items expanded.
#[derive(Clone, Debug, Serialize)]
pub struct BasketView {
    /// The basket row
    #[serde(flatten)]
    pub basket: basket::Model,
    /// Users the basket is shared with
    pub shared_with: Vec<user::Model>,
    /// Items in the basket
    pub items: Vec<item::Model>,
}

impl BasketView {
    /// Loads the shared users and items of `basket`.
    pub async fn load<C>(db: &C, basket: basket::Model) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        let shared_with = baskets::shared_users(db, basket.id).await?;
        let items = items::list_items_for_basket(db, basket.id).await?;
        Ok(Self {
            basket,
            shared_with,
            items,
        })
    }
}

/// An item with its parent basket and creator expanded.
#[derive(Clone, Debug, Serialize)]
pub struct ItemView {
    /// The item row
    #[serde(flatten)]
    pub item: item::Model,
    /// Parent basket
    pub basket: basket::Model,
    /// User who added the item
    pub creator: user::Model,
}

/// A user with their connections expanded.
#[derive(Clone, Debug, Serialize)]
pub struct UserView {
    /// The user row; the password hash is never serialized
    #[serde(flatten)]
    pub user: user::Model,
    /// Connected users
    pub connections: Vec<user::Model>,
}

impl UserView {
    /// Loads the connections of `user`.
    pub async fn load<C>(db: &C, user: user::Model) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        let connections = users::list_connections(db, user.id).await?;
        Ok(Self { user, connections })
    }
}
