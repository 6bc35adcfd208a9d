use crate::{
    core::{
        authz::{self, Actor, BasketAccess, Resource, Verb},
        baskets,
        items::{self, CreateItem, ItemChanges},
        users,
    },
    entities::{ItemStatus, basket, item},
    errors::Result,
    handlers::{require_actor, views::ItemView},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use tracing::instrument;

/// Item creation body. The basket comes from the route and the creator is the
/// acting user.
#[derive(Clone, Debug, Deserialize)]
pub struct ItemPayload {
    /// Display name
    pub name: String,
    /// Free-form notes
    #[serde(default)]
    pub description: String,
    /// Initial status, `active` when omitted
    #[serde(default)]
    pub status: ItemStatus,
}

/// Resolves the parent basket of an item collection.
async fn resolve_parent<C>(db: &C, actor: &Actor, basket_id: i64) -> Result<BasketAccess>
where
    C: ConnectionTrait,
{
    require_actor(db, actor).await?;
    let basket = baskets::require_basket(db, basket_id).await?;
    baskets::load_access(db, &basket).await
}

/// Resolves an item and its parent, then checks `verb` against the parent's access facts.
async fn resolve_item<C>(
    db: &C,
    actor: &Actor,
    item_id: i64,
    verb: Verb,
) -> Result<(item::Model, basket::Model)>
where
    C: ConnectionTrait,
{
    require_actor(db, actor).await?;
    let item = items::require_item(db, item_id).await?;
    let basket = baskets::require_basket(db, item.basket_id).await?;
    let access = baskets::load_access(db, &basket).await?;
    authz::ensure(actor, verb, &Resource::Item(&access))?;
    Ok((item, basket))
}

/// Items of one basket.
#[instrument(skip(db))]
pub async fn list_items(
    db: &DatabaseConnection,
    actor: &Actor,
    basket_id: i64,
) -> Result<Vec<item::Model>> {
    let txn = db.begin().await?;
    let access = resolve_parent(&txn, actor, basket_id).await?;
    authz::ensure(actor, Verb::List, &Resource::ItemCollection(&access))?;
    let found = items::list_items_for_basket(&txn, basket_id).await?;
    txn.commit().await?;
    Ok(found)
}

/// Adds an item to a basket the actor can access.
#[instrument(skip(db, payload))]
pub async fn create_item(
    db: &DatabaseConnection,
    actor: &Actor,
    basket_id: i64,
    payload: ItemPayload,
) -> Result<item::Model> {
    let txn = db.begin().await?;
    let access = resolve_parent(&txn, actor, basket_id).await?;
    let creator_id = authz::ensure(actor, Verb::Create, &Resource::ItemCollection(&access))?;
    let command = CreateItem {
        basket_id: access.basket_id,
        creator_id,
        name: payload.name,
        description: payload.description,
        status: payload.status,
    };
    let created = items::create_item(&txn, command).await?;
    txn.commit().await?;
    Ok(created)
}

/// Fetches one item with its basket and creator.
#[instrument(skip(db))]
pub async fn retrieve_item(db: &DatabaseConnection, actor: &Actor, item_id: i64) -> Result<ItemView> {
    let txn = db.begin().await?;
    let (item, basket) = resolve_item(&txn, actor, item_id, Verb::Read).await?;
    let creator = users::require_user(&txn, item.creator_id).await?;
    txn.commit().await?;
    Ok(ItemView {
        item,
        basket,
        creator,
    })
}

/// Applies a partial update to an item.
#[instrument(skip(db, changes))]
pub async fn update_item(
    db: &DatabaseConnection,
    actor: &Actor,
    item_id: i64,
    changes: ItemChanges,
) -> Result<item::Model> {
    let txn = db.begin().await?;
    let (item, _) = resolve_item(&txn, actor, item_id, Verb::Update).await?;
    let updated = items::update_item(&txn, item, changes).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Deletes an item. Anyone who can see the parent basket may do so.
#[instrument(skip(db))]
pub async fn delete_item(db: &DatabaseConnection, actor: &Actor, item_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    resolve_item(&txn, actor, item_id, Verb::Delete).await?;
    items::delete_item(&txn, item_id).await?;
    txn.commit().await?;
    Ok(())
}
