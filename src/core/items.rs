//! Item store - Line entries of a basket.
//!
//! Items carry no permissions of their own; callers authorize against the parent
//! basket before using anything in here.

use crate::{
    core::authz::UserId,
    entities::{Item, ItemStatus, item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

const MAX_NAME_LEN: usize = 255;

/// Fully-specified item creation command, built by the handler.
#[derive(Clone, Debug)]
pub struct CreateItem {
    /// Parent basket, taken from the route
    pub basket_id: i64,
    /// Acting user
    pub creator_id: UserId,
    /// Display name
    pub name: String,
    /// Free-form notes
    pub description: String,
    /// Initial status
    pub status: ItemStatus,
}

/// Partial item update; absent fields are left unchanged
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ItemChanges {
    /// New display name
    pub name: Option<String>,
    /// New notes
    pub description: Option<String>,
    /// New status
    pub status: Option<ItemStatus>,
}

fn validate_name(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("name", "Item name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Checks and normalizes a creation command.
pub fn validate_item(command: CreateItem) -> Result<CreateItem> {
    Ok(CreateItem {
        name: validate_name(&command.name)?,
        description: command.description.trim().to_string(),
        ..command
    })
}

/// Validates `command` and stores the item.
#[instrument(skip(db, command), fields(basket_id = command.basket_id, creator_id = command.creator_id))]
pub async fn create_item<C>(db: &C, command: CreateItem) -> Result<item::Model>
where
    C: ConnectionTrait,
{
    let command = validate_item(command)?;
    let created = item::ActiveModel {
        name: Set(command.name),
        description: Set(command.description),
        status: Set(command.status),
        basket_id: Set(command.basket_id),
        creator_id: Set(command.creator_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(item_id = created.id, "Item created");
    Ok(created)
}

/// Finds an item by its unique ID.
pub async fn find_item<C>(db: &C, item_id: i64) -> Result<Option<item::Model>>
where
    C: ConnectionTrait,
{
    Item::find_by_id(item_id).one(db).await.map_err(Into::into)
}

/// Finds an item by its unique ID, failing with `NotFound`.
pub async fn require_item<C>(db: &C, item_id: i64) -> Result<item::Model>
where
    C: ConnectionTrait,
{
    find_item(db, item_id)
        .await?
        .ok_or_else(|| Error::not_found("item", item_id))
}

/// Items of a basket in the order they were added.
pub async fn list_items_for_basket<C>(db: &C, basket_id: i64) -> Result<Vec<item::Model>>
where
    C: ConnectionTrait,
{
    Item::find()
        .filter(item::Column::BasketId.eq(basket_id))
        .order_by_asc(item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to `item`. The parent basket and creator never change.
pub async fn update_item<C>(db: &C, item: item::Model, changes: ItemChanges) -> Result<item::Model>
where
    C: ConnectionTrait,
{
    let name = changes.name.as_deref().map(validate_name).transpose()?;

    let mut active: item::ActiveModel = item.clone().into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(description) = changes.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(status) = changes.status {
        active.status = Set(status);
    }
    if !active.is_changed() {
        return Ok(item);
    }
    active.update(db).await.map_err(Into::into)
}

/// Deletes one item, failing with `NotFound` if it is already gone.
pub async fn delete_item<C>(db: &C, item_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Item::delete_by_id(item_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("item", item_id));
    }
    info!(item_id, "Item deleted");
    Ok(())
}
