//! Basket store - Creating, reading, changing and deleting baskets and their share sets.
//!
//! All functions are generic over [`ConnectionTrait`]; the request handlers call
//! them with a `DatabaseTransaction` so that the access snapshot used for
//! authorization and the later mutation see the same rows.

use crate::{
    core::{
        authz::{BasketAccess, UserId},
        users,
    },
    entities::{Basket, BasketShare, BasketStatus, Item, User, basket, basket_share, item, user},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, prelude::*, sea_query::Query};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{info, instrument};

const MAX_FIELD_LEN: usize = 255;

/// Fully-specified basket creation command, built by the handler.
#[derive(Clone, Debug)]
pub struct CreateBasket {
    /// Acting user, recorded as owner
    pub owner_id: UserId,
    /// Display name
    pub name: String,
    /// Optional store label
    pub store: Option<String>,
    /// Initial status
    pub status: BasketStatus,
    /// Initial shared-with set
    pub shared_with: Vec<UserId>,
}

/// Partial basket update; absent fields are left unchanged
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BasketChanges {
    /// New display name
    pub name: Option<String>,
    /// New store label; an empty string clears it
    pub store: Option<String>,
    /// New status
    pub status: Option<BasketStatus>,
    /// Replacement for the whole shared-with set
    pub shared_with: Option<Vec<UserId>>,
}

fn validate_name(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("name", "Basket name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_FIELD_LEN {
        return Err(Error::validation(
            "name",
            format!("must be at most {MAX_FIELD_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_store(value: &str) -> Result<Option<String>> {
    let trimmed = value.trim();
    if trimmed.chars().count() > MAX_FIELD_LEN {
        return Err(Error::validation(
            "store",
            format!("must be at most {MAX_FIELD_LEN} characters"),
        ));
    }
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Checks and normalizes a creation command.
pub fn validate_basket(command: CreateBasket) -> Result<CreateBasket> {
    Ok(CreateBasket {
        name: validate_name(&command.name)?,
        store: match command.store.as_deref() {
            Some(store) => validate_store(store)?,
            None => None,
        },
        ..command
    })
}

/// Validates `command` and stores the basket together with its shared-with set.
#[instrument(skip(db, command), fields(owner_id = command.owner_id))]
pub async fn create_basket<C>(db: &C, command: CreateBasket) -> Result<basket::Model>
where
    C: ConnectionTrait,
{
    let command = validate_basket(command)?;
    let shared: BTreeSet<UserId> = command.shared_with.iter().copied().collect();
    users::ensure_users_exist(db, "shared_with", &shared).await?;

    let created = basket::ActiveModel {
        name: Set(command.name),
        store: Set(command.store),
        status: Set(command.status),
        owner_id: Set(command.owner_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    insert_shares(db, created.id, &shared).await?;

    info!(basket_id = created.id, shared = shared.len(), "Basket created");
    Ok(created)
}

/// Finds a basket by its unique ID.
pub async fn find_basket<C>(db: &C, basket_id: i64) -> Result<Option<basket::Model>>
where
    C: ConnectionTrait,
{
    Basket::find_by_id(basket_id).one(db).await.map_err(Into::into)
}

/// Finds a basket by its unique ID, failing with `NotFound`.
pub async fn require_basket<C>(db: &C, basket_id: i64) -> Result<basket::Model>
where
    C: ConnectionTrait,
{
    find_basket(db, basket_id)
        .await?
        .ok_or_else(|| Error::not_found("basket", basket_id))
}

/// Ids of the users a basket is shared with.
pub async fn shared_user_ids<C>(db: &C, basket_id: i64) -> Result<BTreeSet<UserId>>
where
    C: ConnectionTrait,
{
    Ok(BasketShare::find()
        .filter(basket_share::Column::BasketId.eq(basket_id))
        .all(db)
        .await?
        .into_iter()
        .map(|share| share.user_id)
        .collect())
}

/// Users a basket is shared with, ordered by username.
pub async fn shared_users<C>(db: &C, basket_id: i64) -> Result<Vec<user::Model>>
where
    C: ConnectionTrait,
{
    let members = Query::select()
        .column(basket_share::Column::UserId)
        .from(BasketShare)
        .and_where(basket_share::Column::BasketId.eq(basket_id))
        .to_owned();
    User::find()
        .filter(user::Column::Id.in_subquery(members))
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads the ownership facts the authorization engine needs.
pub async fn load_access<C>(db: &C, basket: &basket::Model) -> Result<BasketAccess>
where
    C: ConnectionTrait,
{
    let shared = shared_user_ids(db, basket.id).await?;
    Ok(BasketAccess::new(basket.id, basket.owner_id, shared))
}

/// Every basket in the system, oldest first.
pub async fn list_all_baskets<C>(db: &C) -> Result<Vec<basket::Model>>
where
    C: ConnectionTrait,
{
    Basket::find()
        .order_by_asc(basket::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Baskets owned by or shared with `user_id`, each exactly once, oldest first.
pub async fn list_baskets_for_user<C>(db: &C, user_id: UserId) -> Result<Vec<basket::Model>>
where
    C: ConnectionTrait,
{
    let shared_with_user = Query::select()
        .column(basket_share::Column::BasketId)
        .from(BasketShare)
        .and_where(basket_share::Column::UserId.eq(user_id))
        .to_owned();
    Basket::find()
        .filter(
            Condition::any()
                .add(basket::Column::OwnerId.eq(user_id))
                .add(basket::Column::Id.in_subquery(shared_with_user)),
        )
        .order_by_asc(basket::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn insert_shares<C>(db: &C, basket_id: i64, user_ids: &BTreeSet<UserId>) -> Result<()>
where
    C: ConnectionTrait,
{
    for user_id in user_ids {
        basket_share::ActiveModel {
            basket_id: Set(basket_id),
            user_id: Set(*user_id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Replaces the shared-with set of a basket.
pub async fn replace_shares<C>(db: &C, basket_id: i64, user_ids: &[UserId]) -> Result<()>
where
    C: ConnectionTrait,
{
    let wanted: BTreeSet<UserId> = user_ids.iter().copied().collect();
    users::ensure_users_exist(db, "shared_with", &wanted).await?;
    BasketShare::delete_many()
        .filter(basket_share::Column::BasketId.eq(basket_id))
        .exec(db)
        .await?;
    insert_shares(db, basket_id, &wanted).await
}

/// Applies a partial update to `basket`.
#[instrument(skip(db, basket, changes), fields(basket_id = basket.id))]
pub async fn update_basket<C>(
    db: &C,
    basket: basket::Model,
    changes: BasketChanges,
) -> Result<basket::Model>
where
    C: ConnectionTrait,
{
    let name = changes.name.as_deref().map(validate_name).transpose()?;
    let store = changes.store.as_deref().map(validate_store).transpose()?;

    if let Some(shared_with) = changes.shared_with {
        replace_shares(db, basket.id, &shared_with).await?;
    }

    let mut active: basket::ActiveModel = basket.clone().into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(store) = store {
        active.store = Set(store);
    }
    if let Some(status) = changes.status {
        active.status = Set(status);
    }
    if !active.is_changed() {
        return Ok(basket);
    }
    active.update(db).await.map_err(Into::into)
}

/// Deletes a basket, its items and its share rows.
///
/// The cascade is explicit; call inside a transaction.
pub async fn delete_basket_cascade<C>(db: &C, basket_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let items = Item::delete_many()
        .filter(item::Column::BasketId.eq(basket_id))
        .exec(db)
        .await?;
    BasketShare::delete_many()
        .filter(basket_share::Column::BasketId.eq(basket_id))
        .exec(db)
        .await?;
    let result = Basket::delete_by_id(basket_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("basket", basket_id));
    }
    info!(basket_id, items = items.rows_affected, "Basket deleted");
    Ok(())
}
