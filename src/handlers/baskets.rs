use crate::{
    core::{
        authz::{self, Actor, BasketAccess, Resource, UserId, Verb},
        baskets::{self, BasketChanges, CreateBasket},
    },
    entities::{BasketStatus, basket},
    errors::Result,
    handlers::{require_actor, views::BasketView},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use tracing::instrument;

/// Which baskets a listing covers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BasketListing {
    /// Baskets the actor owns or is shared on
    Mine,
    /// Every basket in the system
    Everything,
}

/// Basket creation body. The owner is always the acting user.
#[derive(Clone, Debug, Deserialize)]
pub struct BasketPayload {
    /// Display name
    pub name: String,
    /// Optional store label
    #[serde(default)]
    pub store: Option<String>,
    /// Initial status, `pending` when omitted
    #[serde(default)]
    pub status: BasketStatus,
    /// Users to share the basket with
    #[serde(default)]
    pub shared_with: Vec<UserId>,
}

impl BasketPayload {
    fn into_command(self, owner_id: UserId) -> CreateBasket {
        CreateBasket {
            owner_id,
            name: self.name,
            store: self.store,
            status: self.status,
            shared_with: self.shared_with,
        }
    }
}

/// Resolves a basket and checks `verb` against it.
async fn resolve_basket<C>(
    db: &C,
    actor: &Actor,
    basket_id: i64,
    verb: Verb,
) -> Result<(basket::Model, BasketAccess)>
where
    C: ConnectionTrait,
{
    require_actor(db, actor).await?;
    let basket = baskets::require_basket(db, basket_id).await?;
    let access = baskets::load_access(db, &basket).await?;
    authz::ensure(actor, verb, &Resource::Basket(&access))?;
    Ok((basket, access))
}

/// Lists baskets with their shares and items expanded.
#[instrument(skip(db))]
pub async fn list_baskets(
    db: &DatabaseConnection,
    actor: &Actor,
    listing: BasketListing,
) -> Result<Vec<BasketView>> {
    let txn = db.begin().await?;
    require_actor(&txn, actor).await?;
    let user_id = authz::ensure(actor, Verb::List, &Resource::BasketCollection)?;
    let found = match listing {
        BasketListing::Mine => baskets::list_baskets_for_user(&txn, user_id).await?,
        BasketListing::Everything => baskets::list_all_baskets(&txn).await?,
    };
    let mut views = Vec::with_capacity(found.len());
    for basket in found {
        views.push(BasketView::load(&txn, basket).await?);
    }
    txn.commit().await?;
    Ok(views)
}

/// Creates a basket owned by the acting user.
#[instrument(skip(db, payload))]
pub async fn create_basket(
    db: &DatabaseConnection,
    actor: &Actor,
    payload: BasketPayload,
) -> Result<BasketView> {
    let txn = db.begin().await?;
    require_actor(&txn, actor).await?;
    let owner_id = authz::ensure(actor, Verb::Create, &Resource::BasketCollection)?;
    let created = baskets::create_basket(&txn, payload.into_command(owner_id)).await?;
    let view = BasketView::load(&txn, created).await?;
    txn.commit().await?;
    Ok(view)
}

/// Fetches one basket.
#[instrument(skip(db))]
pub async fn retrieve_basket(
    db: &DatabaseConnection,
    actor: &Actor,
    basket_id: i64,
) -> Result<BasketView> {
    let txn = db.begin().await?;
    let (basket, _) = resolve_basket(&txn, actor, basket_id, Verb::Read).await?;
    let view = BasketView::load(&txn, basket).await?;
    txn.commit().await?;
    Ok(view)
}

/// Applies a partial update. Owner or shared users only.
#[instrument(skip(db, changes))]
pub async fn update_basket(
    db: &DatabaseConnection,
    actor: &Actor,
    basket_id: i64,
    changes: BasketChanges,
) -> Result<BasketView> {
    let txn = db.begin().await?;
    let (basket, _) = resolve_basket(&txn, actor, basket_id, Verb::Update).await?;
    let updated = baskets::update_basket(&txn, basket, changes).await?;
    let view = BasketView::load(&txn, updated).await?;
    txn.commit().await?;
    Ok(view)
}

/// Deletes a basket and its items. Owner only.
#[instrument(skip(db))]
pub async fn delete_basket(db: &DatabaseConnection, actor: &Actor, basket_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    resolve_basket(&txn, actor, basket_id, Verb::Delete).await?;
    baskets::delete_basket_cascade(&txn, basket_id).await?;
    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::items,
        errors::Error,
        test_utils::*,
    };

    fn payload(name: &str, shared_with: Vec<UserId>) -> BasketPayload {
        BasketPayload {
            name: name.to_string(),
            store: None,
            status: BasketStatus::default(),
            shared_with,
        }
    }

    #[tokio::test]
    async fn test_create_records_actor_as_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;

        let view = create_basket(&db, &Actor::User(alice.id), payload("Groceries", vec![bob.id])).await?;
        assert_eq!(view.basket.owner_id, alice.id);
        assert_eq!(view.basket.status, BasketStatus::Pending);
        assert_eq!(view.shared_with.len(), 1);
        assert_eq!(view.shared_with[0].id, bob.id);
        assert!(view.items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_anonymous_cannot_create_or_list() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            create_basket(&db, &Actor::Anonymous, payload("Groceries", Vec::new())).await,
            Err(Error::Unauthorized { .. })
        ));
        assert!(matches!(
            list_baskets(&db, &Actor::Anonymous, BasketListing::Mine).await,
            Err(Error::Unauthorized { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_account_is_unauthorized() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let ghost = Actor::User(alice.id);
        crate::core::users::delete_user(&db, alice.id).await?;

        assert!(matches!(
            create_basket(&db, &ghost, payload("Groceries", Vec::new())).await,
            Err(Error::Unauthorized { .. })
        ));
        assert!(matches!(
            list_baskets(&db, &ghost, BasketListing::Mine).await,
            Err(Error::Unauthorized { .. })
        ));
        assert!(baskets::list_all_baskets(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_anonymous_checked_before_lookup() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            retrieve_basket(&db, &Actor::Anonymous, 42).await,
            Err(Error::Unauthorized { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_shared_user_updates_but_cannot_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;
        let basket = create_shared_basket(&db, &alice, "Groceries", &[bob.id]).await?;
        let as_bob = Actor::User(bob.id);

        let changes = BasketChanges {
            status: Some(BasketStatus::Open),
            ..Default::default()
        };
        let updated = update_basket(&db, &as_bob, basket.id, changes).await?;
        assert_eq!(updated.basket.status, BasketStatus::Open);
        assert_eq!(updated.basket.owner_id, alice.id);

        assert!(matches!(
            delete_basket(&db, &as_bob, basket.id).await,
            Err(Error::Forbidden { .. })
        ));
        assert!(baskets::find_basket(&db, basket.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_stranger_is_forbidden_and_missing_is_not_found() -> Result<()> {
        let (db, _alice, basket) = setup_with_basket().await?;
        let carol = create_test_user(&db, "carol").await?;
        let as_carol = Actor::User(carol.id);

        assert!(matches!(
            retrieve_basket(&db, &as_carol, basket.id).await,
            Err(Error::Forbidden { .. })
        ));
        assert!(matches!(
            update_basket(&db, &as_carol, basket.id, BasketChanges::default()).await,
            Err(Error::Forbidden { .. })
        ));
        assert!(matches!(
            retrieve_basket(&db, &as_carol, basket.id + 100).await,
            Err(Error::NotFound { resource: "basket", .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_owner_delete_cascades_items() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;
        let basket = create_shared_basket(&db, &alice, "Groceries", &[bob.id]).await?;
        let milk = create_test_item(&db, &basket, &bob, "Milk").await?;

        delete_basket(&db, &Actor::User(alice.id), basket.id).await?;

        assert!(matches!(
            items::require_item(&db, milk.id).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            retrieve_basket(&db, &Actor::User(alice.id), basket.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_modes() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;
        let shared = create_shared_basket(&db, &bob, "Party", &[alice.id]).await?;
        let private = create_test_basket(&db, &bob, "Private").await?;
        create_test_item(&db, &shared, &bob, "Cake").await?;

        let mine = list_baskets(&db, &Actor::User(alice.id), BasketListing::Mine).await?;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].basket.id, shared.id);
        assert_eq!(mine[0].items.len(), 1);

        let everything = list_baskets(&db, &Actor::User(alice.id), BasketListing::Everything).await?;
        let ids: Vec<i64> = everything.iter().map(|v| v.basket.id).collect();
        assert_eq!(ids, vec![shared.id, private.id]);
        Ok(())
    }
}
