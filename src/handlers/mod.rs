//! Request handlers - transport-independent orchestration.
//!
//! Every handler follows the same shape: open a transaction, resolve the
//! target (or fail with `NotFound`), ask [`crate::core::authz`] for a decision,
//! perform the mutation, then commit. The HTTP layer in [`crate::api`] only
//! extracts inputs and maps results to responses.

use crate::{
    core::authz::{Actor, UserId},
    errors::{Error, Result},
};
use sea_orm::ConnectionTrait;

/// Basket endpoints
pub mod baskets;
/// Item endpoints
pub mod items;
/// Account, session, and connection endpoints
pub mod users;
/// Populated response shapes
pub mod views;

pub use baskets::{BasketListing, BasketPayload};
pub use items::ItemPayload;
pub use users::{Credentials, RefreshRequest};
pub use views::{BasketView, ItemView, UserView};

/// Returns the acting user's id once their account is confirmed to exist in `db`.
///
/// Anonymous actors and tokens of deleted accounts are both `Unauthorized`.
pub(crate) async fn require_actor<C>(db: &C, actor: &Actor) -> Result<UserId>
where
    C: ConnectionTrait,
{
    let user_id = actor.require_user()?;
    if crate::core::users::find_user(db, user_id).await?.is_none() {
        return Err(Error::unauthorized("account no longer exists"));
    }
    Ok(user_id)
}
