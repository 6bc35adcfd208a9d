use crate::{
    auth::{TokenKeys, TokenKind, TokenPair},
    core::{
        authz::{self, Actor, Resource, UserId, Verb},
        users::{self, NewUser, PasswordReset, UserChanges},
    },
    entities::user,
    errors::{Error, Result},
    handlers::{require_actor, views::UserView},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use tracing::{info, instrument};

/// Sign-in body
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Plaintext password
    pub password: String,
}

/// Token refresh body
#[derive(Clone, Debug, Deserialize)]
pub struct RefreshRequest {
    /// A refresh token from an earlier sign-in
    pub refresh: String,
}

/// Resolves a user account and checks `verb` against it.
async fn resolve_account<C>(
    db: &C,
    actor: &Actor,
    user_id: UserId,
    verb: Verb,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    require_actor(db, actor).await?;
    let account = users::require_user(db, user_id).await?;
    authz::ensure(actor, verb, &Resource::User(account.id))?;
    Ok(account)
}

/// Registers a new account. Open to anonymous callers.
#[instrument(skip(db, new_user))]
pub async fn sign_up(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    let txn = db.begin().await?;
    let created = users::create_user(&txn, new_user).await?;
    txn.commit().await?;
    Ok(created)
}

/// Exchanges a username and password for a token pair.
#[instrument(skip(db, keys, credentials), fields(username = %credentials.username))]
pub async fn sign_in(
    db: &DatabaseConnection,
    keys: &TokenKeys,
    credentials: Credentials,
) -> Result<TokenPair> {
    let account = users::verify_credentials(db, &credentials.username, &credentials.password).await?;
    info!(user_id = account.id, "Signed in");
    keys.issue_pair(account.id)
}

/// Exchanges a refresh token for a new pair, provided the account still exists.
#[instrument(skip_all)]
pub async fn refresh_tokens(
    db: &DatabaseConnection,
    keys: &TokenKeys,
    request: RefreshRequest,
) -> Result<TokenPair> {
    let user_id = keys.verify(&request.refresh, TokenKind::Refresh)?;
    if users::find_user(db, user_id).await?.is_none() {
        return Err(Error::unauthorized("account no longer exists"));
    }
    keys.issue_pair(user_id)
}

/// Lists every account.
#[instrument(skip(db))]
pub async fn list_users(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<user::Model>> {
    require_actor(db, actor).await?;
    authz::ensure(actor, Verb::List, &Resource::UserDirectory)?;
    users::list_users(db).await
}

/// Fetches an account with its connections. Self only.
#[instrument(skip(db))]
pub async fn retrieve_user(db: &DatabaseConnection, actor: &Actor, user_id: UserId) -> Result<UserView> {
    let txn = db.begin().await?;
    let account = resolve_account(&txn, actor, user_id, Verb::Read).await?;
    let view = UserView::load(&txn, account).await?;
    txn.commit().await?;
    Ok(view)
}

/// Applies a partial profile update. Self only.
#[instrument(skip(db, changes))]
pub async fn update_user(
    db: &DatabaseConnection,
    actor: &Actor,
    user_id: UserId,
    changes: UserChanges,
) -> Result<UserView> {
    let txn = db.begin().await?;
    let account = resolve_account(&txn, actor, user_id, Verb::Update).await?;
    let updated = users::update_user(&txn, account, changes).await?;
    let view = UserView::load(&txn, updated).await?;
    txn.commit().await?;
    Ok(view)
}

/// Deletes an account and everything it owns. Self only.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, actor: &Actor, user_id: UserId) -> Result<()> {
    let txn = db.begin().await?;
    resolve_account(&txn, actor, user_id, Verb::Delete).await?;
    users::delete_user(&txn, user_id).await?;
    txn.commit().await?;
    Ok(())
}

/// Changes a password given the current one. Open to anonymous callers.
#[instrument(skip(db, reset))]
pub async fn reset_password(db: &DatabaseConnection, username: &str, reset: PasswordReset) -> Result<()> {
    let txn = db.begin().await?;
    users::reset_password(&txn, username, reset).await?;
    txn.commit().await?;
    Ok(())
}

/// Connects the acting user's account to `other`.
#[instrument(skip(db))]
pub async fn connect_users(
    db: &DatabaseConnection,
    actor: &Actor,
    user_id: UserId,
    other: UserId,
) -> Result<UserView> {
    let txn = db.begin().await?;
    let account = resolve_account(&txn, actor, user_id, Verb::Update).await?;
    users::connect_users(&txn, account.id, other).await?;
    let view = UserView::load(&txn, account).await?;
    txn.commit().await?;
    Ok(view)
}

/// Removes the connection between the acting user's account and `other`.
#[instrument(skip(db))]
pub async fn disconnect_users(
    db: &DatabaseConnection,
    actor: &Actor,
    user_id: UserId,
    other: UserId,
) -> Result<()> {
    let txn = db.begin().await?;
    let account = resolve_account(&txn, actor, user_id, Verb::Update).await?;
    users::disconnect_users(&txn, account.id, other).await?;
    txn.commit().await?;
    Ok(())
}
