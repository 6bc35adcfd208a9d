//! User directory - Accounts, credentials, and the symmetric connections relation.
//!
//! Functions are generic over [`ConnectionTrait`] so request handlers can run them
//! inside a single transaction. Connections are stored once per pair as a
//! normalized `(low, high)` edge; see [`edge_key`].

use crate::{
    auth,
    core::authz::UserId,
    entities::{
        Basket, BasketShare, Item, User, UserConnection, basket, basket_share, item, user,
        user_connection,
    },
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, SqlErr, prelude::*};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

const MAX_FIELD_LEN: usize = 255;

/// Sign-up payload
#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    /// Desired login name
    pub username: String,
    /// Contact address
    pub email: String,
    /// Plaintext password; hashed before it is stored
    pub password: String,
    /// Must equal `password`
    #[serde(default)]
    pub confirm_password: String,
    /// Optional avatar URL
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Partial profile update; absent fields are left unchanged
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserChanges {
    /// New login name
    pub username: Option<String>,
    /// New contact address
    pub email: Option<String>,
    /// New avatar URL
    pub profile_image: Option<String>,
    /// Replacement for the whole connections set
    pub connections: Option<Vec<UserId>>,
}

/// Password change keyed by username
#[derive(Clone, Debug, Deserialize)]
pub struct PasswordReset {
    /// The password currently on record
    pub current_password: String,
    /// Replacement password
    pub new_password: String,
    /// Must equal `new_password`
    #[serde(default)]
    pub confirm_password: String,
}

/// Returns the canonical `(low, high)` key of the undirected edge between `a` and `b`.
#[must_use]
pub const fn edge_key(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}

fn validate_text(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > MAX_FIELD_LEN {
        return Err(Error::validation(
            field,
            format!("must be at most {MAX_FIELD_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_email(value: &str) -> Result<String> {
    let email = validate_text("email", value)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(Error::validation("email", "not a valid email address")),
    }
}

fn validate_profile_image(value: &str) -> Result<Option<String>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    url::Url::parse(trimmed)
        .map_err(|e| Error::validation("profile_image", format!("not a valid URL: {e}")))?;
    Ok(Some(trimmed.to_string()))
}

fn validate_password_pair(
    field: &'static str,
    password: &str,
    confirmation: &str,
) -> Result<()> {
    if password.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    if password != confirmation {
        return Err(Error::validation("confirm_password", "Passwords do not match."));
    }
    Ok(())
}

async fn ensure_unique<C>(
    db: &C,
    username: Option<&str>,
    email: Option<&str>,
    except: Option<UserId>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let scope = |column: user::Column, value: &str| {
        let mut query = User::find().filter(column.eq(value));
        if let Some(id) = except {
            query = query.filter(user::Column::Id.ne(id));
        }
        query
    };

    if let Some(username) = username {
        if scope(user::Column::Username, username).one(db).await?.is_some() {
            return Err(taken("username"));
        }
    }
    if let Some(email) = email {
        if scope(user::Column::Email, email).one(db).await?.is_some() {
            return Err(taken("email"));
        }
    }
    Ok(())
}

fn taken(field: &'static str) -> Error {
    Error::validation(field, format!("A user with this {field} already exists."))
}

/// Turns a unique-index failure on `users` into the matching field error.
///
/// [`ensure_unique`] catches the common case; this covers a concurrent
/// request claiming the same name between that check and the write.
fn map_unique_violation(err: DbErr) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("email") => {
            taken("email")
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => taken("username"),
        _ => err.into(),
    }
}

/// Validates a sign-up payload and stores the account with a salted password hash.
///
/// Nothing is written unless every check passes.
#[instrument(skip(db, new_user), fields(username = %new_user.username))]
pub async fn create_user<C>(db: &C, new_user: NewUser) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let username = validate_text("username", &new_user.username)?;
    let email = validate_email(&new_user.email)?;
    validate_password_pair("password", &new_user.password, &new_user.confirm_password)?;
    let profile_image = match new_user.profile_image.as_deref() {
        Some(url) => validate_profile_image(url)?,
        None => None,
    };
    ensure_unique(db, Some(&username), Some(&email), None).await?;

    let account = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        password_hash: Set(auth::hash_password(&new_user.password)?),
        profile_image: Set(profile_image),
        is_staff: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let created = account.insert(db).await.map_err(map_unique_violation)?;
    info!(user_id = created.id, "User created");
    Ok(created)
}

/// Finds a user by id.
pub async fn find_user<C>(db: &C, user_id: UserId) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by id, failing with `NotFound`.
pub async fn require_user<C>(db: &C, user_id: UserId) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    find_user(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))
}

/// Finds a user by login name.
pub async fn find_user_by_username<C>(db: &C, username: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every user, ordered by username.
pub async fn list_users<C>(db: &C) -> Result<Vec<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Fails with a `Validation` error naming `field` unless every id is a known user.
pub async fn ensure_users_exist<C>(
    db: &C,
    field: &'static str,
    user_ids: &BTreeSet<UserId>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if user_ids.is_empty() {
        return Ok(());
    }
    let found: BTreeSet<UserId> = User::find()
        .filter(user::Column::Id.is_in(user_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();
    match user_ids.difference(&found).next() {
        Some(missing) => Err(Error::validation(field, format!("unknown user {missing}"))),
        None => Ok(()),
    }
}

/// Checks a username/password pair.
///
/// Unknown usernames and wrong passwords produce the same `Unauthorized` error.
pub async fn verify_credentials<C>(db: &C, username: &str, password: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let rejected = || Error::unauthorized("No active account found with the given credentials");
    let Some(account) = find_user_by_username(db, username).await? else {
        auth::verify_against_dummy(password)?;
        return Err(rejected());
    };
    if auth::verify_password(password, &account.password_hash)? {
        Ok(account)
    } else {
        Err(rejected())
    }
}

/// Applies a partial profile update to `account`.
#[instrument(skip(db, account, changes), fields(user_id = account.id))]
pub async fn update_user<C>(db: &C, account: user::Model, changes: UserChanges) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let user_id = account.id;
    let username = changes
        .username
        .as_deref()
        .map(|name| validate_text("username", name))
        .transpose()?;
    let email = changes.email.as_deref().map(validate_email).transpose()?;
    let profile_image = changes
        .profile_image
        .as_deref()
        .map(validate_profile_image)
        .transpose()?;
    ensure_unique(db, username.as_deref(), email.as_deref(), Some(user_id)).await?;

    if let Some(connections) = changes.connections {
        set_connections(db, user_id, &connections).await?;
    }

    let mut active: user::ActiveModel = account.clone().into();
    if let Some(username) = username {
        active.username = Set(username);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(profile_image) = profile_image {
        active.profile_image = Set(profile_image);
    }
    if !active.is_changed() {
        return Ok(account);
    }
    active.update(db).await.map_err(map_unique_violation)
}

/// Replaces the password of `username` after checking the current one.
///
/// The new password is never returned.
#[instrument(skip(db, reset))]
pub async fn reset_password<C>(db: &C, username: &str, reset: PasswordReset) -> Result<()>
where
    C: ConnectionTrait,
{
    validate_password_pair("new_password", &reset.new_password, &reset.confirm_password)?;
    let account = verify_credentials(db, username, &reset.current_password).await?;
    let user_id = account.id;

    let mut active: user::ActiveModel = account.into();
    active.password_hash = Set(auth::hash_password(&reset.new_password)?);
    active.update(db).await?;
    info!(user_id, "Password reset");
    Ok(())
}

/// Deletes an account and everything that hangs off it.
///
/// Removes, in order: items in baskets the user owns, share rows of those
/// baskets, the baskets, items the user created elsewhere, share rows naming
/// the user, connection edges, and finally the user row. Run inside a
/// transaction so a failure leaves nothing half-deleted.
#[instrument(skip(db))]
pub async fn delete_user<C>(db: &C, user_id: UserId) -> Result<()>
where
    C: ConnectionTrait,
{
    let owned: Vec<i64> = Basket::find()
        .filter(basket::Column::OwnerId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();
    for basket_id in &owned {
        crate::core::baskets::delete_basket_cascade(db, *basket_id).await?;
    }

    let items = Item::delete_many()
        .filter(item::Column::CreatorId.eq(user_id))
        .exec(db)
        .await?;
    let shares = BasketShare::delete_many()
        .filter(basket_share::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    let edges = UserConnection::delete_many()
        .filter(touching(user_id))
        .exec(db)
        .await?;

    let result = User::delete_by_id(user_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("user", user_id));
    }
    info!(
        baskets = owned.len(),
        items = items.rows_affected,
        shares = shares.rows_affected,
        connections = edges.rows_affected,
        "User deleted"
    );
    Ok(())
}

fn touching(user_id: UserId) -> Condition {
    Condition::any()
        .add(user_connection::Column::LowUserId.eq(user_id))
        .add(user_connection::Column::HighUserId.eq(user_id))
}

/// Connects two users. Connecting an already-connected pair is a no-op.
pub async fn connect_users<C>(db: &C, a: UserId, b: UserId) -> Result<()>
where
    C: ConnectionTrait,
{
    if a == b {
        return Err(Error::validation("connections", "cannot connect a user to itself"));
    }
    ensure_users_exist(db, "connections", &BTreeSet::from([a, b])).await?;

    let key = edge_key(a, b);
    if UserConnection::find_by_id(key).one(db).await?.is_some() {
        debug!(?key, "Connection already present");
        return Ok(());
    }
    user_connection::ActiveModel {
        low_user_id: Set(key.0),
        high_user_id: Set(key.1),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Removes the connection between two users, failing with `NotFound` if there is none.
pub async fn disconnect_users<C>(db: &C, a: UserId, b: UserId) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = UserConnection::delete_by_id(edge_key(a, b)).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            resource: "connection",
            id: format!("{a}-{b}"),
        });
    }
    Ok(())
}

/// Replaces every connection of `user_id` with edges to `peers`.
pub async fn set_connections<C>(db: &C, user_id: UserId, peers: &[UserId]) -> Result<()>
where
    C: ConnectionTrait,
{
    let peers: BTreeSet<UserId> = peers.iter().copied().collect();
    if peers.contains(&user_id) {
        return Err(Error::validation("connections", "cannot connect a user to itself"));
    }
    ensure_users_exist(db, "connections", &peers).await?;

    UserConnection::delete_many()
        .filter(touching(user_id))
        .exec(db)
        .await?;
    let now = chrono::Utc::now();
    for peer in peers {
        let (low, high) = edge_key(user_id, peer);
        user_connection::ActiveModel {
            low_user_id: Set(low),
            high_user_id: Set(high),
            created_at: Set(now),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Lists the users connected to `user_id`, ordered by username.
pub async fn list_connections<C>(db: &C, user_id: UserId) -> Result<Vec<user::Model>>
where
    C: ConnectionTrait,
{
    let peers: Vec<UserId> = UserConnection::find()
        .filter(touching(user_id))
        .all(db)
        .await?
        .iter()
        .map(|edge| edge.peer_of(user_id))
        .collect();
    if peers.is_empty() {
        return Ok(Vec::new());
    }
    User::find()
        .filter(user::Column::Id.is_in(peers))
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}
