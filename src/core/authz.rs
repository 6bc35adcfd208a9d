//! Authorization engine - decides whether an actor may apply a verb to a resource.
//!
//! Decisions are pure: callers load a snapshot of the ownership facts
//! ([`BasketAccess`]) inside their transaction, describe the target as a
//! [`Resource`], and ask [`authorize`]. Nothing in here touches the database.
//!
//! The rules:
//!
//! | Resource | List / Create | Read / Update | Delete |
//! |---|---|---|---|
//! | basket collection | any user | - | - |
//! | basket | - | owner or shared | owner only |
//! | items of a basket | owner or shared | - | - |
//! | item | - | owner or shared on parent | owner or shared on parent |
//! | user directory | any user (list) | - | - |
//! | user | - | self | self |
//!
//! Sharing a basket therefore grants deleting its items but not the basket itself.

use crate::errors::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;

/// Primary key of a user
pub type UserId = i64;

/// Who is making the request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Actor {
    /// No (valid) credentials were presented
    Anonymous,
    /// An authenticated user
    User(UserId),
}

impl Actor {
    /// Returns the user id, or `Unauthorized` for an anonymous actor.
    pub fn require_user(&self) -> Result<UserId> {
        match self {
            Self::User(id) => Ok(*id),
            Self::Anonymous => Err(Error::unauthorized("authentication required")),
        }
    }
}

/// HTTP-style action on a resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Index of a collection
    List,
    /// Add to a collection
    Create,
    /// Fetch one resource
    Read,
    /// Modify one resource
    Update,
    /// Remove one resource
    Delete,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(word)
    }
}

/// Outcome of an authorization check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Go ahead
    Allow,
    /// Authenticated, but not permitted
    Deny,
    /// The actor is anonymous
    Unauthenticated,
}

impl Decision {
    /// True only for [`Decision::Allow`].
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Ownership facts of one basket, loaded by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasketAccess {
    /// Basket the facts describe
    pub basket_id: i64,
    /// Owner of the basket
    pub owner_id: UserId,
    /// Users the basket is shared with
    pub shared_with: BTreeSet<UserId>,
}

impl BasketAccess {
    /// Builds a snapshot from the basket's owner and shared users.
    pub fn new(
        basket_id: i64,
        owner_id: UserId,
        shared_with: impl IntoIterator<Item = UserId>,
    ) -> Self {
        Self {
            basket_id,
            owner_id,
            shared_with: shared_with.into_iter().collect(),
        }
    }

    /// True if `user` owns the basket.
    #[must_use]
    pub const fn is_owner(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// True if `user` is in the shared-with set.
    #[must_use]
    pub fn is_shared_with(&self, user: UserId) -> bool {
        self.shared_with.contains(&user)
    }

    /// The owner-or-shared predicate.
    #[must_use]
    pub fn has_access(&self, user: UserId) -> bool {
        self.is_owner(user) || self.is_shared_with(user)
    }
}

/// Target of an authorization check
#[derive(Clone, Copy, Debug)]
pub enum Resource<'a> {
    /// All baskets; creation and both listing modes
    BasketCollection,
    /// One existing basket
    Basket(&'a BasketAccess),
    /// The items of a basket; listing and creation
    ItemCollection(&'a BasketAccess),
    /// One existing item, described by its parent basket
    Item(&'a BasketAccess),
    /// All user accounts; listing only
    UserDirectory,
    /// One user account
    User(UserId),
}

impl Resource<'_> {
    fn describe(&self) -> String {
        match self {
            Self::BasketCollection => "baskets".to_string(),
            Self::Basket(access) => format!("basket {}", access.basket_id),
            Self::ItemCollection(access) => format!("items of basket {}", access.basket_id),
            Self::Item(access) => format!("item in basket {}", access.basket_id),
            Self::UserDirectory => "users".to_string(),
            Self::User(id) => format!("user {id}"),
        }
    }
}

/// Per-resource permission rules for an authenticated user.
pub trait AccessPolicy {
    /// Whether `user` may apply `verb`.
    fn permits(&self, user: UserId, verb: Verb) -> bool;
}

impl AccessPolicy for Resource<'_> {
    fn permits(&self, user: UserId, verb: Verb) -> bool {
        match (self, verb) {
            (Self::BasketCollection, Verb::List | Verb::Create) => true,
            (Self::Basket(basket), Verb::Read | Verb::Update) => basket.has_access(user),
            (Self::Basket(basket), Verb::Delete) => basket.is_owner(user),
            (Self::ItemCollection(parent), Verb::List | Verb::Create)
            | (Self::Item(parent), Verb::Read | Verb::Update | Verb::Delete) => {
                parent.has_access(user)
            }
            (Self::UserDirectory, Verb::List) => true,
            (Self::User(target), Verb::Read | Verb::Update | Verb::Delete) => *target == user,
            _ => false,
        }
    }
}

/// Decides whether `actor` may apply `verb` to `resource`.
pub fn authorize(actor: &Actor, verb: Verb, resource: &impl AccessPolicy) -> Decision {
    match actor {
        Actor::Anonymous => Decision::Unauthenticated,
        Actor::User(user) if resource.permits(*user, verb) => Decision::Allow,
        Actor::User(_) => Decision::Deny,
    }
}

/// Like [`authorize`], but turns anything other than `Allow` into an error and
/// returns the acting user's id on success.
pub fn ensure(actor: &Actor, verb: Verb, resource: &Resource<'_>) -> Result<UserId> {
    match authorize(actor, verb, resource) {
        Decision::Allow => actor.require_user(),
        Decision::Unauthenticated => Err(Error::unauthorized("authentication required")),
        Decision::Deny => {
            tracing::debug!(?actor, %verb, resource = %resource.describe(), "Access denied");
            Err(Error::Forbidden {
                message: format!("not allowed to {verb} {}", resource.describe()),
            })
        }
    }
}
