//! Shared test utilities for `BasketBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        baskets::{self, CreateBasket},
        items::{self, CreateItem},
        users::{self, NewUser},
    },
    entities::{self, BasketStatus, ItemStatus},
    errors::Result,
};
use sea_orm::{ConnectOptions, DatabaseConnection};
use tracing_subscriber::EnvFilter;

/// Password given to every user made by [`create_test_user`].
pub const TEST_PASSWORD: &str = "s3cret-passw0rd";

/// Installs a tracing subscriber that writes through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    // A single pooled connection: every connection to :memory: is its own database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Sign-up payload for `username` with matching passwords.
///
/// # Defaults
/// * `email`: `"<username>@example.com"`
/// * `password` / `confirm_password`: [`TEST_PASSWORD`]
pub fn new_user_payload(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: TEST_PASSWORD.to_string(),
        confirm_password: TEST_PASSWORD.to_string(),
        profile_image: None,
    }
}

/// Creates a test user from [`new_user_payload`].
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    users::create_user(db, new_user_payload(username)).await
}

/// Creates a pending, unshared basket owned by `owner`.
pub async fn create_test_basket(
    db: &DatabaseConnection,
    owner: &entities::user::Model,
    name: &str,
) -> Result<entities::basket::Model> {
    create_shared_basket(db, owner, name, &[]).await
}

/// Creates a pending basket owned by `owner` and shared with `shared_with`.
pub async fn create_shared_basket(
    db: &DatabaseConnection,
    owner: &entities::user::Model,
    name: &str,
    shared_with: &[i64],
) -> Result<entities::basket::Model> {
    baskets::create_basket(
        db,
        CreateBasket {
            owner_id: owner.id,
            name: name.to_string(),
            store: None,
            status: BasketStatus::Pending,
            shared_with: shared_with.to_vec(),
        },
    )
    .await
}

/// Creates an active item in `basket` with `creator` recorded as its author.
pub async fn create_test_item(
    db: &DatabaseConnection,
    basket: &entities::basket::Model,
    creator: &entities::user::Model,
    name: &str,
) -> Result<entities::item::Model> {
    items::create_item(
        db,
        CreateItem {
            basket_id: basket.id,
            creator_id: creator.id,
            name: name.to_string(),
            description: String::new(),
            status: ItemStatus::Active,
        },
    )
    .await
}

/// Sets up a database with one user (`"alice"`) owning one basket (`"Groceries"`).
pub async fn setup_with_basket() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::basket::Model,
)> {
    let db = setup_test_db().await?;
    let owner = create_test_user(&db, "alice").await?;
    let basket = create_test_basket(&db, &owner, "Groceries").await?;
    Ok((db, owner, basket))
}
