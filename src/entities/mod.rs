//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod basket;
pub mod basket_share;
pub mod item;
pub mod user;
pub mod user_connection;

// Re-export specific types to avoid conflicts
pub use basket::{
    BasketStatus, Column as BasketColumn, Entity as Basket, Model as BasketModel,
};
pub use basket_share::{
    Column as BasketShareColumn, Entity as BasketShare, Model as BasketShareModel,
};
pub use item::{Column as ItemColumn, Entity as Item, ItemStatus, Model as ItemModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use user_connection::{
    Column as UserConnectionColumn, Entity as UserConnection, Model as UserConnectionModel,
};
