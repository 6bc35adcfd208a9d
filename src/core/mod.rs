//! Core business logic - framework-agnostic stores and the authorization engine.

/// Authorization engine: who may do what to which basket or item
pub mod authz;
/// Basket store
pub mod baskets;
/// Item store
pub mod items;
/// User directory
pub mod users;
