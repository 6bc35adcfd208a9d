use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath},
    },
    core::{authz::Actor, items::ItemChanges},
    entities::item,
    errors::Result,
    handlers::{self, ItemPayload, ItemView},
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/baskets/:basket_id/items", get(list).post(create))
        .route("/items/:item_id", get(retrieve).put(update).delete(destroy))
}

async fn list(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(basket_id): ApiPath<i64>,
) -> Result<Json<Vec<item::Model>>> {
    let found = handlers::items::list_items(&state.db, &actor, basket_id).await?;
    Ok(Json(found))
}

async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(basket_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ItemPayload>,
) -> Result<(StatusCode, Json<item::Model>)> {
    let created = handlers::items::create_item(&state.db, &actor, basket_id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn retrieve(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(item_id): ApiPath<i64>,
) -> Result<Json<ItemView>> {
    let view = handlers::items::retrieve_item(&state.db, &actor, item_id).await?;
    Ok(Json(view))
}

async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(item_id): ApiPath<i64>,
    ApiJson(changes): ApiJson<ItemChanges>,
) -> Result<Json<item::Model>> {
    let updated = handlers::items::update_item(&state.db, &actor, item_id, changes).await?;
    Ok(Json(updated))
}

async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(item_id): ApiPath<i64>,
) -> Result<StatusCode> {
    handlers::items::delete_item(&state.db, &actor, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
