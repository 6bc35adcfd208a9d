use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath},
        not_found,
    },
    core::{authz::Actor, baskets::BasketChanges},
    errors::Result,
    handlers::{self, BasketListing, BasketPayload, BasketView},
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

pub fn router(expose_directory: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/baskets", get(list).post(create))
        .route("/baskets/:basket_id", get(retrieve).put(update).delete(destroy));
    if expose_directory {
        router.route("/baskets/all", get(list_all))
    } else {
        router.route("/baskets/all", get(not_found))
    }
}

async fn list(State(state): State<AppState>, actor: Actor) -> Result<Json<Vec<BasketView>>> {
    let views = handlers::baskets::list_baskets(&state.db, &actor, BasketListing::Mine).await?;
    Ok(Json(views))
}

async fn list_all(State(state): State<AppState>, actor: Actor) -> Result<Json<Vec<BasketView>>> {
    let views =
        handlers::baskets::list_baskets(&state.db, &actor, BasketListing::Everything).await?;
    Ok(Json(views))
}

async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(payload): ApiJson<BasketPayload>,
) -> Result<(StatusCode, Json<BasketView>)> {
    let view = handlers::baskets::create_basket(&state.db, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn retrieve(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(basket_id): ApiPath<i64>,
) -> Result<Json<BasketView>> {
    let view = handlers::baskets::retrieve_basket(&state.db, &actor, basket_id).await?;
    Ok(Json(view))
}

async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(basket_id): ApiPath<i64>,
    ApiJson(changes): ApiJson<BasketChanges>,
) -> Result<Json<BasketView>> {
    let view = handlers::baskets::update_basket(&state.db, &actor, basket_id, changes).await?;
    Ok(Json(view))
}

async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(basket_id): ApiPath<i64>,
) -> Result<StatusCode> {
    handlers::baskets::delete_basket(&state.db, &actor, basket_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
