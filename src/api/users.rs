use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath},
    },
    auth::TokenPair,
    core::{
        authz::{Actor, UserId},
        users::{NewUser, PasswordReset, UserChanges},
    },
    entities::user,
    errors::Result,
    handlers::{self, Credentials, RefreshRequest, UserView},
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list))
        .route("/users/sign-up", post(sign_up))
        .route("/users/sign-in", post(sign_in))
        .route("/users/token-refresh", post(refresh))
        .route("/users/password-reset/:username", patch(reset_password))
        .route("/users/:user_id", get(retrieve).put(update).delete(destroy))
        .route(
            "/users/:user_id/connections/:other_id",
            post(connect).delete(disconnect),
        )
}

async fn sign_up(
    State(state): State<AppState>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<user::Model>)> {
    let created = handlers::users::sign_up(&state.db, new_user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn sign_in(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<TokenPair>> {
    let pair = handlers::users::sign_in(&state.db, &state.tokens, credentials).await?;
    Ok(Json(pair))
}

async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    let pair = handlers::users::refresh_tokens(&state.db, &state.tokens, request).await?;
    Ok(Json(pair))
}

async fn reset_password(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
    ApiJson(reset): ApiJson<PasswordReset>,
) -> Result<StatusCode> {
    handlers::users::reset_password(&state.db, &username, reset).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list(State(state): State<AppState>, actor: Actor) -> Result<Json<Vec<user::Model>>> {
    let found = handlers::users::list_users(&state.db, &actor).await?;
    Ok(Json(found))
}

async fn retrieve(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<UserView>> {
    let view = handlers::users::retrieve_user(&state.db, &actor, user_id).await?;
    Ok(Json(view))
}

async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(changes): ApiJson<UserChanges>,
) -> Result<Json<UserView>> {
    let view = handlers::users::update_user(&state.db, &actor, user_id, changes).await?;
    Ok(Json(view))
}

async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<StatusCode> {
    handlers::users::delete_user(&state.db, &actor, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn connect(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((user_id, other_id)): ApiPath<(UserId, UserId)>,
) -> Result<Json<UserView>> {
    let view = handlers::users::connect_users(&state.db, &actor, user_id, other_id).await?;
    Ok(Json(view))
}

async fn disconnect(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((user_id, other_id)): ApiPath<(UserId, UserId)>,
) -> Result<StatusCode> {
    handlers::users::disconnect_users(&state.db, &actor, user_id, other_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
