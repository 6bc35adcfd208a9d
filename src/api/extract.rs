//! Request extractors: the calling [`Actor`] and error-mapped `Json`/`Path`.

use crate::{
    api::AppState,
    auth::TokenKind,
    core::authz::Actor,
    errors::{Error, Result},
};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

/// JSON body whose rejections are reported as validation errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose rejections are reported as validation errors.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// Bearer credentials of the request, `None` when no `Authorization` header is sent.
async fn bearer_credentials(parts: &mut Parts) -> Result<Option<Bearer>> {
    match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, &()).await {
        Ok(TypedHeader(Authorization(bearer))) => Ok(Some(bearer)),
        Err(rejection) if rejection.is_missing() => Ok(None),
        Err(rejection) => Err(Error::unauthorized(format!(
            "invalid authorization header: {rejection}"
        ))),
    }
}

/// Resolves the caller from an access token. Whether the account still exists
/// is checked by the handler, inside its transaction.
#[axum::async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(bearer) = bearer_credentials(parts).await? else {
            return Ok(Self::Anonymous);
        };
        let user_id = state.tokens.verify(bearer.token(), TokenKind::Access)?;
        Ok(Self::User(user_id))
    }
}
