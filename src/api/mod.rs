//! HTTP API - axum routes over [`crate::handlers`].

use crate::{
    auth::TokenKeys,
    config::settings::Settings,
    errors::Result,
};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::Level;

mod baskets;
mod error;
/// Request extractors
pub mod extract;
mod items;
mod users;

/// State shared by every route
#[derive(Clone)]
pub struct AppState {
    /// Connection pool
    pub db: DatabaseConnection,
    /// Token signing and verification keys
    pub tokens: Arc<TokenKeys>,
    /// Whether `GET /baskets/all` is routed
    pub expose_basket_directory: bool,
}

impl AppState {
    /// Builds state from an open connection and the loaded settings.
    pub fn from_settings(db: DatabaseConnection, settings: &Settings) -> Result<Self> {
        let tokens = TokenKeys::new(
            settings.jwt_secret()?,
            settings.access_token_ttl()?,
            settings.refresh_token_ttl()?,
        );
        Ok(Self {
            db,
            tokens: Arc::new(tokens),
            expose_basket_directory: settings.expose_basket_directory,
        })
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "msg": "not found" })),
    )
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    Router::new()
        .merge(users::router())
        .merge(baskets::router(state.expose_basket_directory))
        .merge(items::router())
        .fallback(not_found)
        .with_state(state)
        .layer(trace_layer)
}

/// Binds the listen address and serves until Ctrl-C.
pub async fn serve(settings: &Settings, db: DatabaseConnection) -> Result<()> {
    let state = AppState::from_settings(db, settings)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(settings.listen_addr).await?;
    tracing::info!(addr = %settings.listen_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}
