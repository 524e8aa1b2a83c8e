pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod lease;
pub mod models;
pub mod routes;
pub mod storage;
pub mod store;

pub const STATIC_HASH: &str = env!("STATIC_HASH");

use axum::{routing::get, Router};
use sqlx::SqlitePool;
use time::Duration;
use axum::http::{header, HeaderValue};
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::clock::SharedClock;
use crate::error::AppError;
use crate::storage::SqliteKv;
use crate::store::Stores;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub stores: Stores,
    pub clock: SharedClock,
    pub login_delay: std::time::Duration,
}

impl AppState {
    /// Hydrate the stores from the `kv_store` table of `pool`.
    ///
    /// Caller is responsible for running database migrations on `pool` beforehand.
    pub async fn load(
        pool: SqlitePool,
        clock: SharedClock,
        login_delay: std::time::Duration,
    ) -> Result<Self, AppError> {
        let stores = Stores::load(SqliteKv::new(pool.clone()), clock.clone()).await?;
        Ok(Self {
            db: pool,
            stores,
            clock,
            login_delay,
        })
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// This function sets up the session store (and migrates its table), then
/// assembles all route modules, middleware, and state.
pub async fn build_app(state: AppState, secure_cookies: bool) -> Result<Router, AppError> {
    let session_store = SqliteStore::new(state.db.clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(30)))
        .with_secure(secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax);

    let router = Router::new()
        .route("/health", get(health))
        .merge(routes::auth::router())
        .merge(routes::dashboard::router())
        .merge(routes::bags::router())
        .merge(routes::members::router())
        .merge(routes::orders::router())
        .merge(routes::owner::router())
        .merge(routes::export::router())
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("public, max-age=86400"),
                ))
                .service(ServeDir::new("static")),
        )
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    Ok(router)
}
