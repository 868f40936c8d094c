//! # twiplo: file upload service
//!
//! `twiplo` is a small HTTP service that accepts file uploads, stores the bytes in an
//! S3-compatible bucket (Cloudflare R2 by default) and records their metadata in PostgreSQL.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for persistence. Every request is independent: there are no background tasks,
//! caches or sessions.
//!
//! ### Request Flow
//!
//! An upload to `POST /api/v1/base/files` first passes the [`auth::ApiToken`] extractor, which
//! compares the bearer token with `API_AUTHORIZATION_TOKEN`. The handler then streams the
//! multipart `file` field into memory (bounded by `files.max_file_size`), hands the bytes to the
//! [`storage::StorageService`] which generates a fresh key and uploads the object, and finally
//! inserts a `file_assets` row through the [`db`] repository. The response carries a presigned
//! download URL.
//!
//! Storage and database writes are not coordinated: if the insert fails after the object was
//! stored, the object is left in the bucket and its key is logged at error level.
//!
//! ### Core Components
//!
//! - **API layer** ([`api`]): route handlers and request/response models under `/api/v1`
//! - **Authentication** ([`auth`]): shared bearer token check for protected endpoints
//! - **Storage** ([`storage`]): key generation, uploads and presigned URLs over R2/S3
//! - **Database** ([`db`]): repository over the `file_assets` table
//! - **Configuration** ([`config`]): YAML + environment variable loading via figment
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use twiplo::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = twiplo::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     twiplo::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations are applied out-of-band with `twiplo --migrate` (or `sqlx migrate run`). In the
//! `local` environment they are also applied on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! twiplo::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod storage;
pub mod telemetry;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    config::CorsOrigin,
    openapi::ApiDoc,
    storage::StorageService,
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Headroom on top of `files.max_file_size` for multipart boundaries and the text fields
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across all request handlers.
///
/// Cloned into every handler by axum; all fields are cheap handles.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .storage(storage)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub storage: StorageService,
}

/// Get the twiplo database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration.
///
/// A `*` entry allows any origin. Methods and headers are mirrored from the preflight request so
/// that credentialed requests keep working.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;
    let wildcard = cors_config.allowed_origins.contains(&CorsOrigin::Wildcard);

    let allow_origin = if wildcard {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Browsers send the bare origin, without a path or trailing slash
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        // tower-http refuses credentials together with a wildcard origin
        .allow_credentials(cors_config.allow_credentials && !wildcard)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// - `/api/v1/health`
/// - `/api/v1/base/files` (POST always, GET only in the `local` environment)
/// - `/api/v1/openapi.json` and the Scalar UI at `/docs`
/// - CORS and request tracing
#[instrument(skip_all, fields(environment = %state.config.environment))]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let body_limit = usize::try_from(state.config.files.max_file_size)?.saturating_add(MULTIPART_OVERHEAD);

    let mut files_routes = post(api::handlers::files::upload_file).layer(DefaultBodyLimit::max(body_limit));
    if state.config.environment.is_local() {
        files_routes = files_routes.get(api::handlers::files::list_files);
    } else {
        info!("File listing disabled outside the local environment");
    }

    let api_routes = Router::new()
        .route("/health", get(api::handlers::health::health))
        .route("/base/files", files_routes)
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct.
///
/// 1. **Create**: [`Application::new`] builds the connection pool and storage client, applying
///    migrations when running locally
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], but reuse an existing pool instead of opening one from config
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        info!(environment = %config.environment, bucket = %config.storage.bucket_name, "Starting twiplo");

        let pool = match pool {
            Some(pool) => pool,
            None => db::create_pool(&config.database)?,
        };

        if config.environment.is_local() {
            info!("Applying database migrations");
            migrator().run(&pool).await?;
        }

        let storage = StorageService::from_config(&config.storage).await;

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).storage(storage).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("twiplo listening on http://{}, docs at http://localhost:{}/docs", bind_addr, self.config.port);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
