//! Hope Foundation donation platform.
//!
//! Donors register against an admin (tenant), pledge to causes by bank
//! transfer or crypto and upload a payment proof. Admins review pledges,
//! confirm or reject them and manage their own payment details.
//!
//! # Layout
//! - `/` and `/causes` are server-rendered pages
//! - `/api/*` is the JSON API, every body carries a `success` flag
//! - `/assets/*` serves static files from `ASSETS_DIR`
//!
//! # Running
//! ```sh
//! SESSION_SECRET=change-me cargo run -- serve
//! SESSION_SECRET=change-me cargo run -- seed
//! ```

use std::sync::Arc;

use anyhow::Context;
use axum::{Router, routing::get_service};
use tokio::{net::TcpListener, signal::ctrl_c};
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

pub mod aggregate;
pub mod blob;
pub mod causes;
pub mod config;
pub mod error;
pub mod models;
pub mod pages;
pub mod routes;
pub mod session;
pub mod store;

use blob::{BlobStore, CloudinaryStore};
use config::Config;
use store::{MongoStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub blobs: Arc<dyn BlobStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: impl Store + 'static, blobs: impl BlobStore + 'static, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            blobs: Arc::new(blobs),
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.assets_dir);

    Router::new()
        .merge(pages::page_routes())
        .nest("/api", routes::api_routes())
        .nest_service("/assets", get_service(assets))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn connect(config: &Config) -> anyhow::Result<MongoStore> {
    MongoStore::connect(&config.mongodb_uri, &config.mongodb_database)
        .await
        .context("Failed to connect to MongoDB")
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    info!("Initializing state...");
    let store = connect(&config).await?;
    info!("Successfully connected to MongoDB");

    if config.cloudinary_cloud_name.is_none() {
        info!("CLOUDINARY_CLOUD_NAME not set, proof uploads are disabled");
    }
    let blobs = CloudinaryStore::new(
        config.cloudinary_cloud_name.clone(),
        config.cloudinary_upload_preset.clone(),
        config.cloudinary_folder.clone(),
    );

    let address = format!("0.0.0.0:{}", config.port);
    let app = app(AppState::new(store, blobs, config));

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Creates or refreshes the bootstrap admin, then exits.
pub async fn run_seed(config: Config) -> anyhow::Result<()> {
    let store = connect(&config).await?;
    let outcome = routes::seed::seed_admin(&store)
        .await
        .context("Seeding failed")?;

    if outcome.updated {
        info!("Payment methods reset for admin {}", outcome.admin_id.to_hex());
    } else {
        info!("Created admin {}", outcome.admin_id.to_hex());
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            return std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
