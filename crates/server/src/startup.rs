use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, StoreBackend, VerifierKind};
use dotenvy::dotenv;
use migration::MigratorTrait;
use service::auth::{GoogleIdentity, IdentityVerifier, SharedSecretVerifier};
use service::storage::{DocumentStore, JsonDocumentStore, SeaOrmDocumentStore};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::metrics::Metrics;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the configured document store, migrating the database first when
/// it is PostgreSQL.
pub async fn open_store(cfg: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match cfg.store.backend {
        StoreBackend::Memory => JsonDocumentStore::in_memory(),
        StoreBackend::File => {
            common::env::ensure_data_dir(std::path::Path::new(&cfg.store.file_path)).await?;
            JsonDocumentStore::open(&cfg.store.file_path).await?
        }
        StoreBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            migration::Migrator::up(&db, None).await?;
            SeaOrmDocumentStore::new(db)
        }
    };
    info!(backend = ?cfg.store.backend, "document store ready");
    Ok(store)
}

/// Build the verifier named by `oauth.verifier`.
pub fn build_verifier(cfg: &AppConfig, google: &GoogleIdentity) -> Arc<dyn IdentityVerifier> {
    match cfg.oauth.verifier {
        VerifierKind::Google => Arc::new(google.clone()),
        VerifierKind::SharedSecret => {
            Arc::new(SharedSecretVerifier::new(&cfg.oauth.shared_secret, cfg.oauth.client_id.clone()))
        }
    }
}

/// Assemble the router for a loaded configuration.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let store = open_store(cfg).await?;
    let google = GoogleIdentity::new(cfg.oauth.clone());
    let verifier = build_verifier(cfg, &google);
    let metrics = Arc::new(Metrics::new()?);
    let state = ServerState::new(store, verifier, Arc::new(google), metrics);
    Ok(routes::build_router(state, build_cors()))
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, verifier = ?cfg.oauth.verifier, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
