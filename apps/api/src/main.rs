mod analysis;
mod config;
mod db;
mod errors;
mod extract;
mod intake;
mod models;
mod reports;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::catalog::AnalysisCatalog;
use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::{Config, ScannerBackend, StoreBackend};
use crate::db::create_pool;
use crate::extract::DocumentExtractor;
use crate::intake::scanner::{ClamdScanner, MalwareScanner, SignatureScanner};
use crate::reports::expiry::spawn_expiry_sweeper;
use crate::reports::postgres::PgReportStore;
use crate::reports::store::{MemoryReportStore, ReportStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS API v{}", env!("CARGO_PKG_VERSION"));

    // Report store
    let store: Arc<dyn ReportStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            Arc::new(PgReportStore::new(create_pool(url).await?))
        }
        StoreBackend::Memory => Arc::new(MemoryReportStore::new()),
    };
    info!("Report store initialized (backend: {})", store.name());

    // Malware scanner
    let scanner: Arc<dyn MalwareScanner> = match config.scanner_backend {
        ScannerBackend::Signature => Arc::new(SignatureScanner::new()),
        ScannerBackend::Clamd => Arc::new(ClamdScanner::new(
            config.clamd_addr.clone(),
            config.clamd_timeout,
        )),
    };
    info!("Malware scanner initialized (backend: {})", scanner.name());

    // Keyword and section catalog, immutable for the life of the process
    let catalog = Arc::new(AnalysisCatalog::load(config.catalog_path.as_deref())?);
    info!(
        "Analysis catalog loaded: {} keywords, {} sections",
        catalog.keywords.total_keywords(),
        catalog.sections.sections.len()
    );

    let _sweeper = spawn_expiry_sweeper(store.clone(), config.expiry_sweep_interval);

    let pipeline = AnalysisPipeline::new(scanner, DocumentExtractor::standard(), catalog, store);
    let state = AppState::new(pipeline, config.clone());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins to the frontend host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
