//! Order placement service for the babycart storefront.
//!
//! The storefront's only transactional workflow lives here: a checkout
//! request reserves stock across four product categories, mirrors the
//! stock ledger, computes weight-based delivery pricing, and persists the
//! order — all inside one all-or-nothing store transaction — behind a
//! small HTTP API.

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod model;
pub mod pricing;
pub mod server;
pub mod state;
pub mod store;

pub use checkout::{OrderPlacementService, PlacedOrder};
pub use config::{CliArgs, SeedCatalog, ServerConfig};
pub use error::OrderError;
pub use logging::{LoggingConfig, init_logging};
pub use state::AppState;
pub use store::MemoryStore;

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;

/// Run the order API until a shutdown signal arrives.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let store = Arc::new(MemoryStore::new());

    if let Some(path) = config.seed_catalog.as_ref() {
        let catalog = SeedCatalog::load(path)?;
        let entries = catalog.into_entries();
        let product_count = entries.len();
        for (category, seed) in entries {
            store.insert_product(category, seed.into_product());
        }
        tracing::info!(
            products = product_count,
            path = %path.display(),
            "seeded catalog"
        );
    } else {
        tracing::warn!("no seed catalog configured, starting with an empty catalog");
    }

    let state = Arc::new(AppState::new(store));
    let router = server::router(state);

    let listener = TcpListener::bind(config.http_bind).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, "order API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
