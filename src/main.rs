// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job Offers API Server
//!
//! Periodically pulls job offers from a remote source, stores the new ones
//! and serves them to authenticated users.

use job_offers::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb, OfferRepository, UserRepository},
    services::{AuthService, HttpOfferFetcher, OfferFacade, OfferScheduler, OfferService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Job Offers API");

    // Initialize storage
    let (offer_repository, user_repository): (Arc<dyn OfferRepository>, Arc<dyn UserRepository>) =
        match config.offer_store {
            StoreBackend::Firestore => {
                let db = Arc::new(FirestoreDb::new(&config.gcp_project_id).await?);
                (db.clone() as Arc<dyn OfferRepository>, db as Arc<dyn UserRepository>)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                let db = Arc::new(MemoryDb::new());
                (db.clone() as Arc<dyn OfferRepository>, db as Arc<dyn UserRepository>)
            }
        };

    // Remote offers source
    let fetcher = HttpOfferFetcher::new(
        &config.offers_http_url,
        config.offers_http_connect_timeout,
        config.offers_http_request_timeout,
    )?;
    tracing::info!(url = %config.offers_http_url, "Offer source configured");

    let offer_service = OfferService::new(Arc::new(fetcher), offer_repository.clone());
    let offer_facade = OfferFacade::new(offer_repository, offer_service);
    let auth_service = AuthService::new(user_repository, &config);

    // Start the fetch scheduler
    let scheduler_handle = if config.scheduler_enabled {
        let scheduler = OfferScheduler::new(offer_facade.clone(), config.offers_fetch_interval);
        Some(scheduler.spawn())
    } else {
        tracing::info!("Offer scheduler is disabled");
        None
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        offer_facade,
        auth_service,
    });

    // Build router
    let app = job_offers::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler_handle {
        handle.abort();
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("job_offers=debug,info")),
        )
        .with(format)
        .init();
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
