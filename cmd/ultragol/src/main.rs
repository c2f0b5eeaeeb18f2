//! # ULTRAGOL server
//!
//! Serves the single-page app and keeps the stream board tidy: every live
//! post is counted down and deleted when its hour is up, and a periodic
//! sweep catches whatever was missed.

use std::sync::Arc;

use anyhow::Context;
use configs::Settings;
use domains::{DocumentStore, SystemClock};
use services::{LifecycleConfig, LifecycleHost, Notifier};
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(feature = "db-sqlite")]
async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match settings.database_url() {
        Some(url) => {
            let store = storage_adapters::SqliteDocumentStore::new(url)
                .await
                .with_context(|| format!("opening database {url}"))?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("no database configured, posts live in memory only");
            Ok(Arc::new(storage_adapters::MemoryDocumentStore::new()))
        }
    }
}

#[cfg(not(feature = "db-sqlite"))]
async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn DocumentStore>> {
    if settings.database_url().is_some() {
        anyhow::bail!("a database URL is set but this build has no SQLite support");
    }
    Ok(Arc::new(storage_adapters::MemoryDocumentStore::new()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(settings.log_json);

    let store = open_store(&settings).await?;
    let lifecycle = LifecycleConfig {
        sweep_grace: settings.sweep_grace(),
        sweep_interval: settings.sweep_interval(),
        ..LifecycleConfig::default()
    };
    let _host = LifecycleHost::start(store, Arc::new(SystemClock), lifecycle, Notifier::default())
        .await
        .context("starting lifecycle host")?;

    let app = api_adapters::spa_router(&settings.static_dir);
    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(%addr, static_dir = %settings.static_dir.display(), "ULTRAGOL listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    Ok(())
}
