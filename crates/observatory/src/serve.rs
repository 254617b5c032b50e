use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use observatory_transcripts::{TranscriptStore, TranscriptWatcher};

use crate::api;
use crate::config::Settings;

pub async fn handle_serve_command(settings: Settings, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(settings.port);
    let store = Arc::new(TranscriptStore::with_config(settings.store));

    // Push notifications are optional; polling clients work without them
    let watcher = match TranscriptWatcher::with_dir(store.projects_dir()) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!(
                dir = %store.projects_dir().display(),
                "Change stream disabled: {:#}",
                e
            );
            TranscriptWatcher::disabled()
        }
    };

    let router = api::create_router(store.clone(), Arc::new(watcher), settings.stats_cache);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;

    tracing::info!(
        %addr,
        projects_dir = %store.projects_dir().display(),
        "Observatory API listening"
    );

    eprintln!();
    eprintln!(
        "  {} {}",
        "->".bright_green(),
        format!("Serving http://localhost:{}", port).bold()
    );
    eprintln!("  {} Press {} to stop", "->".dimmed(), "Ctrl+C".bold());
    eprintln!();

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    eprintln!("\nShutting down...");
}
