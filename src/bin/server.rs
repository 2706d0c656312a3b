//! vocalis-server — HTTP text-to-speech service.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vocalis::config::Config;
use vocalis::registry::EngineRegistry;
use vocalis::server;
use vocalis::service::TtsService;
use vocalis::session::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    // Model download and session creation block; finish before the listener
    // is up so the service never accepts a request it cannot serve.
    let languages = config.languages.clone();
    let model_dir = config.model_dir.clone();
    let registry =
        tokio::task::spawn_blocking(move || EngineRegistry::bootstrap(&languages, &model_dir))
            .await
            .context("Registry bootstrap task failed")?;
    if !registry.any_loaded() {
        anyhow::bail!("No voice model could be loaded; nothing to serve");
    }

    let service = Arc::new(TtsService::new(
        Arc::new(registry),
        SessionStore::new(&config.sessions_dir),
        config.char_limit,
        config.request_timeout(),
    ));

    let app = server::router(service);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind {addr}"))?;
    info!("TTS service listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Engines hold no persistent state; dropping the registry on exit is the
/// teardown.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
