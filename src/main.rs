//! Landmark verification HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use landmark::artifact::DirectorySource;
use landmark::config::Config;
use landmark::embedding::{HttpEmbedder, ImageEmbedder, StubEmbedder};
use landmark::gateway::{HandlerState, create_router_with_state};
use landmark::store::StoreHandle;
use landmark::verify::{LandmarkVerifier, VerificationEngine};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check().await);
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;
    let engine_config = config.engine_config()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        references = %config.references_path.display(),
        threshold = engine_config.similarity_threshold(),
        min_match_count = engine_config.min_match_count(),
        "Landmark verifier starting"
    );

    let source = Arc::new(DirectorySource::new(config.references_path.clone()));
    let store = StoreHandle::load(source, config.embedding_dim).await?;

    let embedder: Arc<dyn ImageEmbedder> = match &config.embedder_url {
        Some(url) => Arc::new(HttpEmbedder::new(url.clone(), config.embedding_dim)),
        None => {
            tracing::warn!("No LANDMARK_EMBEDDER_URL configured, running embedder in stub mode");
            Arc::new(StubEmbedder::new(config.embedding_dim))
        }
    };

    let reload_task = config
        .reload_interval
        .map(|interval| store.spawn_reload_task(interval));

    let verifier = LandmarkVerifier::new(
        embedder,
        store,
        VerificationEngine::new(engine_config),
        config.embed_timeout,
    );
    let state = HandlerState::new(verifier).with_max_image_bytes(config.max_image_bytes);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = reload_task {
        task.abort();
    }

    tracing::info!("Landmark verifier shutdown complete");
    Ok(())
}

/// Checks `/healthz` on the local port. Runs on the already started runtime.
async fn run_health_check() -> i32 {
    let port = std::env::var("LANDMARK_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(client) = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
    else {
        return 1;
    };

    match client.get(&url).send().await {
        Ok(res) if res.status().is_success() => 0,
        _ => 1,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
