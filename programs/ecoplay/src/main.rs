use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecoplay::config::Args;
use ecoplay::consent::MemoryConsentStore;
use ecoplay::identity::MemoryIdentityProvider;
use ecoplay::sink::{JsonlRecordSink, MemoryRecordSink, RecordSink};
use ecoplay::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ecoplay={},tower_http={}", args.log_level, args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    args.validate().context("configuration error")?;

    let catalog = args.load_catalog();
    match &catalog {
        Ok(c) => info!(opponents = c.len(), "personality catalog loaded"),
        Err(e) => error!(error = %e, "personality catalog unavailable; trustor sessions disabled"),
    }

    let sink: Arc<dyn RecordSink> = match &args.records_path {
        Some(path) => {
            info!(path = %path.display(), "storing rounds as JSON lines");
            Arc::new(JsonlRecordSink::new(path))
        }
        None => {
            info!("storing rounds in memory");
            Arc::new(MemoryRecordSink::new())
        }
    };

    let state = AppState::new(
        Arc::new(MemoryIdentityProvider::new()),
        Arc::new(MemoryConsentStore::new()),
        sink,
        catalog,
    )
    .shared();

    let ttl = args.session_ttl();
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(ttl.min(Duration::from_secs(60)));
        loop {
            tick.tick().await;
            sweeper.prune_idle_sessions(ttl);
        }
    });

    let app = create_router(state, args.cors_origin()?);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    info!(listen = %args.listen, "ecoplay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("ecoplay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
