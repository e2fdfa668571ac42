//! Restaurant Contest Back binary entrypoint wiring REST, SSE and the storage backend.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use restaurant_contest_back::{
    config::{AppConfig, StoreBackend},
    dao::{
        competition_store::{
            CompetitionStore,
            memory::{MemoryCompetitionStore, MemorySeed},
        },
        models::UserEntity,
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState, clock::SystemClock},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::with_settings(
        Arc::new(SystemClock),
        config.mutation_timeout,
        config.sse_capacity,
    );

    spawn_storage_supervisor(app_state.clone(), &config)?;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the background task installing the configured store and tracking its health.
fn spawn_storage_supervisor(state: SharedState, config: &AppConfig) -> anyhow::Result<()> {
    match config.store {
        StoreBackend::Memory => {
            let store = match &config.memory_seed {
                Some(path) => {
                    let seed = MemorySeed::from_path(&path.to_string_lossy())
                        .context("loading memory store seed")?;
                    info!(path = %path.display(), "seeded in-memory store");
                    MemoryCompetitionStore::from_seed(seed)
                }
                None => {
                    warn!("in-memory store started without seed");
                    MemoryCompetitionStore::new(UserEntity {
                        id: Some(1),
                        pk: None,
                        username: "local".into(),
                        email: None,
                    })
                }
            };
            tokio::spawn(storage_supervisor::run(state, move || {
                let store = store.clone();
                async move { Ok::<_, StorageError>(Arc::new(store) as Arc<dyn CompetitionStore>) }
            }));
        }
        StoreBackend::Http => spawn_http_supervisor(state, config)?,
    }

    Ok(())
}

#[cfg(feature = "http-store")]
fn spawn_http_supervisor(state: SharedState, config: &AppConfig) -> anyhow::Result<()> {
    use restaurant_contest_back::dao::competition_store::http::{
        HttpCompetitionStore, HttpStoreConfig,
    };

    let mut store_config = HttpStoreConfig::new(config.api_url.clone());
    if let Some(token) = &config.api_token {
        store_config = store_config.with_token(token.clone());
    }
    if let Some(timeout) = config.mutation_timeout {
        store_config = store_config.with_request_timeout(timeout);
    }
    info!(api_root = %store_config.api_root(), "using HTTP store");

    tokio::spawn(storage_supervisor::run(state, move || {
        let store_config = store_config.clone();
        async move {
            let store = HttpCompetitionStore::connect(store_config).map_err(StorageError::from)?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn CompetitionStore>)
        }
    }));
    Ok(())
}

#[cfg(not(feature = "http-store"))]
fn spawn_http_supervisor(_state: SharedState, _config: &AppConfig) -> anyhow::Result<()> {
    anyhow::bail!("STORE_BACKEND=http requires the `http-store` feature")
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
