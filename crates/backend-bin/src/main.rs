use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backend_lib::{
    auth::hasher_for,
    config::{LogFormat, Settings, StorageBackend, DEFAULT_CONFIG_FILE},
    router::create_router,
    seed::seed_demo_data,
    storage::{FlatFileStorage, MemoryStorage, SqliteStorage, Storage},
    AppState,
};
use clap::{Parser, ValueEnum};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Session-cookie authentication demo server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path of the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Address to listen on, overrides `bind_addr`
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Storage backend, overrides `storage.backend`
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Memory,
    FlatFile,
    Sqlite,
}

impl From<BackendArg> for StorageBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Memory => StorageBackend::Memory,
            BackendArg::FlatFile => StorageBackend::FlatFile,
            BackendArg::Sqlite => StorageBackend::Sqlite,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }
    if let Some(backend) = cli.backend {
        settings.storage.backend = backend.into();
    }
    settings.validate()?;

    init_tracing(&settings);

    match settings.storage.backend {
        StorageBackend::Memory => serve(MemoryStorage::new(), settings).await,
        StorageBackend::FlatFile => {
            let storage = FlatFileStorage::new(&settings.storage.data_dir)?;
            serve(storage, settings).await
        },
        StorageBackend::Sqlite => {
            let storage = SqliteStorage::connect(&settings.storage.database_url).await?;
            serve(storage, settings).await
        },
    }
}

fn init_tracing(settings: &Settings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_lowercase()));

    match settings.log_format {
        LogFormat::Compact => tracing_subscriber::fmt().with_env_filter(filter).compact().init(),
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
    }
}

async fn serve<S: Storage>(storage: S, settings: Settings) -> anyhow::Result<()> {
    if settings.seed_demo_data {
        let hasher = hasher_for(settings.password.scheme, settings.password.scrypt_log_n)?;
        seed_demo_data(&storage, hasher.as_ref()).await?;
    }

    let addr = settings.bind_addr;
    let backend = settings.storage.backend;
    let cleanup_interval = settings.cleanup_interval();

    let state = Arc::new(AppState::new(storage, settings)?);
    let cleanup = state.sessions.spawn_cleanup_task(cleanup_interval);

    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, ?backend, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(cleanup) = cleanup {
        cleanup.abort();
    }
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("received ctrl-c, shutting down");
}
