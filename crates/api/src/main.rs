//! API server entry point.

use api::AppState;
use api::config::{Config, LogFormat};
use identity::{HttpIdentityConfig, HttpIdentityProvider, IdentityProvider, InMemoryIdentityProvider};
use item_store::{InMemoryItemStore, ItemStore, PostgresItemStore};
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::Url;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
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
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn identity_config(config: &Config, project_id: &str) -> HttpIdentityConfig {
    HttpIdentityConfig {
        base_url: Url::parse(&config.identity_base_url).expect("invalid IDENTITY_BASE_URL"),
        project_id: project_id.to_string(),
        api_key: config.identity_api_key.clone(),
        access_token: config.identity_access_token.clone(),
        timeout: config.identity_timeout,
    }
}

fn in_memory_identity(config: &Config) -> InMemoryIdentityProvider {
    let provider = InMemoryIdentityProvider::new();
    match config.identity_dev_token {
        Some(ref token) => provider.register_token(token.as_str(), "dev"),
        None => tracing::warn!(
            "in-memory identity provider has no IDENTITY_DEV_TOKEN, mutating routes will reject every request"
        ),
    }
    provider
}

async fn run<S, I>(config: Config, store: S, identity: I, metrics_handle: PrometheusHandle)
where
    S: ItemStore + 'static,
    I: IdentityProvider + 'static,
{
    let app = api::create_app(AppState::new(store, identity), metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            tracing::error!(?result, "server stopped unexpectedly");
            return;
        }
        () = shutdown_signal() => {}
    }

    let _ = stop_tx.send(());
    match tokio::time::timeout(config.shutdown_timeout, server).await {
        Ok(Ok(Ok(()))) => tracing::info!("server shut down gracefully"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => tracing::error!(error = %e, "server task failed"),
        Err(_) => tracing::warn!(
            timeout_secs = config.shutdown_timeout.as_secs(),
            "graceful shutdown timed out, dropping open connections"
        ),
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Connect storage and run migrations
    let store = match config.database_url {
        Some(ref url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let store = PostgresItemStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using Postgres item store");
            Some(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, items are kept in memory");
            None
        }
    };

    // 4. Pick the identity provider and serve
    let http_identity = config.identity_project_id.as_deref().map(|project_id| {
        tracing::info!(%project_id, "using HTTP identity provider");
        HttpIdentityProvider::new(identity_config(&config, project_id))
            .expect("failed to build identity provider client")
    });

    match (store, http_identity) {
        (Some(store), Some(identity)) => run(config, store, identity, metrics_handle).await,
        (Some(store), None) => {
            let identity = in_memory_identity(&config);
            run(config, store, identity, metrics_handle).await
        }
        (None, Some(identity)) => {
            run(config, InMemoryItemStore::new(), identity, metrics_handle).await
        }
        (None, None) => {
            let identity = in_memory_identity(&config);
            run(config, InMemoryItemStore::new(), identity, metrics_handle).await
        }
    }
}
