use std::sync::Arc;

use backend::config::{AppConfig, AuthConfig, StorageConfig};
use backend::identity::{FirebaseVerifier, IdentityVerifier, SharedSecretVerifier};
use backend::store::{MemoryTaskStore, RedisTaskStore, TaskStore};
use backend::{router, AppState};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,planner_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "configuration error");
            std::process::exit(1);
        }
    };
    tracing::info!(
        environment = ?config.environment,
        storage = config.storage.mode(),
        auth = ?config.auth,
        "configuration loaded"
    );

    let store: Arc<dyn TaskStore> = match &config.storage {
        StorageConfig::Redis { url } => match RedisTaskStore::connect(url).await {
            Ok(store) => {
                tracing::info!("connected to Redis");
                Arc::new(store)
            }
            Err(error) => {
                tracing::error!(%error, "failed to connect to Redis");
                std::process::exit(1);
            }
        },
        StorageConfig::Memory => {
            tracing::warn!("using the in-memory store; tasks are lost on restart");
            Arc::new(MemoryTaskStore::new())
        }
    };

    let verifier: Arc<dyn IdentityVerifier> = match &config.auth {
        AuthConfig::Firebase { project_id } => Arc::new(FirebaseVerifier::new(project_id.clone())),
        AuthConfig::SharedSecret { secret } => Arc::new(SharedSecretVerifier::new(secret)),
    };

    let address = format!("{}:{}", config.host, config.port);
    let app = router(AppState::new(store, verifier, config));

    let listener = TcpListener::bind(&address).await?;
    tracing::info!("server running on http://{address}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
