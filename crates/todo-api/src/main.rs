//! todo-api バイナリのエントリポイント
//! 設定に従ってストレージを選び、HTTP サーバを起動します。

use anyhow::Context;
use infrastructure::{
    DynamoDbClient, DynamoTodoRepository, InMemoryTodoRepository, OwnedTodoStore, RetryConfig,
    TodoRepository,
};
use shared::{init_tracing, Config, StorageBackend, TokenVerifier};
use std::sync::Arc;
use todo_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing().context("failed to initialize tracing")?;

    let config = Config::from_env().context("invalid configuration")?;

    let repository: Arc<dyn TodoRepository> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryTodoRepository::new()),
        StorageBackend::DynamoDb => {
            let db = DynamoDbClient::new(&config).await;
            tracing::info!(table = %db.table_name(), "using DynamoDB storage");
            Arc::new(DynamoTodoRepository::new(db, RetryConfig::from(&config)))
        }
    };

    let state = AppState::new(
        OwnedTodoStore::new(repository),
        TokenVerifier::new(&config.jwt_secret),
    )
    .context("failed to load templates")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, environment = %config.environment, "server starting");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
