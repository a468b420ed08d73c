use std::sync::Arc;

use todo_list::config::AppConfig;
use todo_list::server;
use todo_list::store::LibSqlBackend;
use todo_list::todos::TodoService;

#[tokio::main]
async fn main() -> todo_list::error::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    eprintln!("📝 todo-list v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Level: {}", config.app_level);
    eprintln!("   Database: {}", config.database.path);
    eprintln!("   API: http://{}/api/v1/todo\n", config.server.addr);

    // ── Database ─────────────────────────────────────────────────────────
    let backend = LibSqlBackend::from_config(&config.database).await?;

    // ── HTTP ─────────────────────────────────────────────────────────────
    let service = Arc::new(
        TodoService::new(Arc::new(backend)).with_empty_list_policy(config.empty_list),
    );
    let app = server::app(service, &config.server);

    let listener = tokio::net::TcpListener::bind(config.server.addr).await?;
    tracing::info!(addr = %config.server.addr, "HTTP server started");

    server::serve(
        listener,
        app,
        server::shutdown_signal(),
        config.server.shutdown_grace,
    )
    .await?;

    tracing::info!("Server gracefully closed");
    Ok(())
}
