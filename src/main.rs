use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use event_finder_server::config::Config;
use event_finder_server::db::{Database, StorageOptions};
use event_finder_server::routes::create_routes;
use event_finder_server::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let db = Database::open(&StorageOptions::from_config(&config))
        .await
        .expect("Failed to open database");

    tracing::info!(
        full_text_search = db.has_search_index(),
        "DB initialized and ready"
    );

    let app = create_routes(AppState::new(db.clone()), &config);

    tracing::info!("🚀 {} running at http://{}", config.app_name, config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");

    db.close().await;
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
