// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use dashboard_monitor::application::dashboard_repository::DashboardRepository;
use dashboard_monitor::application::logstash_node_service::LogstashNodeService;
use dashboard_monitor::infrastructure::config::load_app_config;
use dashboard_monitor::infrastructure::elasticsearch_repository::ElasticsearchRepository;
use dashboard_monitor::infrastructure::file_dashboard_repository::FileDashboardRepository;
use dashboard_monitor::infrastructure::memory_dashboard_repository::InMemoryDashboardRepository;
use dashboard_monitor::presentation::app_state::AppState;
use dashboard_monitor::presentation::router::create_router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_app_config()?;

    // Monitoring data source (infrastructure layer)
    let monitoring = Arc::new(ElasticsearchRepository::new(
        config.elasticsearch.host.clone(),
        config.elasticsearch.username.clone(),
        config.elasticsearch.password.clone(),
    ));

    let dashboard_repository: Arc<dyn DashboardRepository> = match &config.dashboards.storage_dir {
        Some(dir) => {
            tracing::info!("Storing dashboards in {}", dir.display());
            Arc::new(FileDashboardRepository::open(dir.clone()).await?)
        }
        None => {
            tracing::warn!("No dashboards.storage_dir configured, dashboards are kept in memory");
            Arc::new(InMemoryDashboardRepository::new())
        }
    };

    // Services (application layer)
    let logstash_node_service = LogstashNodeService::new(monitoring, config.monitoring.clone());

    let state = Arc::new(AppState {
        dashboard_repository,
        logstash_node_service,
    });

    // Responses are compressed in the handlers, so no CompressionLayer here
    let router = create_router(state);

    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid server.bind_addr {:?}", config.server.bind_addr))?;
    tracing::info!("Starting dashboard-monitor on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
