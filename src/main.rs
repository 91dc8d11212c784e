use anyhow::Result;
use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sequential_thinking_mcp::{EngineConfig, ThinkingServer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting sequential-thinking MCP server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = EngineConfig::from_env()?;
    info!(
        "Engine configuration: max_nodes_per_tree={}, max_tracked_sessions={}, cleanup_interval_ms={}",
        config.max_nodes_per_tree, config.max_tracked_sessions, config.cleanup_interval_ms
    );

    let cleanup_interval = config.cleanup_interval();
    let server = ThinkingServer::new(config);
    info!("reasoning engine initialized");

    let processor = server.processor();
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let cleanup_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    processor.cleanup();
                }
                _ = shutdown_rx.changed() => {
                    break;
                }
            }
        }
    });
    info!("periodic cleanup task started");

    let transport = (stdin(), stdout());
    info!("starting MCP server on stdio transport");
    let service = server.serve(transport).await?;

    service.waiting().await?;

    let _ = shutdown_tx.send(true);
    cleanup_task.await.ok();

    Ok(())
}
