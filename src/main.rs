//! wear-tile-mcp: MCP server for Wear OS tile development over adb

use anyhow::Result;
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use wear_tile_mcp::mcp::TileBridgeServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Respects RUST_LOG; default level info.
    // Logs go to stderr so stdout stays clean for the MCP channel.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wear_tile_mcp=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .init();

    info!("wear-tile-mcp server starting...");
    info!("Protocol: Model Context Protocol (MCP)");
    info!("Transport: stdio");

    let server = TileBridgeServer::from_env();

    // Serve until the driving client disconnects. A failure to bind the
    // channel is fatal; there is no partial-service mode.
    let service = server.serve(stdio()).await?;

    info!("wear-tile-mcp server initialized successfully");
    info!("Waiting for MCP requests...");

    service.waiting().await?;

    info!("wear-tile-mcp server shutting down");
    Ok(())
}
