use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{error, info};

use sra_core::{
    build_registry,
    logging,
    mcp_server::{JsonRpcHandler, McpServer},
    transport::{HttpTransport, StdioTransport},
    Config, ConnectorError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// JSON-RPC over HTTP (`POST /mcp`, `GET /health`)
    Http,
}

#[derive(Debug, Parser)]
#[command(name = "sra_mcp", version, about = "AWS Security Reference Architecture MCP server")]
struct Args {
    #[arg(long, value_enum, env = "SRA_MCP_TRANSPORT", default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Listen address for the HTTP transport
    #[arg(long, env = "SRA_MCP_BIND")]
    bind: Option<String>,

    /// Overrides SRA_LOG_LEVEL / FASTMCP_LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum ServerError {
    #[error(transparent)]
    Connector(#[from] ConnectorError),
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    logging::init_stderr(&config.log_level);
    info!(
        transport = ?args.transport,
        github_token = config.github_token.is_some(),
        "Starting SRA MCP Server"
    );

    let registry = build_registry(&config).await?;
    let handler = JsonRpcHandler::new(McpServer::new(Arc::new(registry)));

    let result = match args.transport {
        Transport::Stdio => {
            info!("MCP Server ready, listening on stdio");
            StdioTransport::new(handler).run().await
        }
        Transport::Http => {
            let transport = HttpTransport::new(handler);
            tokio::select! {
                res = transport.run(&config.bind_addr) => res,
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    Ok(())
                }
            }
        }
    };

    if let Err(e) = result {
        error!("Transport error: {}", e);
        return Err(e.into());
    }
    Ok(())
}
