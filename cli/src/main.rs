//! whois-mcp — WHOIS lookups as MCP tools.
//!
//! Two subcommands:
//! - `whois-mcp stdio` (default): STDIO transport for Claude Desktop and other STDIO-based MCP clients
//! - `whois-mcp serve`: Streamable HTTP MCP server

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use axum::Router;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use clap::{Parser, Subcommand};
use rmcp::ServiceExt;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt as TowerServiceExt;
use tracing_subscriber::EnvFilter;
use whois_mcp::{GatewayConfig, WhoisGateway, WhoisMcpServer};

const CONFIG_FILE: &str = "whois-mcp.toml";

/// whois-mcp — WHOIS domain, IP and ASN lookups as MCP tools.
#[derive(Parser)]
#[command(
    name = "whois-mcp",
    version,
    about = "whois-mcp — WHOIS domain, IP and ASN lookups as MCP tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a Streamable HTTP MCP server
    Serve {
        /// Path to whois-mcp.toml [default: ./whois-mcp.toml or ~/.config/whois-mcp/whois-mcp.toml]
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// HTTP port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Serve the tools over STDIO (for Claude Desktop, etc.)
    Stdio {
        /// Path to whois-mcp.toml [default: ./whois-mcp.toml or ~/.config/whois-mcp/whois-mcp.toml]
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the STDIO transport.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cancel = CancellationToken::new();

    // Ctrl-C handler — cancels the root token for graceful shutdown
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutting down whois-mcp...");
        cancel_for_signal.cancel();
    });

    let result = match cli.command.unwrap_or(Commands::Stdio { config: None }) {
        Commands::Serve { config, port, host } => run_serve(config, host, port, cancel).await,
        Commands::Stdio { config } => run_stdio(config, cancel).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "whois-mcp fatal error");
    }
    result
}

/// Load config and wrap a gateway in the MCP handler.
fn build_server(explicit_config: Option<PathBuf>) -> Result<WhoisMcpServer> {
    let config = match resolve_config(explicit_config) {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            GatewayConfig::load(&path)?
        }
        None => {
            tracing::info!("no config file found, using defaults");
            GatewayConfig::default()
        }
    };

    let gateway = WhoisGateway::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to build whois gateway: {}", e))?;
    Ok(WhoisMcpServer::new(gateway))
}

/// Start a Streamable HTTP MCP server.
///
/// Every session gets a clone of the same server, so all sessions share one
/// rate limiter.
async fn run_serve(
    config: Option<PathBuf>,
    host: String,
    port: u16,
    cancel: CancellationToken,
) -> Result<()> {
    let server = build_server(config)?;

    let session_manager = Arc::new(LocalSessionManager::default());
    let http_config = StreamableHttpServerConfig {
        cancellation_token: cancel.clone(),
        ..Default::default()
    };
    let server_for_factory = server.clone();
    let mcp_service = StreamableHttpService::new(
        move || Ok(server_for_factory.clone()),
        session_manager,
        http_config,
    );

    let app = Router::new().fallback(move |req: Request<axum::body::Body>| {
        let svc = mcp_service.clone();
        async move {
            match svc.oneshot(req).await {
                Ok(response) => response.into_response(),
                Err(e) => {
                    tracing::error!(error = ?e, "MCP HTTP service error");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(host = %host, port = %port, "whois-mcp HTTP server listening");
    tracing::info!("Connect your MCP client to http://{}:{}/mcp", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| anyhow::anyhow!("whois-mcp HTTP server error: {}", e))?;

    tracing::info!("whois-mcp HTTP server stopped");
    Ok(())
}

/// Serve the tools over stdin/stdout using rmcp's serve_with_ct.
async fn run_stdio(config: Option<PathBuf>, cancel: CancellationToken) -> Result<()> {
    let server = build_server(config)?;

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let running = server
        .serve_with_ct(transport, cancel.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize whois-mcp stdio transport: {:?}", e))?;

    tracing::info!("whois-mcp stdio transport initialized, waiting for messages");

    tokio::select! {
        result = running.waiting() => {
            match result {
                Ok(reason) => {
                    tracing::info!(?reason, "whois-mcp stdio transport completed");
                }
                Err(e) => {
                    return Err(anyhow::anyhow!("whois-mcp stdio transport error: {}", e));
                }
            }
        }
        _ = cancel.cancelled() => {
            tracing::info!("whois-mcp stdio transport cancelled");
        }
    }

    Ok(())
}

/// Resolve config file path: explicit flag → ./whois-mcp.toml →
/// ~/.config/whois-mcp/whois-mcp.toml. `None` means run on defaults.
fn resolve_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path);
    }

    let local = Path::new(CONFIG_FILE);
    if local.exists() {
        return Some(local.to_path_buf());
    }

    dirs::config_dir()
        .map(|dir| dir.join("whois-mcp").join(CONFIG_FILE))
        .filter(|path| path.exists())
}
