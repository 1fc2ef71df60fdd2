//! http-from-tcp server.
//!
//! ```text
//!   client bytes ─▶ net::listener ─▶ http::request (state machine) ─▶ handler
//!                                                                       │
//!   client ◀──────────────────────── http::response ◀───────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use http_from_tcp::config::{load_config, validate_config, ConfigError, ServerConfig};
use http_from_tcp::http::handler::empty_ok;
use http_from_tcp::lifecycle::signals::spawn_signal_listener;
use http_from_tcp::observability::{logging, metrics};
use http_from_tcp::{Server, Shutdown};

#[derive(Parser)]
#[command(name = "http-from-tcp")]
#[command(about = "Minimal HTTP/1.1 server built on an incremental request parser", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override observability.log_level.
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Cli {
    fn resolve_config(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("http-from-tcp v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        initial_buffer_size = config.parser.initial_buffer_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = Server::bind(&config, empty_ok).await?;
    tracing::info!(address = %server.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    server.serve(receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
