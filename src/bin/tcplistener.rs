//! Accepts connections one at a time and prints each parsed request.
//!
//! Handy with `curl` or `nc` for watching the parser react to real traffic.

use std::io::Write;

use clap::Parser;
use tokio::net::TcpListener;

use http_from_tcp::config::ParserConfig;
use http_from_tcp::observability::logging;
use http_from_tcp::Request;

#[derive(Parser)]
#[command(name = "tcplistener")]
#[command(about = "Print HTTP requests received over TCP", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:42069")]
    bind: String,

    /// Starting parser buffer size in bytes.
    #[arg(long, default_value_t = ParserConfig::default().initial_buffer_size)]
    buffer_size: usize,
}

fn render(request: &Request) -> String {
    let mut out = String::new();
    if let Some(line) = request.request_line() {
        out.push_str("Request line:\n");
        out.push_str(&format!("- Method: {}\n", line.method()));
        out.push_str(&format!("- Target: {}\n", line.request_target()));
        out.push_str(&format!("- Version: {}\n", line.http_version()));
    }
    out.push_str("Headers:\n");
    for (key, value) in request.headers().iter() {
        out.push_str(&format!("- {}: {}\n", key, value));
    }
    out.push_str("Body:\n");
    out.push_str(&String::from_utf8_lossy(request.body()));
    out.push('\n');
    out
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging("info");

    let parser = ParserConfig {
        initial_buffer_size: cli.buffer_size.max(1),
        ..ParserConfig::default()
    };

    let listener = TcpListener::bind(&cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening");

    loop {
        let (mut stream, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!(error = %e, "Error accepting connection");
                continue;
            }
        };
        tracing::info!(peer_addr = %peer_addr, "Connection accepted");

        match Request::from_reader(&mut stream, &parser).await {
            Ok(request) => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(render(&request).as_bytes())?;
                stdout.flush()?;
            }
            Err(e) => tracing::warn!(peer_addr = %peer_addr, error = %e, "Failed to parse request"),
        }
        tracing::info!(peer_addr = %peer_addr, "Connection closed");
    }
}
