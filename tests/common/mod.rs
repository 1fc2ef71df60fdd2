//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use http_from_tcp::http::response::StatusCode;
use http_from_tcp::{Request, Response, Server, ServerConfig, Shutdown};

/// A running server whose handler forwards every parsed request to `requests`.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub requests: mpsc::UnboundedReceiver<Request>,
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    /// Next request seen by the handler.
    pub async fn next_request(&mut self) -> Request {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .expect("handler was not called in time")
            .expect("server dropped the request channel")
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.task).await;
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.shutdown_grace_secs = 1;
    config
}

pub async fn start_server(config: ServerConfig) -> TestServer {
    let (tx, requests) = mpsc::unbounded_channel();
    let server = Server::bind(&config, move |req: &Request| {
        let _ = tx.send(req.clone());
        Response::new(StatusCode::Ok, "ok")
    })
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.serve(shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        requests,
        task,
    }
}

/// Write `raw` in pieces of `chunk` bytes with a pause between them, then
/// read the whole response.
pub async fn send_in_chunks(addr: SocketAddr, raw: &[u8], chunk: usize) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.set_nodelay(true).unwrap();
    for piece in raw.chunks(chunk) {
        stream.write_all(piece).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    let mut out = Vec::new();
    let _ = stream.read_to_end(&mut out).await;
    out
}

pub async fn send(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    send_in_chunks(addr, raw, raw.len().max(1)).await
}

/// Parse `raw` as if it arrived in one read.
pub fn parse_whole(raw: &[u8]) -> Request {
    let mut req = Request::new();
    let consumed = req.parse(raw).unwrap();
    assert!(req.is_done(), "request incomplete after {consumed} bytes");
    req
}

pub fn status_line(response: &[u8]) -> String {
    let text = String::from_utf8_lossy(response);
    text.split("\r\n").next().unwrap_or_default().to_string()
}
