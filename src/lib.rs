//! Incremental HTTP/1.1 request parsing over raw TCP.
//!
//! Requests arrive in arbitrarily fragmented reads; [`http::Request::from_reader`]
//! accumulates them and drives a forward-only state machine until the request
//! line, headers, and `Content-Length` body are complete.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use http::{Handler, Request, Response, Server};
pub use lifecycle::Shutdown;
