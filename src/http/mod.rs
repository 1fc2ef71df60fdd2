//! HTTP/1.1 protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP stream
//!     → buffer.rs (accumulate partial reads, compact after parsing)
//!     → request.rs (state machine: request line → headers → body)
//!         → request_line.rs / headers.rs / body.rs
//!     → handler.rs (user handler produces a Response)
//!     → response.rs (status line, headers, body onto the stream)
//! ```
//!
//! # Design Decisions
//! - Parsing never blocks on a partial line; it reports zero progress instead
//! - Any parse error is terminal for the connection
//! - One request per connection, always `Connection: close`

pub mod body;
pub mod buffer;
pub mod error;
pub mod handler;
pub mod headers;
pub mod request;
pub mod request_line;
pub mod response;
pub mod server;

pub use error::ParseError;
pub use handler::Handler;
pub use headers::Headers;
pub use request::{ParserState, Request};
pub use request_line::{Method, RequestLine};
pub use response::{Response, ResponseWriter, StatusCode};
pub use server::Server;

pub(crate) const CRLF: &[u8] = b"\r\n";

/// Offset of the first CRLF in `data`.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}
