//! Response serialization.
//!
//! # Responsibilities
//! - Render the status line for the supported status codes
//! - Render header fields followed by the blank separator line
//! - Enforce status line → headers → body write order
//!
//! # Design Decisions
//! - Default headers always close the connection (one request per connection)
//! - Header emission follows the `Headers` insertion order

use std::fmt;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::Headers;

/// Status codes this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    BadRequest,
    InternalServerError,
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// `HTTP/1.1 <code> <reason>\r\n`
    pub fn status_line(&self) -> String {
        format!("HTTP/1.1 {} {}\r\n", self.as_u16(), self.reason_phrase())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Headers sent with every response unless the handler overrides them.
pub fn default_headers(content_len: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("Content-Length", &content_len.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/plain");
    headers
}

/// Serialize a header block, including the terminating blank line.
pub fn render_headers(headers: &Headers) -> String {
    let mut out = String::new();
    for (key, value) in headers.iter() {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out
}

/// Which part of the response the writer expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    StatusLine,
    Headers,
    Body,
}

/// Errors raised while writing a response.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot write {attempted:?} while expecting {expected:?}")]
    OutOfOrder {
        expected: WriterState,
        attempted: WriterState,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Writes one response onto a byte sink in protocol order.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    inner: W,
    state: WriterState,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            state: WriterState::StatusLine,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    fn check_order(&self, attempted: WriterState) -> Result<(), WriteError> {
        if self.state != attempted {
            return Err(WriteError::OutOfOrder {
                expected: self.state,
                attempted,
            });
        }
        Ok(())
    }

    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriteError> {
        self.check_order(WriterState::StatusLine)?;
        self.inner.write_all(status.status_line().as_bytes()).await?;
        self.state = WriterState::Headers;
        Ok(())
    }

    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), WriteError> {
        self.check_order(WriterState::Headers)?;
        self.inner.write_all(render_headers(headers).as_bytes()).await?;
        self.state = WriterState::Body;
        Ok(())
    }

    /// Write body bytes. May be called repeatedly once headers are sent.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<(), WriteError> {
        self.check_order(WriterState::Body)?;
        self.inner.write_all(body).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), WriteError> {
        self.inner.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// A complete response produced by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    /// Build a response with default headers sized to `body`.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            status,
            headers: default_headers(body.len()),
            body,
        }
    }

    /// Set or overwrite a header.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.replace(key, value);
        self
    }

    /// Plain-text error response carrying the reason phrase.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, format!("{}\n", status.reason_phrase()))
    }

    pub async fn write_to<W>(&self, sink: W) -> Result<(), WriteError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut writer = ResponseWriter::new(sink);
        writer.write_status_line(self.status).await?;
        writer.write_headers(&self.headers).await?;
        writer.write_body(&self.body).await?;
        writer.flush().await
    }
}
