//! Request parsing error taxonomy.
//!
//! Every variant is terminal for the connection it was raised on. "Need more
//! data" is never an error: sub-parsers report it by consuming zero bytes.

use thiserror::Error;

use crate::http::request::ParserState;
use crate::http::response::StatusCode;

/// Errors raised while reconstructing a request from a byte stream.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Request line does not split into exactly three fields, or the
    /// protocol field has no `/`.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// Method outside GET, POST, PUT, DELETE.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Protocol is not `HTTP/1.1`.
    #[error("unsupported HTTP version: {0}")]
    UnsupportedVersion(String),

    /// Space before the colon, embedded space, or missing colon.
    #[error("malformed header name: {0:?}")]
    MalformedHeaderName(String),

    /// Key contains a character outside the token grammar.
    #[error("invalid character in header key: {0:?}")]
    InvalidHeaderKey(String),

    /// Content-Length is not a non-negative integer.
    #[error("malformed content-length: {0:?}")]
    MalformedContentLength(String),

    /// More body bytes arrived than Content-Length declared.
    #[error("body of {received} bytes exceeds content-length {declared}")]
    BodyTooLong { declared: usize, received: usize },

    /// A single line outgrew the accumulation buffer limit.
    #[error("request line or header exceeds buffer limit of {limit} bytes")]
    RequestTooLarge { limit: usize },

    /// End of stream before the request was complete.
    #[error("incomplete request: end of stream in state {state:?} with {buffered} unparsed bytes")]
    Incomplete { state: ParserState, buffered: usize },

    /// Parser was driven in a way that should be impossible.
    #[error("internal parser error: {0}")]
    Internal(&'static str),

    /// Transport failure other than a clean end of stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Status to answer with before closing, if the peer can still be told.
    ///
    /// Incomplete requests and transport errors get no response: the peer
    /// has either gone away or the stream is broken.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ParseError::MalformedRequestLine(_)
            | ParseError::UnsupportedMethod(_)
            | ParseError::UnsupportedVersion(_)
            | ParseError::MalformedHeaderName(_)
            | ParseError::InvalidHeaderKey(_)
            | ParseError::MalformedContentLength(_)
            | ParseError::BodyTooLong { .. }
            | ParseError::RequestTooLarge { .. } => Some(StatusCode::BadRequest),
            ParseError::Internal(_) => Some(StatusCode::InternalServerError),
            ParseError::Incomplete { .. } | ParseError::Io(_) => None,
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MalformedRequestLine(_) => "malformed_request_line",
            ParseError::UnsupportedMethod(_) => "unsupported_method",
            ParseError::UnsupportedVersion(_) => "unsupported_version",
            ParseError::MalformedHeaderName(_) => "malformed_header_name",
            ParseError::InvalidHeaderKey(_) => "invalid_header_key",
            ParseError::MalformedContentLength(_) => "malformed_content_length",
            ParseError::BodyTooLong { .. } => "body_too_long",
            ParseError::RequestTooLarge { .. } => "request_too_large",
            ParseError::Incomplete { .. } => "incomplete",
            ParseError::Internal(_) => "internal",
            ParseError::Io(_) => "io",
        }
    }
}
