//! Incremental request state machine.
//!
//! # Responsibilities
//! - Own the `Request` under construction and its parse state
//! - Dispatch each byte window to the sub-parser for the current state
//! - Drive the read / parse / compact loop against an async byte source
//!
//! # Design Decisions
//! - States only move forward: Initialized → ParsingHeaders → ParsingBody → Done
//! - A dispatch that consumes zero bytes means "need more input", never an error
//! - End of stream before `Done` is an error; bytes after `Done` are ignored

use tokio::io::AsyncRead;

use crate::config::ParserConfig;
use crate::http::body::{append_body, content_length};
use crate::http::buffer::ByteAccumulator;
use crate::http::error::ParseError;
use crate::http::headers::{HeaderStatus, Headers};
use crate::http::request_line::{parse_request_line, RequestLine};

/// Parse progress of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParserState {
    Initialized,
    ParsingHeaders,
    ParsingBody,
    Done,
}

impl ParserState {
    /// The only state reachable from this one.
    pub fn next(self) -> Option<ParserState> {
        match self {
            ParserState::Initialized => Some(ParserState::ParsingHeaders),
            ParserState::ParsingHeaders => Some(ParserState::ParsingBody),
            ParserState::ParsingBody => Some(ParserState::Done),
            ParserState::Done => None,
        }
    }
}

/// An HTTP/1.1 request, possibly still being parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    request_line: Option<RequestLine>,
    headers: Headers,
    body: Vec<u8>,
    state: ParserState,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    pub fn new() -> Self {
        Self {
            request_line: None,
            headers: Headers::new(),
            body: Vec::new(),
            state: ParserState::Initialized,
        }
    }

    /// `None` until the start line has been parsed.
    pub fn request_line(&self) -> Option<&RequestLine> {
        self.request_line.as_ref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Read a complete request from `reader`.
    ///
    /// Each iteration performs one read, parses as much as possible, and
    /// compacts the buffer by the consumed count, so reads of any size
    /// (down to a single byte) produce the same request.
    pub async fn from_reader<R>(reader: &mut R, config: &ParserConfig) -> Result<Request, ParseError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut buf = ByteAccumulator::new(config.initial_buffer_size, config.max_buffer_size);
        let mut request = Request::new();

        while !request.is_done() {
            let n = buf.read_from(reader).await?;
            if n == 0 {
                return Err(ParseError::Incomplete {
                    state: request.state,
                    buffered: buf.len(),
                });
            }

            let consumed = request.parse(buf.filled())?;
            buf.consume(consumed);
        }

        Ok(request)
    }

    /// Consume as much of `data` as the current state allows.
    ///
    /// Returns the number of bytes consumed. Stops at `Done` or when a
    /// sub-parser needs more input.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let mut total = 0;
        while !self.is_done() {
            let n = self.parse_single(&data[total..])?;
            total += n;
            if n == 0 {
                break;
            }
        }
        Ok(total)
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParserState::Initialized => {
                let Some((line, n)) = parse_request_line(data)? else {
                    return Ok(0);
                };
                tracing::trace!(method = %line.method(), target = line.request_target(), "Parsed request line");
                self.request_line = Some(line);
                self.advance()?;
                Ok(n)
            }
            ParserState::ParsingHeaders => match self.headers.parse(data)? {
                HeaderStatus::NeedMore => Ok(0),
                HeaderStatus::Field { consumed } => Ok(consumed),
                HeaderStatus::Done { consumed } => {
                    self.advance()?;
                    Ok(consumed)
                }
            },
            ParserState::ParsingBody => {
                let Some(declared) = content_length(&self.headers)? else {
                    self.advance()?;
                    return Ok(0);
                };
                if append_body(&mut self.body, declared, data)? {
                    self.advance()?;
                }
                Ok(data.len())
            }
            ParserState::Done => Err(ParseError::Internal("dispatch attempted in done state")),
        }
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.state = self
            .state
            .next()
            .ok_or(ParseError::Internal("no transition out of done state"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request_line::Method;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Yields at most `chunk` bytes per read.
    struct ChunkReader {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl ChunkReader {
        fn new(data: &[u8], chunk: usize) -> Self {
            Self {
                data: data.to_vec(),
                pos: 0,
                chunk,
            }
        }
    }

    impl AsyncRead for ChunkReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            let end = (this.pos + this.chunk).min(this.data.len());
            let n = (end - this.pos).min(buf.remaining());
            buf.put_slice(&this.data[this.pos..this.pos + n]);
            this.pos += n;
            Poll::Ready(Ok(()))
        }
    }

    /// Hands out `data` in one read, then fails every read after it.
    struct ResetAfterReader {
        data: Option<Vec<u8>>,
    }

    impl AsyncRead for ResetAfterReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.get_mut().data.take() {
                Some(data) => {
                    buf.put_slice(&data[..data.len().min(buf.remaining())]);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::from(io::ErrorKind::ConnectionReset))),
            }
        }
    }

    async fn parse_chunked(data: &[u8], chunk: usize) -> Result<Request, ParseError> {
        let mut reader = ChunkReader::new(data, chunk);
        Request::from_reader(&mut reader, &ParserConfig::default()).await
    }

    #[tokio::test]
    async fn good_get_request_line() {
        let req = parse_chunked(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n", 3)
            .await
            .unwrap();
        let line = req.request_line().unwrap();
        assert_eq!(line.method(), Method::Get);
        assert_eq!(line.request_target(), "/");
        assert_eq!(line.http_version(), "1.1");
        assert_eq!(req.headers().get("host"), Some("localhost"));
        assert_eq!(req.headers().len(), 1);
        assert!(req.body().is_empty());
        assert_eq!(req.state(), ParserState::Done);
    }

    #[tokio::test]
    async fn chunking_does_not_change_the_result() {
        let raw: &[u8] = b"POST /submit HTTP/1.1\r\n\
            Host: localhost:42069\r\n\
            User-Agent: curl/7.81.0\r\n\
            Accept: */*\r\n\
            X-Multi: one\r\n\
            x-multi: two\r\n\
            Content-Length: 13\r\n\
            \r\n\
            hello world!\n";
        let whole = parse_chunked(raw, raw.len()).await.unwrap();
        for chunk in 1..=raw.len() {
            let chunked = parse_chunked(raw, chunk).await.unwrap();
            assert_eq!(chunked, whole, "chunk size {chunk}");
        }
        assert_eq!(whole.body(), b"hello world!\n");
        assert_eq!(whole.headers().get("x-multi"), Some("one, two"));
    }

    #[tokio::test]
    async fn one_byte_reads_match_single_read() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let whole = parse_chunked(raw, raw.len()).await.unwrap();
        let bytewise = parse_chunked(raw, 1).await.unwrap();
        assert_eq!(whole, bytewise);
    }

    #[tokio::test]
    async fn body_of_declared_length() {
        let req = parse_chunked(b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello", 4)
            .await
            .unwrap();
        assert_eq!(req.body(), b"hello");
        assert_eq!(req.state(), ParserState::Done);
    }

    #[tokio::test]
    async fn zero_content_length_completes_without_body() {
        let req = parse_chunked(b"PUT /x HTTP/1.1\r\nContent-Length: 0\r\n\r\n", 2)
            .await
            .unwrap();
        assert!(req.body().is_empty());
        assert!(req.is_done());
    }

    #[tokio::test]
    async fn body_one_byte_too_long() {
        let err = parse_chunked(b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello!", 64)
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::BodyTooLong { declared: 5, received: 6 }));
    }

    #[tokio::test]
    async fn short_body_then_eof_is_incomplete() {
        let err = parse_chunked(b"GET / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhell", 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::Incomplete { state: ParserState::ParsingBody, .. }
        ));
    }

    #[tokio::test]
    async fn eof_inside_headers_is_incomplete() {
        let err = parse_chunked(b"GET / HTTP/1.1\r\nHost: loc", 5).await.unwrap_err();
        assert!(matches!(
            err,
            ParseError::Incomplete { state: ParserState::ParsingHeaders, buffered: 9 }
        ));
    }

    #[tokio::test]
    async fn body_without_content_length_is_ignored() {
        let req = parse_chunked(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\nstray", 64)
            .await
            .unwrap();
        assert!(req.body().is_empty());
        assert!(req.is_done());
    }

    #[tokio::test]
    async fn space_before_colon_fails_the_request() {
        let err = parse_chunked(b"GET / HTTP/1.1\r\nHost : localhost\r\n\r\n", 7)
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaderName(_)));
    }

    #[tokio::test]
    async fn http2_version_fails_the_request() {
        let err = parse_chunked(b"GET / HTTP/2.0\r\n\r\n", 1).await.unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion(_)));
    }

    #[tokio::test]
    async fn transport_error_is_reported_as_io() {
        let mut reader = ResetAfterReader {
            data: Some(b"GET / HT".to_vec()),
        };
        let err = Request::from_reader(&mut reader, &ParserConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(&err, ParseError::Io(e) if e.kind() == io::ErrorKind::ConnectionReset));
        assert!(!matches!(err, ParseError::Incomplete { .. }));
        assert_eq!(err.status_code(), None);
    }

    #[tokio::test]
    async fn trailing_space_on_request_line_is_accepted() {
        let req = parse_chunked(b"GET / HTTP/1.1 \r\n\r\n", 4).await.unwrap();
        assert_eq!(req.request_line().unwrap().request_target(), "/");
        assert_eq!(req.state(), ParserState::Done);
    }

    #[tokio::test]
    async fn malformed_content_length_fails_the_request() {
        let err = parse_chunked(b"POST / HTTP/1.1\r\nContent-Length: five\r\n\r\nhello", 64)
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::MalformedContentLength(_)));
    }

    #[tokio::test]
    async fn oversized_line_hits_buffer_limit() {
        let mut raw = b"GET /".to_vec();
        raw.extend(std::iter::repeat(b'a').take(64));
        raw.extend_from_slice(b" HTTP/1.1\r\n\r\n");

        let config = ParserConfig {
            initial_buffer_size: 8,
            max_buffer_size: 32,
        };
        let mut reader = ChunkReader::new(&raw, 8);
        let err = Request::from_reader(&mut reader, &config).await.unwrap_err();
        assert!(matches!(err, ParseError::RequestTooLarge { limit: 32 }));
    }

    #[test]
    fn state_never_moves_backwards() {
        let raw = b"POST /x HTTP/1.1\r\nA: 1\r\nContent-Length: 3\r\n\r\nabc";
        let mut req = Request::new();
        let mut buf = ByteAccumulator::new(8, 1024);
        let mut seen = vec![req.state()];

        for &byte in raw.iter() {
            buf.extend_from_slice(&[byte]).unwrap();
            let consumed = req.parse(buf.filled()).unwrap();
            buf.consume(consumed);
            seen.push(req.state());
        }

        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.first(), Some(&ParserState::Initialized));
        assert_eq!(seen.last(), Some(&ParserState::Done));
        assert!(seen.contains(&ParserState::ParsingHeaders));
        assert!(seen.contains(&ParserState::ParsingBody));
    }

    #[test]
    fn parse_in_done_state_consumes_nothing() {
        let mut req = Request::new();
        req.parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert!(req.is_done());
        assert_eq!(req.parse(b"more").unwrap(), 0);
    }

    #[test]
    fn dispatch_in_done_state_is_internal_error() {
        let mut req = Request::new();
        req.parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        let err = req.parse_single(b"x").unwrap_err();
        assert!(matches!(err, ParseError::Internal(_)));
    }

    #[test]
    fn transition_table_is_linear() {
        assert_eq!(ParserState::Initialized.next(), Some(ParserState::ParsingHeaders));
        assert_eq!(ParserState::ParsingHeaders.next(), Some(ParserState::ParsingBody));
        assert_eq!(ParserState::ParsingBody.next(), Some(ParserState::Done));
        assert_eq!(ParserState::Done.next(), None);
    }
}
