//! Body accumulation bounded by `Content-Length`.

use crate::http::error::ParseError;
use crate::http::headers::Headers;

/// Declared body length, or `None` when no `Content-Length` header is present.
pub fn content_length(headers: &Headers) -> Result<Option<usize>, ParseError> {
    let Some(raw) = headers.get("content-length") else {
        return Ok(None);
    };
    raw.parse::<usize>()
        .map(Some)
        .map_err(|_| ParseError::MalformedContentLength(raw.to_string()))
}

/// Append `data` to `body` and report whether the declared length is reached.
///
/// All of `data` is claimed. Overshooting `declared` is an error.
pub fn append_body(body: &mut Vec<u8>, declared: usize, data: &[u8]) -> Result<bool, ParseError> {
    body.extend_from_slice(data);
    if body.len() > declared {
        return Err(ParseError::BodyTooLong {
            declared,
            received: body.len(),
        });
    }
    Ok(body.len() == declared)
}
