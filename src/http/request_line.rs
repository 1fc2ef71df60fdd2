//! Request line recognition and validation.

use std::fmt;
use std::str::FromStr;

use crate::http::error::ParseError;
use crate::http::find_crlf;

/// The only protocol version accepted.
pub const HTTP_VERSION: &str = "1.1";

/// Supported request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(ParseError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed start line of a request. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: Method,
    request_target: String,
    http_version: String,
}

impl RequestLine {
    pub fn method(&self) -> Method {
        self.method
    }

    /// Target exactly as sent; never decoded.
    pub fn request_target(&self) -> &str {
        &self.request_target
    }

    /// Version number without the `HTTP/` prefix.
    pub fn http_version(&self) -> &str {
        &self.http_version
    }
}

impl FromStr for RequestLine {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split(' ').collect();
        let [method, target, protocol, ..] = parts[..] else {
            return Err(ParseError::MalformedRequestLine(line.to_string()));
        };

        let method = method.parse::<Method>()?;

        let Some((scheme, version)) = protocol.split_once('/') else {
            return Err(ParseError::MalformedRequestLine(line.to_string()));
        };
        if scheme != "HTTP" || version != HTTP_VERSION {
            return Err(ParseError::UnsupportedVersion(protocol.to_string()));
        }

        Ok(RequestLine {
            method,
            request_target: target.to_string(),
            http_version: version.to_string(),
        })
    }
}

/// Parse a request line from the front of `data`.
///
/// Returns `Ok(None)` until a full CRLF-terminated line is buffered. On
/// success the count includes the CRLF.
pub fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(idx) = find_crlf(data) else {
        return Ok(None);
    };
    let line = std::str::from_utf8(&data[..idx])
        .map_err(|_| ParseError::MalformedRequestLine(String::from_utf8_lossy(&data[..idx]).into_owned()))?;
    let request_line = line.parse::<RequestLine>()?;
    Ok(Some((request_line, idx + 2)))
}
