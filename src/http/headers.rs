//! Header storage and field-line parsing.
//!
//! # Responsibilities
//! - Store header fields under lower-cased keys, folding repeats with `", "`
//! - Parse one `name: value` line per call from a partial byte window
//! - Detect the blank line that ends the header section
//!
//! # Design Decisions
//! - Entries keep first-insertion order with a lookup index, so response
//!   emission is deterministic
//! - Keys are validated against the RFC 7230 token grammar
//! - Values are trimmed and lower-cased on parse, not on `set`

use std::collections::HashMap;

use crate::http::error::ParseError;
use crate::http::find_crlf;

/// Result of feeding the header parser one window of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStatus {
    /// No complete line is buffered yet.
    NeedMore,
    /// One field line of `consumed` bytes (including CRLF) was stored.
    Field { consumed: usize },
    /// The terminating blank line was consumed.
    Done { consumed: usize },
}

impl HeaderStatus {
    pub fn consumed(&self) -> usize {
        match self {
            HeaderStatus::NeedMore => 0,
            HeaderStatus::Field { consumed } | HeaderStatus::Done { consumed } => *consumed,
        }
    }
}

/// Case-insensitive header map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by key, ignoring case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(&key.to_ascii_lowercase())
            .map(|&i| self.entries[i].1.as_str())
    }

    /// Insert a value, appending to any existing value with `", "`.
    pub fn set(&mut self, key: &str, value: &str) {
        let key = key.to_ascii_lowercase();
        match self.index.get(&key) {
            Some(&i) => {
                let existing = &mut self.entries[i].1;
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value.to_string()));
            }
        }
    }

    /// Insert a value, overwriting any existing one.
    pub fn replace(&mut self, key: &str, value: &str) {
        let key = key.to_ascii_lowercase();
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value.to_string(),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value.to_string()));
            }
        }
    }

    /// Remove a key and return its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let i = self.index.remove(&key.to_ascii_lowercase())?;
        let (_, value) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Iterate `(key, value)` pairs in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse at most one header line from the front of `data`.
    pub fn parse(&mut self, data: &[u8]) -> Result<HeaderStatus, ParseError> {
        let Some(idx) = find_crlf(data) else {
            return Ok(HeaderStatus::NeedMore);
        };
        if idx == 0 {
            return Ok(HeaderStatus::Done { consumed: 2 });
        }

        let line = &data[..idx];
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            return Err(ParseError::MalformedHeaderName(lossy(line)));
        };
        let (raw_key, raw_value) = (&line[..colon], &line[colon + 1..]);

        // Rejects "Host : x" and multi-token names such as "X Custom: y".
        if raw_key.last() == Some(&b' ') || raw_key.contains(&b' ') {
            return Err(ParseError::MalformedHeaderName(lossy(raw_key)));
        }

        let key = lossy(raw_key).trim().to_ascii_lowercase();
        if key.is_empty() || !key.bytes().all(is_token_char) {
            return Err(ParseError::InvalidHeaderKey(key));
        }

        let value = lossy(raw_value).trim().to_lowercase();
        self.set(&key, &value);

        Ok(HeaderStatus::Field { consumed: idx + 2 })
    }
}

/// RFC 7230 `tchar`.
pub fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_single_header() {
        let mut headers = Headers::new();
        let data = b"Host: localhost:42069\r\n\r\n";
        let status = headers.parse(data).unwrap();
        assert_eq!(status, HeaderStatus::Field { consumed: 23 });
        assert_eq!(headers.get("host"), Some("localhost:42069"));
        assert_eq!(headers.get("HOST"), Some("localhost:42069"));

        let status = headers.parse(&data[23..]).unwrap();
        assert_eq!(status, HeaderStatus::Done { consumed: 2 });
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let mut headers = Headers::new();
        let status = headers.parse(b"Host:    localhost:42069    \r\n\r\n").unwrap();
        assert_eq!(status.consumed(), 30);
        assert_eq!(headers.get("host"), Some("localhost:42069"));
    }

    #[test]
    fn values_are_lower_cased() {
        let mut headers = Headers::new();
        headers.parse(b"Content-Type: Text/PLAIN\r\n").unwrap();
        assert_eq!(headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn repeated_keys_fold_in_arrival_order() {
        let mut headers = Headers::new();
        headers.parse(b"Set-Person: lane-loves-go\r\n").unwrap();
        headers.parse(b"set-person: prime-loves-zig\r\n").unwrap();
        headers.parse(b"SET-PERSON: tj-loves-ocaml\r\n").unwrap();
        assert_eq!(
            headers.get("set-person"),
            Some("lane-loves-go, prime-loves-zig, tj-loves-ocaml")
        );
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn incomplete_line_needs_more() {
        let mut headers = Headers::new();
        assert_eq!(headers.parse(b"Host: local").unwrap(), HeaderStatus::NeedMore);
        assert_eq!(headers.parse(b"").unwrap(), HeaderStatus::NeedMore);
        assert!(headers.is_empty());
    }

    #[test]
    fn space_before_colon_is_rejected() {
        let mut headers = Headers::new();
        let err = headers.parse(b"       Host : localhost:42069       \r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaderName(_)));

        let err = headers.parse(b"Host : localhost\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaderName(_)));
    }

    #[test]
    fn embedded_space_is_rejected() {
        let mut headers = Headers::new();
        let err = headers.parse(b"X Custom: y\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaderName(_)));
    }

    #[test]
    fn missing_colon_is_rejected() {
        let mut headers = Headers::new();
        let err = headers.parse(b"NoColonHere\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaderName(_)));
    }

    #[test]
    fn non_token_characters_are_rejected() {
        let mut headers = Headers::new();
        let err = headers.parse(b"H\xc2\xa9st: localhost\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderKey(_)));

        let err = headers.parse(b"Host(): localhost\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderKey(_)));

        let err = headers.parse(b": empty\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderKey(_)));
    }

    #[test]
    fn token_punctuation_is_accepted() {
        let mut headers = Headers::new();
        headers.parse(b"X-Odd!#$%&'*+-.^_`|~Name: 1\r\n").unwrap();
        assert_eq!(headers.get("x-odd!#$%&'*+-.^_`|~name"), Some("1"));
    }

    #[test]
    fn replace_and_remove_keep_index_consistent() {
        let mut headers = Headers::new();
        headers.set("Content-Length", "0");
        headers.set("Connection", "close");
        headers.set("Content-Type", "text/plain");

        headers.replace("content-length", "12");
        assert_eq!(headers.get("Content-Length"), Some("12"));

        assert_eq!(headers.remove("CONNECTION"), Some("close".to_string()));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.remove("connection"), None);

        let keys: Vec<&str> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["content-length", "content-type"]);
    }

    #[test]
    fn set_does_not_lower_case_values() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/HTML");
        assert_eq!(headers.get("content-type"), Some("text/HTML"));
    }
}
