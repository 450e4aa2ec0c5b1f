//! HTTP response header handling implementation.
//!
//! This module wraps the standard `http::Response<()>` type with the few header
//! lookups the crawler needs to frame a body: connection persistence, transfer
//! encoding and content length.

use http::response::Parts;
use http::{HeaderMap, HeaderValue, Response, StatusCode, Version, header};

use crate::protocol::PayloadSize;

/// Represents a parsed HTTP response header.
///
/// Besides the standard header fields, it keeps the reason phrase exactly as sent
/// by the server, since `http::Response` has no slot for it.
#[derive(Debug)]
pub struct ResponseHeader {
    inner: Response<()>,
    reason: Box<str>,
}

impl AsRef<Response<()>> for ResponseHeader {
    fn as_ref(&self) -> &Response<()> {
        &self.inner
    }
}

impl ResponseHeader {
    pub fn new(inner: Response<()>, reason: impl Into<Box<str>>) -> Self {
        Self { inner, reason: reason.into() }
    }

    /// Consumes the header and returns the inner parts together with the reason phrase.
    pub fn into_parts(self) -> (Parts, Box<str>) {
        let (parts, ()) = self.inner.into_parts();
        (parts, self.reason)
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Returns the reason phrase sent by the server, or the canonical one when the
    /// server sent none.
    pub fn reason(&self) -> &str {
        if self.reason.is_empty() { self.status().canonical_reason().unwrap_or("") } else { &self.reason }
    }

    /// Returns true if the server asked to close the connection after this response.
    pub fn is_close(&self) -> bool {
        has_token(self.headers().get_all(header::CONNECTION), b"close")
    }

    /// Returns true if chunked is the final transfer coding.
    pub fn is_chunked(&self) -> bool {
        self.headers()
            .get_all(header::TRANSFER_ENCODING)
            .iter()
            .next_back()
            .and_then(|value| value.as_bytes().rsplit(|b| *b == b',').next())
            .is_some_and(|coding| coding.trim_ascii().eq_ignore_ascii_case(b"chunked"))
    }

    /// Returns the `Content-Length` value, or `-1` when the header is absent or malformed.
    pub fn content_length(&self) -> i64 {
        self.headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .and_then(|value| i64::try_from(value).ok())
            .unwrap_or(-1)
    }

    /// Selects how the body of this response is delimited.
    ///
    /// A zero content length wins over everything else, then chunked encoding, then a
    /// positive content length. Without a usable length the body runs until the peer
    /// closes the connection.
    pub fn payload_size(&self) -> PayloadSize {
        let content_length = self.content_length();
        if content_length == 0 {
            return PayloadSize::Empty;
        }

        if self.is_chunked() {
            return PayloadSize::Chunked;
        }

        match u64::try_from(content_length) {
            Ok(length) => PayloadSize::Length(length),
            Err(_) => PayloadSize::UntilClose,
        }
    }
}

fn has_token<'a>(values: impl IntoIterator<Item = &'a HeaderValue>, token: &[u8]) -> bool {
    values.into_iter().any(|value| value.as_bytes().split(|b| *b == b',').any(|t| t.trim_ascii().eq_ignore_ascii_case(token)))
}
