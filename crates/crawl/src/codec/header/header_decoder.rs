//! HTTP header decoder implementation for parsing HTTP response headers
//!
//! This module decodes the status line and header fields of a response from raw bytes
//! into a [`ResponseHeader`], and selects how the body that follows is framed.
//!
//! # Limits
//!
//! - Maximum number of headers: 100
//! - Maximum header size: 64KB
//! - Only HTTP/1.0 and HTTP/1.1 responses are accepted
//!
//! Parsing is lenient where real servers are sloppy: spaces before the colon of a
//! header name and obsolete line folding are accepted.

use bytes::BytesMut;
use http::{HeaderName, HeaderValue, Response, StatusCode};
use httparse::{Error, ParserConfig, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;

use crate::protocol::{ParseError, PayloadSize, ResponseHeader};

/// Maximum number of headers allowed in a response
const MAX_HEADER_NUM: usize = 100;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Decoder for HTTP response headers implementing the [`Decoder`] trait.
///
/// On success the header bytes, including the terminating empty line, are removed from
/// the buffer and the body framing is returned along with the header.
#[derive(Debug, Default)]
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = (ResponseHeader, PayloadSize);
    type Error = ParseError;

    /// Attempts to decode a response header from the provided bytes buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((header, payload_size)))` if a complete header was parsed
    /// - `Ok(None)` if more data is needed
    /// - `Err(ParseError)` if there is no recognizable status line or a limit was exceeded
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut res = httparse::Response::new(&mut headers);

        let parsed_result = parser_config().parse_response(&mut res, src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e @ (Error::Version | Error::Status | Error::Token | Error::NewLine) => ParseError::invalid_status_line(e),
            e => ParseError::invalid_header(e),
        });

        let body_offset = match parsed_result? {
            Status::Complete(body_offset) => body_offset,
            // If parsing incomplete, ensure current buffer size does not exceed limit
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
        };

        trace!(header_size = body_offset, "parsed response header");
        ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

        let version = match res.version {
            Some(0) => http::Version::HTTP_10,
            Some(1) => http::Version::HTTP_11,
            v => return Err(ParseError::InvalidVersion(v)),
        };

        let code = res.code.ok_or_else(|| ParseError::invalid_status_line("missing status code"))?;
        let status = StatusCode::from_u16(code).map_err(|_| ParseError::InvalidStatus(code))?;
        let reason = res.reason.unwrap_or_default();

        let mut builder = Response::builder().status(status).version(version);
        if let Some(header_map) = builder.headers_mut() {
            header_map.reserve(res.headers.len());
            for header in res.headers.iter() {
                let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(ParseError::invalid_header)?;
                let value = HeaderValue::from_bytes(header.value).map_err(ParseError::invalid_header)?;
                header_map.append(name, value);
            }
        }

        let response = builder.body(()).map_err(ParseError::invalid_header)?;
        let header = ResponseHeader::new(response, reason);
        let payload_size = header.payload_size();

        // drop the header section, the body starts right after it
        let _ = src.split_to(body_offset);

        Ok(Some((header, payload_size)))
    }
}

fn parser_config() -> ParserConfig {
    let mut config = ParserConfig::default();
    config.allow_spaces_after_header_name_in_responses(true).allow_obsolete_multiline_headers_in_responses(true);
    config
}
