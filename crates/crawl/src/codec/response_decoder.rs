//! HTTP response decoder module
//!
//! Decodes a stream of responses arriving on one persistent connection. Header parsing
//! and payload decoding alternate through a small state machine.
//!
//! # Example
//!
//! ```
//! use micro_crawl::codec::ResponseDecoder;
//! use micro_crawl::protocol::Message;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = ResponseDecoder::new();
//! let mut buffer = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n"[..]);
//!
//! assert!(matches!(decoder.decode(&mut buffer), Ok(Some(Message::Header(_)))));
//! assert!(matches!(decoder.decode(&mut buffer), Ok(Some(Message::Payload(item))) if item.is_eof()));
//! ```

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, ResponseHeader};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for HTTP responses that handles both headers and payload
///
/// The decoder operates in two phases:
/// 1. Header parsing: Decodes the response header using [`HeaderDecoder`]
/// 2. Payload parsing: Decodes the body using [`PayloadDecoder`] until `Eof`
///
/// # State Machine
///
/// The decoder maintains its state through the `payload_decoder` field:
/// - `None`: Currently parsing headers
/// - `Some(PayloadDecoder)`: Currently parsing payload
#[derive(Debug)]
pub struct ResponseDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl ResponseDecoder {
    /// Creates a new `ResponseDecoder` instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a body is being decoded.
    pub fn in_payload(&self) -> bool {
        self.payload_decoder.is_some()
    }

    fn payload_message(&mut self, item: Option<PayloadItem>) -> Option<Message<(ResponseHeader, PayloadSize)>> {
        match item {
            Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
            Some(item @ PayloadItem::Eof) => {
                // this response is done, the next bytes start a new header
                self.payload_decoder.take();
                Some(Message::Payload(item))
            }
            None => None,
        }
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self { header_decoder: HeaderDecoder, payload_decoder: None }
    }
}

impl Decoder for ResponseDecoder {
    type Item = Message<(ResponseHeader, PayloadSize)>;
    type Error = ParseError;

    /// Attempts to decode the next piece of a response from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: Successfully decoded a response header
    /// - `Ok(Some(Message::Payload(_)))`: Successfully decoded a payload chunk or the end of the body
    /// - `Ok(None)`: Need more data to proceed
    /// - `Err(_)`: Encountered a framing error
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode(src)?;
            return Ok(self.payload_message(item));
        }

        let message = match self.header_decoder.decode(src)? {
            Some((header, payload_size)) => {
                self.payload_decoder = Some(payload_size.into());
                Some(Message::Header((header, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }

    /// Decodes what is left once the peer closed the stream.
    ///
    /// A close-delimited body ends here; a partially received header or any other
    /// unfinished body is a framing error.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode_eof(src)?;
            return Ok(self.payload_message(item));
        }

        if src.is_empty() {
            return Ok(None);
        }

        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None => Err(ParseError::IncompleteHeader { buffered: src.len() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn collect(decoder: &mut ResponseDecoder, buffer: &mut BytesMut) -> Vec<Message<(ResponseHeader, PayloadSize)>> {
        let mut messages = Vec::new();
        while let Some(message) = decoder.decode(buffer).unwrap() {
            messages.push(message);
        }
        messages
    }

    #[test]
    fn zero_length_completes_right_after_header() {
        let mut decoder = ResponseDecoder::new();
        let mut buffer = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n"[..]);

        let messages = collect(&mut decoder, &mut buffer);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_header());
        assert!(matches!(&messages[1], Message::Payload(PayloadItem::Eof)));
        assert!(!decoder.in_payload());
    }

    #[test]
    fn fixed_length_completes_on_last_byte() {
        let mut decoder = ResponseDecoder::new();
        let mut buffer = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 15\r\n\r\n"[..]);
        buffer.extend_from_slice(b"0123456789abcd");

        let messages = collect(&mut decoder, &mut buffer);
        assert_eq!(messages.len(), 2);
        assert!(decoder.in_payload());

        buffer.extend_from_slice(b"e");
        let messages = collect(&mut decoder, &mut buffer);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_payload());
        assert!(matches!(&messages[1], Message::Payload(PayloadItem::Eof)));
        assert!(!decoder.in_payload());
    }

    #[test]
    fn two_responses_on_one_stream() {
        let mut decoder = ResponseDecoder::new();
        let mut buffer = BytesMut::from(
            &b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhelloHTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n"[..],
        );

        let messages = collect(&mut decoder, &mut buffer);
        let statuses: Vec<_> = messages
            .iter()
            .filter_map(|m| match m {
                Message::Header((header, _)) => Some(header.status()),
                Message::Payload(_) => None,
            })
            .collect();

        assert_eq!(statuses, vec![StatusCode::OK, StatusCode::NOT_FOUND]);
        assert_eq!(messages.len(), 5);
    }

    #[test]
    fn close_delimited_body_ends_at_eof() {
        let mut decoder = ResponseDecoder::new();
        let mut buffer = BytesMut::from(&b"HTTP/1.0 200 OK\r\n\r\nuntil close"[..]);

        let header = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(matches!(header, Message::Header((_, PayloadSize::UntilClose))));

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap().into_payload_item().unwrap();
        assert_eq!(&chunk.as_bytes().unwrap()[..], b"until close");

        let eof = decoder.decode_eof(&mut buffer).unwrap().unwrap().into_payload_item().unwrap();
        assert!(eof.is_eof());
        assert!(decoder.decode_eof(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn truncated_header_at_eof() {
        let mut decoder = ResponseDecoder::new();
        let mut buffer = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-"[..]);
        assert!(matches!(decoder.decode_eof(&mut buffer), Err(ParseError::IncompleteHeader { .. })));
    }
}
