//! HTTP codec module for the client side of a crawl connection
//!
//! This module frames responses out of a byte stream and writes requests into one.
//! It is meant to be plugged into `tokio_util::codec::{FramedRead, FramedWrite}`.
//!
//! # Architecture
//!
//! - Response handling:
//!   - [`ResponseDecoder`]: Decodes responses, one header followed by payload items
//!   - Header parsing via [`header`] module
//!   - Payload decoding via [`body`] module (content-length, chunked, close-delimited)
//!
//! - Request handling:
//!   - [`RequestEncoder`]: Encodes the bare `GET` request line and `Host` header
//!
//! # Example
//!
//! ```
//! use micro_crawl::codec::{RequestEncoder, ResponseDecoder};
//! use micro_crawl::protocol::{CrawlPath, RequestHead};
//! use tokio_util::codec::{Decoder, Encoder};
//! use bytes::BytesMut;
//! use std::sync::Arc;
//!
//! let mut request = BytesMut::new();
//! let head = RequestHead::get(CrawlPath::new("/a").unwrap(), Arc::from("example.org"));
//! RequestEncoder::new().encode(head, &mut request).unwrap();
//! assert_eq!(&request[..], b"GET /a HTTP/1.1\r\nHost: example.org\r\n\r\n");
//!
//! let mut decoder = ResponseDecoder::new();
//! let mut response = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello"[..]);
//! let header = decoder.decode(&mut response).unwrap();
//! assert!(header.is_some());
//! ```

mod body;
mod header;
mod request_encoder;
mod response_decoder;

pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;
