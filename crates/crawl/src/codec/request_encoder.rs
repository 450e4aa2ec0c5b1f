//! Encoder for the one request shape the crawler sends.
//!
//! The request is exactly `GET <path> HTTP/1.1\r\nHost: <host>\r\n\r\n`, with no other
//! header, so servers see the same bytes a replayed access log would produce.

use crate::protocol::{RequestHead, SendError};

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::trace;

/// Encoder for `GET` request heads implementing the [`Encoder`] trait.
#[derive(Debug, Default)]
pub struct RequestEncoder;

impl RequestEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<RequestHead> for RequestEncoder {
    type Error = SendError;

    fn encode(&mut self, item: RequestHead, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let path = item.path().as_str().as_bytes();
        let host = item.host().as_bytes();

        dst.reserve(4 + path.len() + 17 + host.len() + 4);
        dst.put_slice(b"GET ");
        dst.put_slice(path);
        dst.put_slice(b" HTTP/1.1\r\nHost: ");
        dst.put_slice(host);
        dst.put_slice(b"\r\n\r\n");

        trace!(path = %item.path(), "encoded request");
        Ok(())
    }
}
