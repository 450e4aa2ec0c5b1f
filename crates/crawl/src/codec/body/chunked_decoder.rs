//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! See [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//! Chunk extensions and trailer fields are validated for framing and then dropped.

use crate::protocol::{ParseError, PayloadItem};
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

/// A decoder for chunked response bodies.
///
/// Every call consumes as many framing bytes as are available and returns the next
/// run of body bytes, `Eof` once the last chunk and trailer section were read, or
/// `None` when more input is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: State,
    /// Bytes still to read in the current chunk, or the size being parsed
    size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// First hex digit of the chunk size
    SizeStart,
    /// Further hex digits of the chunk size
    Size,
    /// Whitespace after the size
    SizeLws,
    /// Ignored chunk extension, up to CR
    Extension,
    /// LF closing the size line
    SizeLf,
    /// Chunk data
    Data,
    /// CR after chunk data
    DataCr,
    /// LF after chunk data
    DataLf,
    /// Start of a trailer line, or the final CR
    TrailerStart,
    /// Inside a trailer field, up to CR
    Trailer,
    /// LF closing a trailer field
    TrailerLf,
    /// Final LF
    EndLf,
    /// Last chunk and trailer section consumed
    Done,
}

/// Outcome of one state machine step.
enum Step {
    Next(State),
    Data(Bytes, State),
    NeedMore,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: State::SizeStart, size: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    fn step(&mut self, src: &mut BytesMut) -> Result<Step, ParseError> {
        if self.state == State::Data {
            return Ok(self.read_data(src));
        }

        if src.is_empty() {
            return Ok(Step::NeedMore);
        }

        let byte = src.get_u8();
        let next = match (self.state, byte) {
            (State::SizeStart | State::Size, b) if b.is_ascii_hexdigit() => {
                let digit = u64::from(hex_value(b));
                self.size = self.size.checked_mul(16).and_then(|s| s.checked_add(digit)).ok_or_else(|| ParseError::invalid_body("chunk size overflow"))?;
                State::Size
            }
            (State::Size | State::SizeLws, b'\t' | b' ') => State::SizeLws,
            (State::Size | State::SizeLws, b';') => State::Extension,
            (State::Size | State::SizeLws | State::Extension, b'\r') => State::SizeLf,
            (State::Extension, b'\n') => return Err(ParseError::invalid_body("chunk extension contains newline")),
            (State::Extension, _) => State::Extension,
            (State::SizeLf, b'\n') if self.size == 0 => State::TrailerStart,
            (State::SizeLf, b'\n') => State::Data,
            (State::DataCr, b'\r') => State::DataLf,
            (State::DataLf, b'\n') => State::SizeStart,
            (State::TrailerStart, b'\r') => State::EndLf,
            (State::TrailerStart | State::Trailer, b'\r') => State::TrailerLf,
            (State::TrailerStart | State::Trailer, _) => State::Trailer,
            (State::TrailerLf, b'\n') => State::TrailerStart,
            (State::EndLf, b'\n') => State::Done,
            (state, b) => return Err(ParseError::invalid_body(format!("unexpected byte {b:#04x} in chunked state {state:?}"))),
        };

        Ok(Step::Next(next))
    }

    fn read_data(&mut self, src: &mut BytesMut) -> Step {
        if src.is_empty() {
            return Step::NeedMore;
        }

        // the min is bounded by src.len(), so it fits in usize
        let len = std::cmp::min(self.size, src.len() as u64) as usize;
        self.size -= len as u64;
        let bytes = src.split_to(len).freeze();
        let next = if self.size == 0 { State::DataCr } else { State::Data };
        Step::Data(bytes, next)
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == State::Done {
                trace!("finished reading chunked data");
                return Ok(Some(PayloadItem::Eof));
            }

            match self.step(src)? {
                Step::NeedMore => return Ok(None),
                Step::Next(state) => self.state = state,
                Step::Data(bytes, state) => {
                    self.state = state;
                    trace!(len = bytes.len(), "read chunked bytes");
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut ChunkedDecoder, buffer: &mut BytesMut) -> (Vec<u8>, bool) {
        let mut body = Vec::new();
        while let Some(item) = decoder.decode(buffer).unwrap() {
            match item {
                PayloadItem::Chunk(bytes) => body.extend_from_slice(&bytes),
                PayloadItem::Eof => return (body, true),
            }
        }
        (body, false)
    }

    #[test]
    fn test_basic() {
        let mut buffer = BytesMut::from(&b"10\r\n1234567890abcdef\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&item.as_bytes().unwrap()[..], b"1234567890abcdef");

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_chunks() {
        let mut buffer = BytesMut::from(&b"5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n"[..]);
        let (body, done) = decode_all(&mut ChunkedDecoder::new(), &mut buffer);
        assert!(done);
        assert_eq!(body, b"hello, world");
    }

    #[test]
    fn test_extensions_and_trailers() {
        let mut buffer = BytesMut::from(&b"5;chunk-ext=value\r\nhello\r\n0\r\nTrailer: value\r\nOther: x\r\n\r\n"[..]);
        let (body, done) = decode_all(&mut ChunkedDecoder::new(), &mut buffer);
        assert!(done);
        assert_eq!(body, b"hello");
    }

    #[test]
    fn test_byte_by_byte() {
        let input = b"A\r\n0123456789\r\n3 \r\nabc\r\n0\r\n\r\n";
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::new();
        let mut body = Vec::new();
        let mut done = false;

        for b in input {
            buffer.extend_from_slice(&[*b]);
            while let Some(item) = decoder.decode(&mut buffer).unwrap() {
                match item {
                    PayloadItem::Chunk(bytes) => body.extend_from_slice(&bytes),
                    PayloadItem::Eof => {
                        done = true;
                        break;
                    }
                }
            }
        }

        assert!(done);
        assert_eq!(body, b"0123456789abc");
    }

    #[test]
    fn test_leaves_next_response_in_buffer() {
        let mut buffer = BytesMut::from(&b"1\r\nx\r\n0\r\n\r\nHTTP/1.1 200 OK\r\n"[..]);
        let (body, done) = decode_all(&mut ChunkedDecoder::new(), &mut buffer);
        assert!(done);
        assert_eq!(body, b"x");
        assert_eq!(&buffer[..], b"HTTP/1.1 200 OK\r\n");
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut buffer = BytesMut::from(&b"xyz\r\n"[..]);
        assert!(ChunkedDecoder::new().decode(&mut buffer).is_err());
    }

    #[test]
    fn test_missing_crlf() {
        let mut buffer = BytesMut::from(&b"5\r\nhelloBad"[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b"hello"));
        assert!(decoder.decode(&mut buffer).is_err());
    }

    #[test]
    fn test_size_line_needs_a_digit() {
        for input in [&b"\r\n\r\n"[..], &b";ext\r\n\r\n"[..], &b" 0\r\n\r\n"[..], &b"5\r\nhello\r\n\r\n\r\n"[..]] {
            let mut decoder = ChunkedDecoder::new();
            let mut buffer = BytesMut::from(input);
            let error = loop {
                match decoder.decode(&mut buffer) {
                    Ok(Some(PayloadItem::Chunk(_))) => {}
                    Ok(other) => panic!("{input:?} decoded to {other:?}"),
                    Err(e) => break e,
                }
            };
            assert!(matches!(error, ParseError::InvalidBody { .. }), "{input:?}");
            assert!(!decoder.is_done());
        }
    }

    #[test]
    fn test_done_after_last_chunk() {
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(&b"0\r\n"[..]);

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(!decoder.is_done());

        buffer.extend_from_slice(b"\r\n");
        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
        assert!(decoder.is_done());
    }

    #[test]
    fn test_size_overflow() {
        let mut buffer = BytesMut::from(&b"fffffffffffffffff\r\n"[..]);
        assert!(ChunkedDecoder::new().decode(&mut buffer).is_err());
    }
}
