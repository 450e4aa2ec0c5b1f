//! HTTP header processing module for decoding response headers
//!
//! - [`HeaderDecoder`]: Decodes the status line and header fields of a response
//!   - Supports HTTP/1.0 and HTTP/1.1 status lines
//!   - Enforces header count and size limits
//!   - Selects the body framing from `Content-Length` and `Transfer-Encoding`

mod header_decoder;

pub use header_decoder::HeaderDecoder;
