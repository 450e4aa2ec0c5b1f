//! HTTP body handling module for decoding response payloads
//!
//! # Components
//!
//! - [`ChunkedDecoder`](chunked_decoder::ChunkedDecoder): Handles chunked transfer encoded payloads
//! - [`LengthDecoder`](length_decoder::LengthDecoder): Processes fixed-length payloads
//! - [`PayloadDecoder`]: Main decoder that picks a strategy from the [`PayloadSize`](crate::protocol::PayloadSize)
//!   of a response, including close-delimited bodies

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;

pub use payload_decoder::PayloadDecoder;
