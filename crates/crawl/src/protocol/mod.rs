//! Core protocol types of the crawler.
//!
//! # Architecture
//!
//! - **Message Handling** ([`message`]): decoded pieces of a response stream
//!   - [`Message`]: Represents either a header or a payload chunk
//!   - [`PayloadItem`]: Handles individual payload chunks and EOF
//!   - [`PayloadSize`]: How a response body is delimited
//!
//! - **Requests** ([`request`], [`path`]): the `GET` request head and its target
//!   - [`RequestHead`]: Host and path of one request
//!   - [`CrawlPath`]: Validated, immutable request target
//!
//! - **Responses** ([`response`], [`result`]):
//!   - [`ResponseHeader`]: Parsed status line and header fields
//!   - [`CrawlResult`]: A completed request handed to a result sink
//!
//! - **Error Handling** ([`error`]):
//!   - [`CrawlError`]: Fatal pool errors
//!   - [`ConnectionError`]: Transient per-connection errors
//!   - [`ParseError`]: Response framing errors
//!   - [`SendError`]: Request writing errors
//!   - [`SinkError`]: Result sink errors
//!   - [`ConfigError`]: Invalid configuration or input

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod path;
pub use path::CrawlPath;

mod request;
pub use request::RequestHead;

mod response;
pub use response::ResponseHeader;

mod result;
pub use result::CrawlResult;

mod error;
pub use error::ConfigError;
pub use error::ConnectionError;
pub use error::CrawlError;
pub use error::ParseError;
pub use error::SendError;
pub use error::SinkError;
