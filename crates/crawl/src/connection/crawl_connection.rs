use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::select;
use tokio::sync::Notify;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::codec::{RequestEncoder, ResponseDecoder};
use crate::connection::{Connector, connect_any};
use crate::protocol::{
    ConnectionError, CrawlPath, CrawlResult, Message, ParseError, PayloadItem, PayloadSize, RequestHead, ResponseHeader,
};
use crate::queue::{WorkItem, WorkQueue};
use crate::sink::ResultSink;

/// Lifecycle of a [`CrawlConnection`].
///
/// A path is in flight only while `AwaitingHeader` or `AwaitingBody`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport established, no request written yet
    Connecting,
    AwaitingHeader,
    AwaitingBody,
    /// Previous response complete, the next request goes over the same socket
    Reusing,
    Closed,
}

/// What a connection needs from its pool while running.
#[derive(Clone, Copy)]
pub struct ConnectionContext<'a> {
    pub queue: &'a WorkQueue,
    pub sink: &'a dyn ResultSink,
    /// Notified whenever a request is written or a frame is received
    pub progress: &'a Notify,
    pub cancel: &'a CancellationToken,
}

impl fmt::Debug for ConnectionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("queue", &self.queue)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

struct InFlight {
    item: WorkItem,
    started: Instant,
    header: Option<ResponseHeader>,
    header_elapsed: Duration,
    body: BytesMut,
}

impl InFlight {
    fn new(item: WorkItem) -> Self {
        Self { item, started: Instant::now(), header: None, header_elapsed: Duration::ZERO, body: BytesMut::new() }
    }
}

/// One persistent HTTP/1.1 connection working through the shared queue.
///
/// The connection pulls a path, writes a `GET`, frames the response and hands the
/// result to the sink, then either reuses the socket for the next path or closes.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
pub struct CrawlConnection<R, W> {
    id: u64,
    host: Arc<str>,
    framed_read: FramedRead<R, ResponseDecoder>,
    framed_write: FramedWrite<W, RequestEncoder>,
    state: ConnectionState,
    in_flight: Option<InFlight>,
    close_after: bool,
    completed: u64,
}

impl<R, W> fmt::Debug for CrawlConnection<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlConnection")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("state", &self.state)
            .field("in_flight", &self.in_flight.as_ref().map(|in_flight| in_flight.item.path().as_str()))
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl CrawlConnection<OwnedReadHalf, OwnedWriteHalf> {
    /// Opens a TCP connection to the first reachable address.
    ///
    /// Failures are returned as is; retrying is up to the pool.
    pub async fn open<C>(
        id: u64,
        host: Arc<str>,
        connector: &C,
        addrs: &[SocketAddr],
        read_buffer: usize,
    ) -> Result<Self, ConnectionError>
    where
        C: Connector + ?Sized,
    {
        let stream = connect_any(connector, addrs).await.map_err(ConnectionError::connect)?;
        let (reader, writer) = stream.into_split();
        Ok(Self::new(id, host, reader, writer, read_buffer))
    }
}

impl<R, W> CrawlConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(id: u64, host: Arc<str>, reader: R, writer: W, read_buffer: usize) -> Self {
        Self {
            id,
            host,
            framed_read: FramedRead::with_capacity(reader, ResponseDecoder::new(), read_buffer),
            framed_write: FramedWrite::new(writer, RequestEncoder::new()),
            state: ConnectionState::Connecting,
            in_flight: None,
            close_after: false,
            completed: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of responses delivered to the sink.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// The path currently in flight, if any.
    pub fn unfinished_path(&self) -> Option<&CrawlPath> {
        self.in_flight.as_ref().map(|in_flight| in_flight.item.path())
    }

    /// Removes the in-flight item so the pool can requeue it.
    pub fn take_unfinished(&mut self) -> Option<WorkItem> {
        self.in_flight.take().map(|in_flight| in_flight.item)
    }

    /// Works through the queue until it is empty, the server closes, an error occurs
    /// or `ctx.cancel` fires. The connection is closed on return.
    ///
    /// Transient errors leave the failed path in flight, see [`Self::unfinished_path`].
    pub async fn run(&mut self, ctx: ConnectionContext<'_>) -> Result<(), ConnectionError> {
        let result = self.drive(ctx).await;
        self.close().await;
        result
    }

    async fn drive(&mut self, ctx: ConnectionContext<'_>) -> Result<(), ConnectionError> {
        if !self.send_next(ctx.queue).await? {
            return Ok(());
        }
        ctx.progress.notify_one();

        loop {
            let message = select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    debug!(path = ?self.unfinished_path().map(CrawlPath::as_str), "terminated");
                    return Ok(());
                }
                message = self.framed_read.next() => message,
            };
            ctx.progress.notify_one();

            let Some(message) = message else {
                return match self.in_flight {
                    Some(_) => Err(ConnectionError::RemoteClosed),
                    None => Ok(()),
                };
            };

            let Some(result) = self.on_message(message?)? else {
                continue;
            };
            ctx.sink.accept(result)?;
            self.completed += 1;

            if self.close_after {
                debug!(completed = self.completed, "server closes the connection");
                return Ok(());
            }

            if !self.send_next(ctx.queue).await? {
                return Ok(());
            }
            ctx.progress.notify_one();
        }
    }

    /// Writes the request for the next queued path.
    ///
    /// Returns `false` without blocking when the queue is empty; the connection is
    /// then done and should be closed.
    pub async fn send_next(&mut self, queue: &WorkQueue) -> Result<bool, ConnectionError> {
        let Some(item) = queue.try_dequeue() else {
            debug!(completed = self.completed, "no more work");
            return Ok(false);
        };

        let head = RequestHead::get(item.path().clone(), Arc::clone(&self.host));
        debug!(path = %item.path(), attempt = item.attempts(), "send request");

        // in flight before the write, so a failed write leaves the path to requeue
        self.in_flight = Some(InFlight::new(item));
        self.framed_write.send(head).await?;
        self.state = ConnectionState::AwaitingHeader;
        Ok(true)
    }

    /// Feeds one decoded frame into the in-flight response.
    ///
    /// Returns the result once the response is complete.
    pub fn on_message(
        &mut self,
        message: Message<(ResponseHeader, PayloadSize)>,
    ) -> Result<Option<CrawlResult>, ConnectionError> {
        let in_flight = match (&mut self.in_flight, self.state) {
            (Some(in_flight), ConnectionState::AwaitingHeader | ConnectionState::AwaitingBody) => in_flight,
            _ => return Err(ParseError::invalid_body("response without a request in flight").into()),
        };

        match message {
            Message::Header((header, payload_size)) => {
                if self.state != ConnectionState::AwaitingHeader {
                    return Err(ParseError::invalid_status_line("second header for one request").into());
                }

                in_flight.header_elapsed = in_flight.started.elapsed();
                self.close_after = header.is_close() || payload_size.is_close_delimited();
                trace!(status = header.status().as_u16(), ?payload_size, close = self.close_after, "received header");

                in_flight.header = Some(header);
                self.state = ConnectionState::AwaitingBody;
                Ok(None)
            }

            Message::Payload(PayloadItem::Chunk(bytes)) => {
                if self.state != ConnectionState::AwaitingBody {
                    return Err(ParseError::invalid_body("body before header").into());
                }
                in_flight.body.extend_from_slice(&bytes);
                Ok(None)
            }

            Message::Payload(PayloadItem::Eof) => {
                if self.state != ConnectionState::AwaitingBody {
                    return Err(ParseError::invalid_body("end of body before header").into());
                }
                let Some(InFlight { item, started, header: Some(header), header_elapsed, body }) = self.in_flight.take()
                else {
                    return Err(ParseError::invalid_body("end of body before header").into());
                };

                let result = CrawlResult::new(
                    Arc::clone(&self.host),
                    item.into_path(),
                    header,
                    body.freeze(),
                    header_elapsed,
                    started.elapsed(),
                );
                self.state = ConnectionState::Reusing;
                debug!(path = %result.path, status = result.status.as_u16(), bytes = result.body.len(), "response complete");
                Ok(Some(result))
            }
        }
    }

    /// Shuts the socket down. Calling it again does nothing.
    pub async fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;

        if let Err(e) = self.framed_write.get_mut().shutdown().await {
            trace!(cause = %e, "shutdown failed");
        }
    }
}
