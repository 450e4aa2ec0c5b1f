use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::{TcpStream, lookup_host};

/// Source of TCP connections to a host.
///
/// Pools resolve a host once per probe and open every connection of a batch through
/// this trait, which keeps name resolution and connect failures scriptable in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;

    async fn connect(&self, addr: SocketAddr) -> io::Result<TcpStream>;
}

/// Resolves with the system resolver and connects with [`TcpStream::connect`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let addrs: Vec<_> = lookup_host((host, port)).await?.collect();
        if addrs.is_empty() {
            return Err(io::Error::new(io::ErrorKind::NotFound, format!("no address found for {host}")));
        }
        Ok(addrs)
    }

    async fn connect(&self, addr: SocketAddr) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Connects to the first address in `addrs` that accepts, returning the last error otherwise.
pub async fn connect_any<C>(connector: &C, addrs: &[SocketAddr]) -> io::Result<TcpStream>
where
    C: Connector + ?Sized,
{
    let mut last_error = None;
    for addr in addrs {
        match connector.connect(*addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no address to connect to")))
}
