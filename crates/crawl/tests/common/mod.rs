//! A scripted HTTP/1.1 server on `127.0.0.1:0` for end-to-end crawler tests.

#![allow(dead_code, reason = "every test binary uses a different subset")]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// What the server does with one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Write the bytes and wait for the next request on the same connection
    Keep(Vec<u8>),
    /// Write the bytes, then close the connection
    Close(Vec<u8>),
    /// Close the connection without answering
    Drop,
    /// Never answer, keep the connection open
    Hang,
}

/// One request seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub connection: usize,
    pub path: String,
    pub raw: String,
}

type Handler = dyn Fn(&str, usize) -> Reply + Send + Sync;

pub struct TestServer {
    addr: SocketAddr,
    hits: Arc<Mutex<Vec<Hit>>>,
    accepted: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Starts a server answering with `handler(path, previous hits of that path)`.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, usize) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));
        let handler: Arc<Handler> = Arc::new(handler);

        let task = {
            let hits = Arc::clone(&hits);
            let accepted = Arc::clone(&accepted);
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else { return };
                    let id = accepted.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(stream, id, Arc::clone(&handler), Arc::clone(&hits)));
                }
            })
        };

        Self { addr, hits, accepted, task }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    /// Accepted connections, the crawler's probes included.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub async fn wait_for_hits(&self, count: usize) {
        while self.hits.lock().unwrap().len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(mut stream: TcpStream, id: usize, handler: Arc<Handler>, hits: Arc<Mutex<Vec<Hit>>>) {
    let mut buf = Vec::new();
    loop {
        let head_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let mut chunk = [0u8; 1024];
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        };

        let raw = String::from_utf8(buf.drain(..head_end).collect()).unwrap();
        let path = raw.split(' ').nth(1).unwrap_or_default().to_owned();
        let previous = {
            let mut hits = hits.lock().unwrap();
            let previous = hits.iter().filter(|hit| hit.path == path).count();
            hits.push(Hit { connection: id, path: path.clone(), raw });
            previous
        };

        match handler(&path, previous) {
            Reply::Keep(bytes) => {
                if stream.write_all(&bytes).await.is_err() {
                    return;
                }
            }
            Reply::Close(bytes) => {
                let _ = stream.write_all(&bytes).await;
                let _ = stream.shutdown().await;
                return;
            }
            Reply::Drop => return,
            Reply::Hang => std::future::pending::<()>().await,
        }
    }
}

pub fn response(status: &str, headers: &[&str], body: &[u8]) -> Vec<u8> {
    let mut bytes = format!("HTTP/1.1 {status}\r\n").into_bytes();
    for header in headers {
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(b"\r\n");
    }
    bytes.extend_from_slice(b"\r\n");
    bytes.extend_from_slice(body);
    bytes
}

pub fn ok(body: &str) -> Vec<u8> {
    response("200 OK", &[&format!("Content-Length: {}", body.len())], body.as_bytes())
}

pub fn not_found() -> Vec<u8> {
    response("404 Not Found", &["Content-Length: 0"], b"")
}
