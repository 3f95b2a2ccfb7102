use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::FeedError;

/// A byte-stream the reader task can (re)connect to.
///
/// Implementations must be cancel-safe in `read_available`: the reader task
/// races it against its command channel and may drop the future.
#[async_trait]
pub trait ByteSource: Send {
    /// Open a connection. Returns false on failure; the caller decides
    /// whether to retry.
    async fn connect(&mut self, address: &str) -> bool;

    /// Whatever bytes are available. May be empty.
    async fn read_available(&mut self) -> Result<Vec<u8>, FeedError>;

    async fn disconnect(&mut self);

    /// Write outbound bytes. Failures are reported, never retried.
    async fn send(&mut self, data: &[u8]) -> bool;
}

pub const READ_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Plain TCP feed. Accepts `host:port` or a `socket://host:port` URL.
pub struct TcpSource {
    stream: Option<TcpStream>,
    buffer: Vec<u8>,
    connect_timeout: Duration,
}

impl std::fmt::Debug for TcpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpSource")
            .field("connected", &self.stream.is_some())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl Default for TcpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpSource {
    pub fn new() -> Self {
        Self {
            stream: None,
            buffer: vec![0; READ_BUFFER_SIZE],
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Strip the `socket://` scheme used by handset connection strings.
pub fn socket_target(address: &str) -> &str {
    address.strip_prefix("socket://").unwrap_or(address)
}

#[async_trait]
impl ByteSource for TcpSource {
    async fn connect(&mut self, address: &str) -> bool {
        let target = socket_target(address);

        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => {
                let _ = stream.set_nodelay(true);
                tracing::info!(%target, "Feed connected");
                self.stream = Some(stream);
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(%target, error = %e, "Feed connect failed");
                false
            }
            Err(_) => {
                tracing::warn!(%target, timeout = ?self.connect_timeout, "Feed connect timed out");
                false
            }
        }
    }

    async fn read_available(&mut self) -> Result<Vec<u8>, FeedError> {
        let stream = self.stream.as_mut().ok_or(FeedError::NotConnected)?;
        let n = stream.read(&mut self.buffer).await?;
        if n == 0 {
            return Err(FeedError::Closed);
        }
        Ok(self.buffer[..n].to_vec())
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            tracing::debug!("Feed socket closed");
        }
    }

    async fn send(&mut self, data: &[u8]) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };

        match stream.write_all(data).await {
            Ok(()) => stream.flush().await.is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Feed send failed");
                false
            }
        }
    }
}
