//! # Subtick IO
//!
//! The Feed Bridge.
//! Owns the socket to the subtitle server and keeps it alive.
//! Bytes are forwarded raw; decoding and parsing live in `subtick-core`.

pub mod policy;
pub mod source;

pub use policy::ReconnectPolicy;
pub use source::{ByteSource, TcpSource};

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Transport failures. All of them are recoverable: the reader task reacts by
/// disconnecting and reconnecting.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("feed closed by peer")]
    Closed,
    #[error("feed is not connected")]
    NotConnected,
}

/// Events from the Feed Layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Connected(String),
    Data(Vec<u8>),
    Disconnected(String),
    /// The reconnect policy ran out of attempts; the reader task has ended.
    GaveUp { attempts: u32 },
}

/// Capacity of the event channel. Once full, the reader stops pulling from
/// the socket until the ticker catches up.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Pause before polling again after a read that returned nothing.
pub const EMPTY_READ_BACKOFF: Duration = Duration::from_millis(10);

/// Commands sent to the reader task
enum FeedCommand {
    Send(Vec<u8>, oneshot::Sender<bool>),
    Stop,
}

/// Handle to the reader task.
pub struct FeedMonitor {
    address: String,
    cmd_tx: mpsc::Sender<FeedCommand>,
}

impl std::fmt::Debug for FeedMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedMonitor")
            .field("address", &self.address)
            .finish()
    }
}

impl FeedMonitor {
    /// Start the reader task. It connects, forwards every read as
    /// `FeedEvent::Data`, and reconnects per `policy` when the feed drops.
    pub fn start<S>(
        source: S,
        address: impl Into<String>,
        policy: ReconnectPolicy,
    ) -> (Self, mpsc::Receiver<FeedEvent>)
    where
        S: ByteSource + 'static,
    {
        let address = address.into();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        tokio::spawn(pump(source, address.clone(), policy, cmd_rx, event_tx));

        (Self { address, cmd_tx }, event_rx)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send bytes upstream. False if not connected, the write failed, or the
    /// reader task is gone. Never retried.
    pub async fn send(&self, data: &[u8]) -> bool {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(FeedCommand::Send(data.to_vec(), reply_tx))
            .await
            .is_err()
        {
            return false;
        }
        reply_rx.await.unwrap_or(false)
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.cmd_tx
            .send(FeedCommand::Stop)
            .await
            .map_err(|_| anyhow::anyhow!("Feed task already stopped"))
    }
}

enum Session {
    Lost(String),
    Stopped,
}

async fn pump<S: ByteSource>(
    mut source: S,
    address: String,
    policy: ReconnectPolicy,
    mut cmd_rx: mpsc::Receiver<FeedCommand>,
    event_tx: mpsc::Sender<FeedEvent>,
) {
    tracing::info!(%address, "Feed task started");

    loop {
        match connect_with_retry(&mut source, &address, &policy, &mut cmd_rx).await {
            Connect::Connected => {}
            Connect::Stopped => break,
            Connect::GaveUp(attempts) => {
                tracing::error!(%address, attempts, "Feed unreachable, giving up");
                let _ = event_tx.send(FeedEvent::GaveUp { attempts }).await;
                break;
            }
        }

        if event_tx
            .send(FeedEvent::Connected(address.clone()))
            .await
            .is_err()
        {
            source.disconnect().await;
            break;
        }

        match read_session(&mut source, &mut cmd_rx, &event_tx).await {
            Session::Lost(reason) => {
                tracing::warn!(%address, %reason, "Feed lost, reconnecting");
                source.disconnect().await;
                if event_tx.send(FeedEvent::Disconnected(reason)).await.is_err() {
                    break;
                }
            }
            Session::Stopped => {
                source.disconnect().await;
                break;
            }
        }
    }

    tracing::info!(%address, "Feed task ended");
}

enum Connect {
    Connected,
    Stopped,
    GaveUp(u32),
}

async fn connect_with_retry<S: ByteSource>(
    source: &mut S,
    address: &str,
    policy: &ReconnectPolicy,
    cmd_rx: &mut mpsc::Receiver<FeedCommand>,
) -> Connect {
    let mut failures: u32 = 0;

    loop {
        if source.connect(address).await {
            return Connect::Connected;
        }

        failures = failures.saturating_add(1);
        if policy.gives_up_after(failures) {
            return Connect::GaveUp(failures);
        }

        let delay = policy.delay_for(failures);
        tracing::debug!(failures, ?delay, "Connect failed, waiting before retry");

        let pause = tokio::time::sleep(delay);
        tokio::pin!(pause);
        loop {
            tokio::select! {
                _ = &mut pause => break,
                cmd = cmd_rx.recv() => match cmd {
                    Some(FeedCommand::Send(_, reply)) => {
                        let _ = reply.send(false);
                    }
                    Some(FeedCommand::Stop) | None => return Connect::Stopped,
                },
            }
        }
    }
}

async fn read_session<S: ByteSource>(
    source: &mut S,
    cmd_rx: &mut mpsc::Receiver<FeedCommand>,
    event_tx: &mpsc::Sender<FeedEvent>,
) -> Session {
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(FeedCommand::Send(data, reply)) => {
                    let ok = source.send(&data).await;
                    let _ = reply.send(ok);
                }
                Some(FeedCommand::Stop) | None => return Session::Stopped,
            },
            read = source.read_available() => match read {
                Ok(bytes) if bytes.is_empty() => tokio::time::sleep(EMPTY_READ_BACKOFF).await,
                Ok(bytes) => {
                    tracing::trace!(len = bytes.len(), "Feed data");
                    if event_tx.send(FeedEvent::Data(bytes)).await.is_err() {
                        return Session::Stopped;
                    }
                }
                Err(e) => return Session::Lost(e.to_string()),
            },
        }
    }
}
