use std::time::Duration;

use anyhow::{Context, Result};
use subtick_io::{ByteSource, FeedMonitor, ReconnectPolicy};
use tokio::task::JoinHandle;

use crate::layout::TextMeasure;
use crate::render::RenderSink;
use crate::ticker::Ticker;

/// The main entry point for the Subtick Core.
/// Connects a feed to a ticker: the reader task pulls bytes, the ticker task
/// owns all parse and layout state.
pub struct TickerEngine<M, S> {
    monitor: FeedMonitor,
    task: JoinHandle<Ticker<M, S>>,
}

impl<M, S> std::fmt::Debug for TickerEngine<M, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerEngine")
            .field("monitor", &self.monitor)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl<M, S> TickerEngine<M, S>
where
    M: TextMeasure + Send + 'static,
    S: RenderSink + Send + 'static,
{
    /// Starts the engine: spawns the reader and ticker tasks.
    pub fn start<Src>(
        source: Src,
        address: impl Into<String>,
        policy: ReconnectPolicy,
        ticker: Ticker<M, S>,
    ) -> Self
    where
        Src: ByteSource + 'static,
    {
        let address = address.into();
        tracing::info!(%address, pacing = ?ticker.pacing(), "Starting ticker engine");

        let (monitor, events) = FeedMonitor::start(source, address, policy);
        let task = tokio::spawn(ticker.run(events));

        Self { monitor, task }
    }

    pub fn address(&self) -> &str {
        self.monitor.address()
    }

    /// Send bytes upstream. False on any failure.
    pub async fn send(&self, data: &[u8]) -> bool {
        self.monitor.send(data).await
    }

    /// True once the ticker task has ended (feed abandoned or stopped).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the feed and wait for the ticker to finish what it has queued.
    pub async fn shutdown(self) -> Result<Ticker<M, S>> {
        if let Err(e) = self.monitor.stop().await {
            tracing::debug!("{e:#}");
        }
        self.task.await.context("Ticker task failed")
    }

    /// Like [`shutdown`](Self::shutdown), but gives the ticker at most
    /// `grace` to drain. On timeout the task is aborted and awaited, so the
    /// sink is never called again once this returns; the result is `None`.
    pub async fn shutdown_within(self, grace: Duration) -> Result<Option<Ticker<M, S>>> {
        if let Err(e) = self.monitor.stop().await {
            tracing::debug!("{e:#}");
        }

        let mut task = self.task;
        match tokio::time::timeout(grace, &mut task).await {
            Ok(joined) => joined.map(Some).context("Ticker task failed"),
            Err(_) => {
                tracing::debug!(?grace, "Ticker still draining, aborting");
                task.abort();
                let _ = task.await;
                Ok(None)
            }
        }
    }
}
