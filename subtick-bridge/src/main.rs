use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream};
use futures::StreamExt;

use subtick_bridge::config::TickerConfig;
use subtick_bridge::keyboard::{self, Action};
use subtick_bridge::terminal::{CellMeasure, TerminalGuard, TerminalSink};
use subtick_bridge::util;
use subtick_core::{Geometry, LayoutEngine, Ticker, TickerEngine};
use subtick_io::TcpSource;

/// How long to wait for queued text after the user quits.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// How often to check whether the feed was abandoned.
const LIVENESS_POLL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let config = TickerConfig::load()
        .context("Failed to load config")?
        .with_address_override(std::env::args().nth(1));

    util::init_tracing(config.log_file.as_deref())?;
    util::install_panic_hook();

    let settings = config.ticker_settings().context("Invalid config")?;
    let (cols, rows) = crossterm::terminal::size().context("Failed to read terminal size")?;
    let geometry = Geometry::cells(cols, rows).with_vertical_margin(config.vertical_margin);

    tracing::info!(
        address = %config.address,
        cols,
        rows,
        lines = geometry.capacity(),
        "Starting subtick"
    );

    let guard = TerminalGuard::enter().context("Failed to enter alternate screen")?;

    let ticker = Ticker::new(
        LayoutEngine::new(geometry, CellMeasure),
        TerminalSink::new(std::io::stdout()),
        settings,
    );
    let engine = TickerEngine::start(
        TcpSource::new(),
        config.address.clone(),
        config.reconnect.clone(),
        ticker,
    );

    let mut events = EventStream::new();
    let mut liveness = tokio::time::interval(LIVENESS_POLL);

    loop {
        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => {
                    if keyboard::action_for(&key) == Action::Quit {
                        tracing::info!("Quit requested");
                        break;
                    }
                }
                Some(Ok(Event::Resize(cols, rows))) => {
                    // Layout is fixed at startup; the next frame repaints
                    // whatever still fits.
                    tracing::debug!(cols, rows, "Terminal resized");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Terminal input failed");
                    break;
                }
                None => break,
            },

            _ = liveness.tick() => {
                if engine.is_finished() {
                    tracing::warn!("Feed abandoned, exiting");
                    break;
                }
            }
        }
    }

    // The ticker task must be gone before the normal screen comes back.
    match engine.shutdown_within(SHUTDOWN_GRACE).await {
        Ok(Some(_ticker)) => tracing::debug!("Ticker drained"),
        Ok(None) => tracing::debug!("Gave up waiting for queued text"),
        Err(e) => tracing::error!("{e:#}"),
    }

    drop(guard);
    Ok(())
}
