use std::collections::VecDeque;
use std::time::Duration;

use subtick_io::FeedEvent;
use tokio::sync::mpsc;

use crate::color::Rgb;
use crate::filter::TextFilter;
use crate::layout::{LayoutEngine, TextMeasure};
use crate::markup::{Directive, MarkupTokenizer, Token};
use crate::render::RenderSink;

/// Pause after each space- or newline-terminated word.
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerSettings {
    /// Zero disables pacing.
    pub pacing: Duration,
    /// Color of text before the first color directive.
    pub initial_color: Rgb,
}

impl Default for TickerSettings {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            initial_color: Rgb::RED,
        }
    }
}

/// The display pipeline: bytes in, painted frames out.
///
/// Parsing never waits. Tokens go into a queue and `drain` hands them to the
/// layout one at a time, pausing after each paced word so text appears a
/// word at a time.
pub struct Ticker<M, S> {
    filter: TextFilter,
    tokenizer: MarkupTokenizer,
    layout: LayoutEngine<M>,
    sink: S,
    queue: VecDeque<Token>,
    pacing: Duration,
}

impl<M, S> std::fmt::Debug for Ticker<M, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("queued", &self.queue.len())
            .field("pacing", &self.pacing)
            .finish()
    }
}

impl<M: TextMeasure, S: RenderSink> Ticker<M, S> {
    /// Paints the empty screen once straight away.
    pub fn new(layout: LayoutEngine<M>, sink: S, settings: TickerSettings) -> Self {
        let mut ticker = Self {
            filter: TextFilter::new(),
            tokenizer: MarkupTokenizer::with_color(settings.initial_color),
            layout,
            sink,
            queue: VecDeque::new(),
            pacing: settings.pacing,
        };
        ticker.redraw();
        ticker
    }

    pub fn layout(&self) -> &LayoutEngine<M> {
        &self.layout
    }

    pub fn tokenizer(&self) -> &MarkupTokenizer {
        &self.tokenizer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Tokens parsed but not yet shown.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Forget any half-read directive. Called on every new connection.
    pub fn reset_parser(&mut self) {
        self.filter.reset();
        self.tokenizer.reset();
    }

    /// Decode and tokenize a read. Nothing is drawn yet.
    pub fn ingest(&mut self, bytes: &[u8]) {
        let text = self.filter.decode(bytes);
        let before = self.queue.len();
        let tokens = self.tokenizer.feed(&text);
        self.queue.extend(tokens);
        tracing::trace!(
            bytes = bytes.len(),
            tokens = self.queue.len() - before,
            "Ingested"
        );
    }

    /// Apply one token to the layout. Returns whether a redraw happened.
    pub fn apply(&mut self, token: Token) -> bool {
        match token {
            Token::Word(word) => {
                self.layout
                    .add_word(&word.text, word.color, word.trailing_space);
            }
            Token::Directive(Directive::Clear) => {
                tracing::debug!("Display cleared");
                self.layout.clear();
            }
            Token::Directive(Directive::NewLine) => self.layout.new_line(),
            Token::Directive(Directive::SetColor(_) | Directive::Unrecognized) => return false,
        }

        self.redraw();
        true
    }

    /// Show every queued token, pacing between words.
    pub async fn drain(&mut self) {
        while let Some(token) = self.queue.pop_front() {
            let paced = token.is_paced();
            self.apply(token);
            if paced && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }
    }

    /// Show every queued token at once. Returns how many were applied.
    pub fn drain_now(&mut self) -> usize {
        let mut applied = 0;
        while let Some(token) = self.queue.pop_front() {
            self.apply(token);
            applied += 1;
        }
        applied
    }

    fn redraw(&mut self) {
        self.sink.redraw(&self.layout.frame());
    }

    /// Consume feed events until the reader task goes away. Hands the ticker
    /// back so the caller can inspect or reuse it.
    pub async fn run(mut self, mut events: mpsc::Receiver<FeedEvent>) -> Self {
        while let Some(event) = events.recv().await {
            match event {
                FeedEvent::Connected(address) => {
                    tracing::info!(%address, "Ticker attached to feed");
                    self.reset_parser();
                }
                FeedEvent::Data(bytes) => {
                    self.ingest(&bytes);
                    self.drain().await;
                }
                FeedEvent::Disconnected(reason) => {
                    tracing::warn!(%reason, "Feed dropped");
                }
                FeedEvent::GaveUp { attempts } => {
                    tracing::error!(attempts, "Feed abandoned");
                }
            }
        }

        tracing::debug!("Ticker stopped");
        self
    }
}
