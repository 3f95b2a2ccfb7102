//! # Subtick Core
//!
//! Turns a marked-up subtitle stream into a scrolling, multi-colored ticker.
//!
//! bytes → [`filter`] → [`markup`] → [`layout`] → [`render`]
//!
//! [`ticker::Ticker`] owns that pipeline and paces it; [`TickerEngine`]
//! attaches it to a live feed from `subtick-io`.

pub mod color;
pub mod engine;
pub mod filter;
pub mod layout;
pub mod markup;
pub mod render;
pub mod ticker;

// Re-export the main struct so users can just use `subtick_core::TickerEngine`
pub use engine::TickerEngine;

pub use color::Rgb;
pub use layout::{Geometry, LayoutEngine, Monospace, TextMeasure};
pub use markup::{Directive, MarkupTokenizer, Token, Word};
pub use render::{Frame, RenderSink};
pub use ticker::{Ticker, TickerSettings};
