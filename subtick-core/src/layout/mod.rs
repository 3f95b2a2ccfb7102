//! Line layout for the ticker.
//!
//! - `measure`: width of text on the target surface
//! - `geometry`: margins, line count and line positions for a screen size
//! - `run` / `line`: same-color runs packed into one row
//! - `scroll`: the bounded line buffer
//! - `engine`: word placement, wrapping and scrolling

pub mod engine;
pub mod geometry;
pub mod line;
pub mod measure;
pub mod run;
pub mod scroll;

pub use engine::LayoutEngine;
pub use geometry::Geometry;
pub use line::{Line, RunTarget};
pub use measure::{Monospace, TextMeasure};
pub use run::{Placement, Run};
pub use scroll::ScrollBuffer;
