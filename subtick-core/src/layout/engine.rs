use std::borrow::Cow;

use super::geometry::Geometry;
use super::measure::TextMeasure;
use super::run::Placement;
use super::scroll::ScrollBuffer;
use crate::color::Rgb;
use crate::render::Frame;

/// Packs colored words into margin-bounded lines and scrolls when the
/// screen is full.
#[derive(Debug, Clone)]
pub struct LayoutEngine<M> {
    geometry: Geometry,
    measure: M,
    buffer: ScrollBuffer,
}

impl<M: TextMeasure> LayoutEngine<M> {
    pub fn new(geometry: Geometry, measure: M) -> Self {
        let buffer = ScrollBuffer::new(
            geometry.capacity(),
            geometry.left_margin(),
            geometry.right_margin(),
        );
        Self {
            geometry,
            measure,
            buffer,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn measure(&self) -> &M {
        &self.measure
    }

    pub fn buffer(&self) -> &ScrollBuffer {
        &self.buffer
    }

    /// Read-only view for the render sink.
    pub fn frame(&self) -> Frame<'_> {
        Frame::new(&self.geometry, &self.buffer)
    }

    /// Lay out one word, wrapping onto as many new lines as it takes.
    pub fn add_word(&mut self, text: &str, color: Rgb, trailing_space: bool) {
        let mut remaining: Cow<'_, str> = Cow::Borrowed(text);

        loop {
            let placement =
                self.buffer
                    .current_mut()
                    .place(&self.measure, &remaining, color, trailing_space);

            match placement {
                Placement::Placed => return,
                Placement::Partial(rest) => {
                    self.start_line();
                    remaining = Cow::Owned(rest);
                }
                Placement::Rejected => self.start_line(),
            }
        }
    }

    /// Forced line break.
    pub fn new_line(&mut self) {
        self.start_line();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn start_line(&mut self) {
        if let Some(dropped) = self.buffer.push_line() {
            tracing::trace!(runs = dropped.runs().len(), "Line scrolled off");
        }
    }
}
