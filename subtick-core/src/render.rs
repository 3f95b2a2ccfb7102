use crate::color::Rgb;
use crate::layout::{Geometry, Line, ScrollBuffer};

/// Something that can paint the line buffer.
///
/// Called synchronously after every change; the whole frame is repainted
/// each time.
pub trait RenderSink {
    fn redraw(&mut self, frame: &Frame<'_>);
}

impl<S: RenderSink + ?Sized> RenderSink for &mut S {
    fn redraw(&mut self, frame: &Frame<'_>) {
        (**self).redraw(frame)
    }
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn redraw(&mut self, frame: &Frame<'_>) {
        (**self).redraw(frame)
    }
}

/// Borrowed snapshot of the display, valid for one `redraw` call.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    geometry: &'a Geometry,
    buffer: &'a ScrollBuffer,
}

impl<'a> Frame<'a> {
    pub fn new(geometry: &'a Geometry, buffer: &'a ScrollBuffer) -> Self {
        Self { geometry, buffer }
    }

    pub fn geometry(&self) -> &'a Geometry {
        self.geometry
    }

    pub fn line_count(&self) -> usize {
        self.buffer.len()
    }

    /// Each line with the y position it is drawn at, top to bottom.
    pub fn rows(self) -> impl Iterator<Item = (u32, &'a Line)> + 'a {
        let geometry = self.geometry;
        self.buffer
            .iter()
            .enumerate()
            .map(move |(index, line)| (geometry.line_y(index), line))
    }
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn redraw(&mut self, _frame: &Frame<'_>) {}
}

/// Keeps the most recent frame as `(color, text)` runs per line.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub redraws: usize,
    pub lines: Vec<Vec<(Rgb, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain text of each line of the last frame.
    pub fn texts(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|runs| runs.iter().map(|(_, text)| text.as_str()).collect())
            .collect()
    }
}

impl RenderSink for RecordingSink {
    fn redraw(&mut self, frame: &Frame<'_>) {
        self.redraws += 1;
        self.lines = frame
            .rows()
            .map(|(_, line)| {
                line.runs()
                    .iter()
                    .map(|run| (run.color(), run.text().to_string()))
                    .collect()
            })
            .collect();
    }
}
