use super::measure::TextMeasure;
use super::run::{Placement, Run};
use crate::color::Rgb;

/// Where the next word of a given color goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTarget {
    /// Same color as the last run: extend it.
    Append(usize),
    /// Different color (or empty line): open a run where the last one ends.
    Open { start_x: u32, line_start: bool },
}

/// One row of the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    runs: Vec<Run>,
    left_margin: u32,
    right_margin: u32,
}

impl Line {
    pub fn new(left_margin: u32, right_margin: u32) -> Self {
        Self {
            runs: Vec::with_capacity(3),
            left_margin,
            right_margin,
        }
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn left_margin(&self) -> u32 {
        self.left_margin
    }

    pub fn right_margin(&self) -> u32 {
        self.right_margin
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(Run::is_empty)
    }

    /// Where the next run would start.
    pub fn end_x(&self) -> u32 {
        self.runs
            .last()
            .map(Run::end_x)
            .unwrap_or(self.left_margin)
    }

    /// Plain text of the whole line.
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }

    pub fn target_for(&self, color: Rgb) -> RunTarget {
        match self.runs.last() {
            Some(last) if last.color() == color => RunTarget::Append(self.runs.len() - 1),
            _ => {
                let start_x = self.end_x();
                RunTarget::Open {
                    start_x,
                    line_start: start_x == self.left_margin,
                }
            }
        }
    }

    /// Put `word` on this line if there is room. A freshly opened run is only
    /// kept if something landed in it.
    pub fn place<M: TextMeasure + ?Sized>(
        &mut self,
        measure: &M,
        word: &str,
        color: Rgb,
        trailing_space: bool,
    ) -> Placement {
        match self.target_for(color) {
            RunTarget::Append(index) => self.runs[index].place(measure, word, trailing_space),
            RunTarget::Open {
                start_x,
                line_start,
            } => {
                let mut run = Run::new(start_x, self.right_margin, color, line_start);
                let placement = run.place(measure, word, trailing_space);
                if placement != Placement::Rejected {
                    self.runs.push(run);
                }
                placement
            }
        }
    }
}
