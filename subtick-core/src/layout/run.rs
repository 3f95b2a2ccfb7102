use super::measure::TextMeasure;
use crate::color::Rgb;

/// Outcome of trying to put a word into a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Placed,
    /// The head of the word was placed; the rest needs a new line.
    Partial(String),
    /// Nothing was placed.
    Rejected,
}

/// A same-color stretch of text on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    start_x: u32,
    end_x: u32,
    max_x: u32,
    color: Rgb,
    line_start: bool,
    text: String,
}

impl Run {
    /// `line_start` marks a run with nothing to its left; only such a run may
    /// break a word that is too long for a whole line.
    pub fn new(start_x: u32, max_x: u32, color: Rgb, line_start: bool) -> Self {
        Self {
            start_x,
            end_x: start_x,
            max_x,
            color,
            line_start,
            text: String::new(),
        }
    }

    pub fn start_x(&self) -> u32 {
        self.start_x
    }

    pub fn end_x(&self) -> u32 {
        self.end_x
    }

    pub fn max_x(&self) -> u32 {
        self.max_x
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn is_line_start(&self) -> bool {
        self.line_start
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append `word` if it fits before `max_x`.
    ///
    /// The trailing space is only added when it fits as well; at the margin
    /// the line break stands in for it.
    pub fn place<M: TextMeasure + ?Sized>(
        &mut self,
        measure: &M,
        word: &str,
        trailing_space: bool,
    ) -> Placement {
        let width = measure.text_width(word);

        if self.end_x.saturating_add(width) <= self.max_x {
            self.end_x += width;
            self.text.push_str(word);
            if trailing_space {
                let space = measure.char_width(' ');
                if self.end_x.saturating_add(space) <= self.max_x {
                    self.end_x += space;
                    self.text.push(' ');
                }
            }
            return Placement::Placed;
        }

        if self.line_start && self.end_x == self.start_x {
            return self.split(measure, word);
        }

        Placement::Rejected
    }

    /// Greedy character split for a word wider than the line. The first
    /// character always goes in, so every call makes progress.
    fn split<M: TextMeasure + ?Sized>(&mut self, measure: &M, word: &str) -> Placement {
        let mut split_at = word.len();

        for (i, c) in word.char_indices() {
            let w = measure.char_width(c);
            if i > 0 && self.end_x.saturating_add(w) > self.max_x {
                split_at = i;
                break;
            }
            self.end_x = self.end_x.saturating_add(w);
        }

        self.text.push_str(&word[..split_at]);

        if split_at == word.len() {
            Placement::Placed
        } else {
            Placement::Partial(word[split_at..].to_string())
        }
    }
}
