use std::collections::VecDeque;

use super::line::Line;

/// Bounded stack of lines, oldest first. The last line is current and
/// receives new words; pushing past capacity drops the oldest.
#[derive(Debug, Clone)]
pub struct ScrollBuffer {
    history: VecDeque<Line>,
    current: Line,
    capacity: usize,
    left_margin: u32,
    right_margin: u32,
}

impl ScrollBuffer {
    pub fn new(capacity: usize, left_margin: u32, right_margin: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity - 1),
            current: Line::new(left_margin, right_margin),
            capacity,
            left_margin,
            right_margin,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lines held, current included. Always at least one.
    pub fn len(&self) -> usize {
        self.history.len() + 1
    }

    pub fn current(&self) -> &Line {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Line {
        &mut self.current
    }

    /// Line `index`, 0 being the oldest.
    pub fn get(&self, index: usize) -> Option<&Line> {
        if index < self.history.len() {
            self.history.get(index)
        } else if index == self.history.len() {
            Some(&self.current)
        } else {
            None
        }
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Line> + '_ {
        self.history.iter().chain(std::iter::once(&self.current))
    }

    /// Start a new current line. Returns the line that scrolled off, if any.
    pub fn push_line(&mut self) -> Option<Line> {
        let fresh = Line::new(self.left_margin, self.right_margin);
        let previous = std::mem::replace(&mut self.current, fresh);
        self.history.push_back(previous);

        if self.history.len() >= self.capacity {
            self.history.pop_front()
        } else {
            None
        }
    }

    /// Down to a single empty line.
    pub fn clear(&mut self) {
        self.history.clear();
        self.current = Line::new(self.left_margin, self.right_margin);
    }
}
