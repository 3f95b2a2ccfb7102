/// Minimum total space left above and below the text block on a pixel canvas.
pub const DEFAULT_VERTICAL_MARGIN: u32 = 8;

/// Screen dimensions and the layout derived from them.
///
/// Text uses the middle 90% of the width (5% margin each side). The number
/// of lines is however many fit once the vertical margin is taken off, and
/// the leftover height is split evenly above and below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    width: u32,
    height: u32,
    line_height: u32,
    vertical_margin: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32, line_height: u32) -> Self {
        Self {
            width,
            height,
            line_height: line_height.max(1),
            vertical_margin: DEFAULT_VERTICAL_MARGIN,
        }
    }

    /// A character-cell surface: one line per row, no vertical margin.
    pub fn cells(cols: u16, rows: u16) -> Self {
        Self::new(cols as u32, rows as u32, 1).with_vertical_margin(0)
    }

    pub fn with_vertical_margin(mut self, margin: u32) -> Self {
        self.vertical_margin = margin;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn line_height(&self) -> u32 {
        self.line_height
    }

    pub fn vertical_margin(&self) -> u32 {
        self.vertical_margin
    }

    /// Horizontal margin on each side.
    pub fn margin(&self) -> u32 {
        self.width / 20
    }

    pub fn left_margin(&self) -> u32 {
        self.margin()
    }

    pub fn right_margin(&self) -> u32 {
        self.width - self.margin()
    }

    fn usable_height(&self) -> u32 {
        self.height.saturating_sub(self.vertical_margin)
    }

    /// Number of lines on screen. Never zero.
    pub fn capacity(&self) -> usize {
        ((self.usable_height() / self.line_height) as usize).max(1)
    }

    /// Top edge of line `index`. Half the vertical margin sits above the
    /// block and half below, with any leftover rows split the same way.
    pub fn line_y(&self, index: usize) -> u32 {
        let top = self.vertical_margin / 2 + (self.usable_height() % self.line_height) / 2;
        top + index as u32 * self.line_height
    }
}
