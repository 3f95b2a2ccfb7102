/// Text measurement supplied by the rendering surface.
///
/// Units are whatever the surface draws in: pixels for a bitmap canvas,
/// cells for a terminal.
pub trait TextMeasure {
    fn char_width(&self, c: char) -> u32;

    fn text_width(&self, text: &str) -> u32 {
        text.chars()
            .map(|c| self.char_width(c))
            .fold(0u32, u32::saturating_add)
    }
}

/// Every character has the same advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monospace {
    pub advance: u32,
}

impl Monospace {
    /// One unit per character, i.e. a terminal cell.
    pub const CELL: Monospace = Monospace { advance: 1 };

    pub const fn new(advance: u32) -> Self {
        Self { advance }
    }
}

impl TextMeasure for Monospace {
    fn char_width(&self, _c: char) -> u32 {
        self.advance
    }
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn char_width(&self, c: char) -> u32 {
        (**self).char_width(c)
    }

    fn text_width(&self, text: &str) -> u32 {
        (**self).text_width(text)
    }
}
