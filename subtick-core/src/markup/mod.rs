//! Subtitle markup: the streaming tokenizer and the directive table.
//!
//! - `tokenizer`: splits the text stream into words and `<.../>` directives
//! - `directive`: maps a closed directive to clear / line break / color

pub mod directive;
pub mod tokenizer;

pub use directive::{Directive, interpret};
pub use tokenizer::MarkupTokenizer;

use crate::color::Rgb;

/// A word ready for layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub color: Rgb,
    /// Ended by a space or line break (as opposed to a hyphen, a directive
    /// or the end of a chunk).
    pub trailing_space: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(Word),
    Directive(Directive),
}

impl Token {
    /// Whether the consumer should wait the pacing interval after this token.
    pub fn is_paced(&self) -> bool {
        matches!(self, Token::Word(word) if word.trailing_space)
    }
}
