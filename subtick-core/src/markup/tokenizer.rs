use std::borrow::Cow;

use super::directive::{Directive, interpret};
use super::{Token, Word};
use crate::color::Rgb;

/// Streaming subtitle tokenizer (chunk-safe for directives).
///
/// Plain text is never held back: whatever partial word is left at the end
/// of a chunk is emitted straight away. Only an unterminated `<...` is
/// carried into the next call.
#[derive(Debug, Clone)]
pub struct MarkupTokenizer {
    initial_color: Rgb,
    color: Rgb,
    in_markup: bool,
    pending: String,
}

impl Default for MarkupTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupTokenizer {
    pub fn new() -> Self {
        Self::with_color(Rgb::RED)
    }

    pub fn with_color(color: Rgb) -> Self {
        Self {
            initial_color: color,
            color,
            in_markup: false,
            pending: String::new(),
        }
    }

    /// Color applied to the next word.
    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn in_markup(&self) -> bool {
        self.in_markup
    }

    /// The unterminated directive carried over from the last chunk.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Back to the state of a fresh connection.
    pub fn reset(&mut self) {
        self.color = self.initial_color;
        self.in_markup = false;
        self.pending.clear();
    }

    pub fn feed(&mut self, chunk: &str) -> Vec<Token> {
        let mut out = Vec::new();
        self.feed_into(chunk, &mut out);
        out
    }

    /// Feed one chunk, appending tokens to `out`.
    pub fn feed_into(&mut self, chunk: &str, out: &mut Vec<Token>) {
        // A carried-over directive keeps its text from `<`, but only its last
        // character is scanned again: a `/` ending the previous chunk may
        // pair with a `>` starting this one.
        let (text, resume): (Cow<'_, str>, usize) = if self.pending.is_empty() {
            (Cow::Borrowed(chunk), 0)
        } else {
            let mut carried = std::mem::take(&mut self.pending);
            let resume = carried.char_indices().next_back().map_or(0, |(i, _)| i);
            carried.push_str(chunk);
            (Cow::Owned(carried), resume)
        };

        let mut word_start = 0;
        let mut directive_start = 0;
        let mut chars = text[resume..]
            .char_indices()
            .map(|(i, c)| (i + resume, c))
            .peekable();

        while let Some((i, c)) = chars.next() {
            if self.in_markup {
                if c == '/' {
                    if let Some(&(gt, '>')) = chars.peek() {
                        chars.next();
                        let end = gt + 1;
                        self.close_directive(&text[directive_start..end], out);
                        word_start = end;
                    }
                }
                continue;
            }

            match c {
                '<' => {
                    self.flush(&text[word_start..i], false, out);
                    self.in_markup = true;
                    directive_start = i;
                }
                ' ' | '\r' | '\n' => {
                    self.flush(&text[word_start..i], true, out);
                    word_start = i + 1;
                }
                '-' => {
                    self.flush(&text[word_start..=i], false, out);
                    word_start = i + 1;
                }
                _ => {}
            }
        }

        if self.in_markup {
            self.pending = text[directive_start..].to_string();
        } else {
            self.flush(&text[word_start..], false, out);
        }
    }

    fn close_directive(&mut self, raw: &str, out: &mut Vec<Token>) {
        self.in_markup = false;

        let directive = interpret(raw);
        match directive {
            Directive::SetColor(color) => {
                tracing::trace!(%color, "Color change");
                self.color = color;
            }
            Directive::Unrecognized => tracing::trace!(directive = raw, "Ignoring directive"),
            Directive::Clear | Directive::NewLine => {}
        }

        out.push(Token::Directive(directive));
    }

    /// Empty words only matter when they carry a space.
    fn flush(&self, text: &str, trailing_space: bool, out: &mut Vec<Token>) {
        if text.is_empty() && !trailing_space {
            return;
        }
        out.push(Token::Word(Word {
            text: text.to_string(),
            color: self.color,
            trailing_space,
        }));
    }
}
