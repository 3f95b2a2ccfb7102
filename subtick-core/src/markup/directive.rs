use crate::color::Rgb;

/// What a closed `<.../>` sequence asks the display to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Clear,
    NewLine,
    SetColor(Rgb),
    /// Unknown tag or malformed color. Ignored.
    Unrecognized,
}

const CLEAR: &str = "<clear/>";
const BREAK: &str = "<br/>";
const FONT_COLOR: &str = "<font color=\"#";

/// Map a directive (from `<` through `/>`) to its effect.
///
/// Matching is a case-insensitive prefix test. For colors only the text up
/// to the next `"` is read; anything after it is ignored.
pub fn interpret(text: &str) -> Directive {
    if strip_prefix_ignore_case(text, CLEAR).is_some() {
        return Directive::Clear;
    }

    if strip_prefix_ignore_case(text, BREAK).is_some() {
        return Directive::NewLine;
    }

    if let Some(rest) = strip_prefix_ignore_case(text, FONT_COLOR) {
        return rest
            .split_once('"')
            .and_then(|(hex, _)| Rgb::parse_hex(hex))
            .map(Directive::SetColor)
            .unwrap_or(Directive::Unrecognized);
    }

    Directive::Unrecognized
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}
