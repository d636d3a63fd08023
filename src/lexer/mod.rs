use crate::symbol::Span;

pub mod cursor;

/// A whitespace-delimited word of a source line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    /// Label declaration if the word ends with a colon. The name may be empty.
    pub fn as_label(&self) -> Option<&'a str> {
        self.text.strip_suffix(':')
    }
}

/// Test if a character is considered to be whitespace.
pub(crate) fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

/// Source line with its 1-based number and its offset from the start of the source.
#[derive(Clone, Copy, Debug)]
pub struct Line<'a> {
    pub number: usize,
    pub offs: usize,
    pub text: &'a str,
}

/// Split source into lines, keeping track of where each one starts.
/// Handles both `\n` and `\r\n` terminators.
pub fn lines(src: &str) -> impl Iterator<Item = Line<'_>> + '_ {
    let mut offs = 0;
    src.split_inclusive('\n')
        .enumerate()
        .map(move |(i, raw)| {
            let line = Line {
                number: i + 1,
                offs,
                text: raw.trim_end_matches(['\n', '\r']),
            };
            offs += raw.len();
            line
        })
}
