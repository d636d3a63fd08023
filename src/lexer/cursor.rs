// Heavily inspired and referenced from `rustc_lexer` and adapted to scan one line at a time.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

use crate::{
    lexer::{is_whitespace, Token},
    symbol::Span,
};

/// Cursor over a single source line. Tokens are scanned on demand, left to right.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    /// Line being scanned, without its line terminator
    chars: &'a str,
    /// Offset of the line from the start of the source
    base: usize,
    /// Index that the cursor is pointing to in the line
    curr_pt: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str, base: usize) -> Cursor<'a> {
        Cursor {
            chars: line,
            base,
            curr_pt: 0,
        }
    }

    /// Return slice of the line starting at the current point of the cursor
    pub fn at_curr_pt(&self) -> &'a str {
        &self.chars[self.curr_pt..]
    }

    /// Current position, relative to the start of the source
    pub fn pos(&self) -> usize {
        self.base + self.curr_pt
    }

    /// Move cursor ahead in the line by given amount of bytes
    fn advance(&mut self, amt: usize) {
        self.curr_pt += amt;
    }

    fn skip_whitespace(&mut self) {
        let rest = self.at_curr_pt();
        let skipped = rest.len() - rest.trim_start_matches(is_whitespace).len();
        self.advance(skipped);
    }

    /// Scan the next whitespace-delimited word, or `None` at the end of the line.
    pub fn advance_token(&mut self) -> Option<Token<'a>> {
        self.skip_whitespace();
        let rest = self.at_curr_pt();
        if rest.is_empty() {
            return None;
        }
        let len = rest.find(is_whitespace).unwrap_or(rest.len());
        let tok = Token {
            text: &rest[..len],
            span: Span::new(self.base + self.curr_pt, len),
        };
        self.advance(len);
        Some(tok)
    }

    /// Scan the next word without consuming it.
    pub fn peek_token(&self) -> Option<Token<'a>> {
        self.clone().advance_token()
    }

    /// Empty span just past the last word of the line, for reporting missing operands.
    pub fn eol_span(&self) -> Span {
        let trimmed = self.chars.trim_end_matches(is_whitespace);
        Span::new(self.base + trimmed.len(), 0)
    }
}
