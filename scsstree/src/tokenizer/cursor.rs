//! Character level access to the source, modelled on the rustc lexer cursor.

use std::str::Chars;

use crate::parser::scss_error::PositionedError;
use crate::parser::scss_nodes::Position;

pub(crate) const EOF_CHAR: char = '\0';

/// Peekable iterator over a char sequence that keeps track of where it is.
///
/// Next characters can be peeked via `peek`, and position can be shifted
/// forward via `next`.
pub struct Cursor<'a> {
    input: &'a str,
    /// Iterator over the chars not consumed yet.
    chars: Chars<'a>,
    position: Position,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Cursor<'a> {
        Cursor {
            input,
            chars: input.chars(),
            position: Position::default(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Peeks the symbol `offset` characters ahead without consuming anything.
    /// If requested position doesn't exist, `EOF_CHAR` is returned.
    /// However, getting `EOF_CHAR` doesn't always mean actual end of file,
    /// it should be checked with `eof` method.
    pub fn peek(&self, offset: usize) -> char {
        self.chars.clone().nth(offset).unwrap_or(EOF_CHAR)
    }

    /// Consumes one character. Returns `None` at the end of input.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position.cursor += 1;
        self.position.offset += c.len_utf8();
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 0;
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    pub(crate) fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.next();
        }
    }

    /// Eats symbols while predicate returns true or until the end of file is reached.
    pub(crate) fn bump_while(&mut self, mut predicate: impl FnMut(char) -> bool) -> &'a str {
        let from = self.position.offset;
        while !self.eof() && predicate(self.peek(0)) {
            self.next();
        }
        self.slice_from(from)
    }

    /// Source text between the byte offset `from` and the current position.
    pub(crate) fn slice_from(&self, from: usize) -> &'a str {
        &self.input[from..self.position.offset]
    }

    /// Checks if there is nothing more to consume.
    pub fn eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    pub fn fail(&self, message: impl Into<String>) -> PositionedError {
        PositionedError::new(message, self.position)
    }
}
