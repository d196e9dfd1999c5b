//! An SCSS lexer producing lossless tokens.
//!
//! Every character of the input ends up in exactly one token, whitespace and
//! comments included. Token text has its sigils and delimiters stripped
//! (`@`, `$`, `#`, quotes, comment markers); the printer puts them back.
//!
//! Tokens are produced lazily and buffered, so the parser can look ahead
//! any number of tokens without consuming them.

pub mod cursor;

use std::collections::VecDeque;

use cursor::Cursor;
use cursor::EOF_CHAR;

use crate::parser::scss_error::PositionedError;
use crate::parser::scss_nodes::{Node, NodeKind, Position};

const PUNCTUATION: &[char] = &['{', '}', '(', ')', '[', ']', ',', ';', ':', '#', '.'];
const OPERATORS: &[char] = &['+', '-', '*', '/', '%', '=', '&', '|', '!', '~', '<', '>', '^', '$'];
/// Operators that lex as a single token when the same character repeats (`&&`, `==`)
const REPEATABLE_OPERATORS: &[char] = &['&', '|', '=', '<', '>'];

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    /// Tokens read from the cursor but not consumed yet
    lookahead: VecDeque<Node>,
}

impl<'a> Lexer<'a> {
    pub fn new(cursor: Cursor<'a>) -> Lexer<'a> {
        Lexer {
            cursor,
            lookahead: VecDeque::new(),
        }
    }

    /// Returns the token `offset` tokens ahead without consuming it,
    /// or `None` when the input ends before that.
    pub fn peek(&mut self, offset: usize) -> Result<Option<&Node>, PositionedError> {
        self.fill(offset + 1)?;
        Ok(self.lookahead.get(offset))
    }

    /// Consumes and returns the next token, or `None` at the end of input.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Node>, PositionedError> {
        self.fill(1)?;
        Ok(self.lookahead.pop_front())
    }

    pub fn eof(&self) -> bool {
        self.lookahead.is_empty() && self.cursor.eof()
    }

    /// Drains every remaining token.
    pub fn all(&mut self) -> Result<Vec<Node>, PositionedError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Iterator over the remaining tokens. Stops after yielding the first error.
    pub fn tokens(&mut self) -> Tokens<'_, 'a> {
        Tokens {
            lexer: self,
            failed: false,
        }
    }

    /// Error located at the start of the next unconsumed token.
    pub fn fail(&self, message: impl Into<String>) -> PositionedError {
        match self.lookahead.front() {
            Some(token) => PositionedError::new(message, token.start),
            None => self.cursor.fail(message),
        }
    }

    pub fn fail_at(&self, position: Position, message: impl Into<String>) -> PositionedError {
        PositionedError::new(message, position)
    }

    fn fill(&mut self, count: usize) -> Result<(), PositionedError> {
        while self.lookahead.len() < count && !self.cursor.eof() {
            let token = self.read_token()?;
            self.lookahead.push_back(token);
        }
        Ok(())
    }

    /// Reads one token from the cursor. The cursor must not be at the end of input.
    fn read_token(&mut self) -> Result<Node, PositionedError> {
        use NodeKind::*;

        let start = self.cursor.position();
        let first = self.cursor.peek(0);
        let second = self.cursor.peek(1);

        let (kind, text) = match first {
            c if is_white_space(c) => (Space, self.cursor.bump_while(is_white_space)),
            '/' if second == '/' => {
                self.cursor.bump_n(2);
                (CommentSingleline, self.cursor.bump_while(|c| c != '\n'))
            }
            '/' if second == '*' => (CommentMultiline, self.consume_multiline_comment(start)?),
            '"' => (StringDouble, self.consume_string('"', start)?),
            '\'' => (StringSingle, self.consume_string('\'', start)?),
            '@' if is_name_start(second) => {
                self.cursor.next();
                (Atkeyword, self.cursor.bump_while(is_name_char))
            }
            '$' if is_name_start(second) => {
                self.cursor.next();
                (Variable, self.cursor.bump_while(is_name_char))
            }
            '#' if self.hex_run_len() > 0 => {
                let len = self.hex_run_len();
                self.cursor.next();
                let from = self.cursor.position().offset;
                self.cursor.bump_n(len);
                (ColorHex, self.cursor.slice_from(from))
            }
            c if c.is_ascii_digit() => (Number, self.consume_number()),
            '.' if second.is_ascii_digit() => (Number, self.consume_number()),
            c if self.is_ident_start(c) => (Identifier, self.consume_ident()),
            c if PUNCTUATION.contains(&c) => {
                self.cursor.next();
                (Punctuation, self.cursor.slice_from(start.offset))
            }
            c if REPEATABLE_OPERATORS.contains(&c) => {
                (Operator, self.cursor.bump_while(|next| next == c))
            }
            c if OPERATORS.contains(&c) => {
                self.cursor.next();
                (Operator, self.cursor.slice_from(start.offset))
            }
            c => return Err(self.cursor.fail(format!("Can't handle character: \"{c}\""))),
        };

        Ok(Node::token(kind, text, start, self.cursor.position()))
    }

    /// PRECONDITION: cursor is at `/*`
    /// Returns the comment body without its delimiters.
    fn consume_multiline_comment(&mut self, start: Position) -> Result<&'a str, PositionedError> {
        self.cursor.bump_n(2);
        let from = self.cursor.position().offset;
        loop {
            if self.cursor.eof() {
                return Err(self.fail_at(start, "Expected \"*/\""));
            }
            if self.cursor.peek(0) == '*' && self.cursor.peek(1) == '/' {
                let body = self.cursor.slice_from(from);
                self.cursor.bump_n(2);
                return Ok(body);
            }
            self.cursor.next();
        }
    }

    /// PRECONDITION: cursor is at the opening `delimiter`
    /// Escape sequences are kept as written.
    fn consume_string(&mut self, delimiter: char, start: Position) -> Result<&'a str, PositionedError> {
        self.cursor.next();
        let from = self.cursor.position().offset;
        loop {
            match self.cursor.peek(0) {
                _ if self.cursor.eof() => {
                    return Err(self.fail_at(start, format!("Expected \"{delimiter}\"")));
                }
                c if c == delimiter => {
                    let body = self.cursor.slice_from(from);
                    self.cursor.next();
                    return Ok(body);
                }
                '\\' => self.cursor.bump_n(2),
                _ => {
                    self.cursor.next();
                }
            }
        }
    }

    fn consume_number(&mut self) -> &'a str {
        let from = self.cursor.position().offset;
        let leading_dot = self.cursor.peek(0) == '.';
        if leading_dot {
            self.cursor.next();
        }
        self.cursor.bump_while(|c| c.is_ascii_digit());
        if !leading_dot && self.cursor.peek(0) == '.' && self.cursor.peek(1).is_ascii_digit() {
            self.cursor.next();
            self.cursor.bump_while(|c| c.is_ascii_digit());
        }
        self.cursor.slice_from(from)
    }

    fn consume_ident(&mut self) -> &'a str {
        let from = self.cursor.position().offset;
        loop {
            match self.cursor.peek(0) {
                '\\' if self.is_valid_escape() => self.cursor.bump_n(2),
                c if is_ident_char(c) => {
                    self.cursor.next();
                }
                _ => break,
            }
        }
        self.cursor.slice_from(from)
    }

    /// Length of the color following a `#`: 6 or 3 hex digits, 0 when neither fits.
    fn hex_run_len(&self) -> usize {
        let run = (1..=6)
            .take_while(|&i| self.cursor.peek(i).is_ascii_hexdigit())
            .count();
        match run {
            6 => 6,
            3..=5 => 3,
            _ => 0,
        }
    }

    fn is_ident_start(&self, c: char) -> bool {
        c.is_alphabetic() || c == '_' || (c == '\\' && self.is_valid_escape())
    }

    /// A backslash at the cursor followed by anything that is not the end of input
    fn is_valid_escape(&self) -> bool {
        self.cursor.peek(0) == '\\' && self.cursor.peek(1) != EOF_CHAR
    }
}

pub struct Tokens<'l, 'a> {
    lexer: &'l mut Lexer<'a>,
    failed: bool,
}

impl Iterator for Tokens<'_, '_> {
    type Item = Result<Node, PositionedError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.lexer.next() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Convenience for running a fresh cursor and lexer over `input`.
pub fn tokenize(input: &str) -> Result<Vec<Node>, PositionedError> {
    Lexer::new(Cursor::new(input)).all()
}

fn is_white_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-'
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}
