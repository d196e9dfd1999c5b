#![allow(clippy::needless_return)]

pub mod config;
pub mod emit;
pub mod logging;
pub mod parser;
pub mod tokenizer;

pub use parser::scss_error::PositionedError;
pub use parser::scss_nodes::{Node, NodeKind, NodeValue, Position};
pub use parser::scss_parser::Parser;
pub use parser::scss_printer::stringify;
pub use tokenizer::{cursor::Cursor, tokenize, Lexer};

/// Parses SCSS source into a `stylesheet` node.
///
/// The tree is lossless: `stringify(&parse(source)?) == source`.
pub fn parse(source: &str) -> Result<Node, PositionedError> {
    Parser::new(Lexer::new(Cursor::new(source))).parse()
}
