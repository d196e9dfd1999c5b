use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use super::scss_nodes::Position;

/// The single failure of the pipeline: a message stamped with a source location.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{} ({}:{})", .message, .position.line, .position.column)]
#[diagnostic(code(scsstree::parse))]
pub struct PositionedError {
    pub message: String,
    pub position: Position,
    #[label("here")]
    span: SourceSpan,
}

impl PositionedError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        return PositionedError {
            message: message.into(),
            position,
            span: SourceSpan::new(position.offset.into(), 0),
        };
    }

    pub fn line(&self) -> usize {
        return self.position.line;
    }

    pub fn column(&self) -> usize {
        return self.position.column;
    }
}
