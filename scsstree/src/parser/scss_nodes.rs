//! Syntax tree for SCSS sources.
//!
//! Tokens and composite constructs share the same [`Node`] type. A node either
//! carries raw text (a token, with its sigils and delimiters stripped) or an
//! ordered list of children, never both.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Immutable snapshot of a location in the source.
///
/// `cursor` counts characters, `offset` counts UTF-8 bytes. `line` is 1-based,
/// `column` is 0-based and restarts after every newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub cursor: usize,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Default for Position {
    fn default() -> Self {
        return Position {
            cursor: 0,
            line: 1,
            column: 0,
            offset: 0,
        };
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    // tokens
    Space,
    CommentSingleline,
    CommentMultiline,
    Number,
    ColorHex,
    Atkeyword,
    Punctuation,
    Operator,
    Identifier,
    StringSingle,
    StringDouble,
    Variable,
    // composites
    Stylesheet,
    Rule,
    Selector,
    Block,
    Declaration,
    Property,
    Value,
    Atrule,
    Arguments,
    Parentheses,
    Attribute,
    Class,
    Id,
    Interpolation,
    Function,
    PseudoClass,
    PseudoElement,
}

impl NodeKind {
    /// True for the kinds the lexer produces.
    pub fn is_token(self) -> bool {
        use NodeKind::*;
        return matches!(
            self,
            Space
                | CommentSingleline
                | CommentMultiline
                | Number
                | ColorHex
                | Atkeyword
                | Punctuation
                | Operator
                | Identifier
                | StringSingle
                | StringDouble
                | Variable
        );
    }

    pub fn is_trivia(self) -> bool {
        return matches!(
            self,
            NodeKind::Space | NodeKind::CommentSingleline | NodeKind::CommentMultiline
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodeValue {
    Text(String),
    Children(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub value: NodeValue,
    /// Position of the first character covered by the node
    pub start: Position,
    /// Position just past the last character covered by the node
    pub next: Position,
}

impl Node {
    pub fn token(kind: NodeKind, text: impl Into<String>, start: Position, next: Position) -> Self {
        return Node {
            kind,
            value: NodeValue::Text(text.into()),
            start,
            next,
        };
    }

    /// Builds a composite node spanning its children.
    /// Without children the node collapses onto `at`.
    pub fn composite(kind: NodeKind, children: Vec<Node>, at: Position) -> Self {
        let start = children.first().map_or(at, |c| c.start);
        let next = children.last().map_or(at, |c| c.next);
        return Node {
            kind,
            value: NodeValue::Children(children),
            start,
            next,
        };
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Text(text) => Some(text),
            NodeValue::Children(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match &self.value {
            NodeValue::Text(_) => &[],
            NodeValue::Children(children) => children,
        }
    }

    pub fn is(&self, kind: NodeKind, text: &str) -> bool {
        return self.kind == kind && self.text() == Some(text);
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn descendants(&self) -> impl Iterator<Item = &Node> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }

    /// `{type, value}` projection of the node, dropping positions.
    pub fn shape(&self) -> Value {
        match &self.value {
            NodeValue::Text(text) => json!({ "type": self.kind, "value": text }),
            NodeValue::Children(children) => json!({
                "type": self.kind,
                "value": children.iter().map(Node::shape).collect::<Vec<_>>(),
            }),
        }
    }
}
