//! Turns a tree back into source text.
//!
//! Each node kind owns exactly the literal syntax the lexer and parser strip
//! from it; everything else is the concatenation of its children.

use std::fmt;

use crate::parser::scss_nodes::{Node, NodeKind, NodeValue};

/// Text written before and after the content of a node of `kind`.
pub fn delimiters(kind: NodeKind) -> (&'static str, &'static str) {
    use NodeKind::*;
    match kind {
        Arguments | Parentheses => ("(", ")"),
        Attribute => ("[", "]"),
        Block => ("{", "}"),
        Interpolation => ("#{", "}"),
        Class => (".", ""),
        Id | ColorHex => ("#", ""),
        Atkeyword => ("@", ""),
        Variable => ("$", ""),
        PseudoClass => (":", ""),
        PseudoElement => ("::", ""),
        CommentSingleline => ("//", ""),
        CommentMultiline => ("/*", "*/"),
        StringDouble => ("\"", "\""),
        StringSingle => ("'", "'"),
        Space | Number | Punctuation | Operator | Identifier | Stylesheet | Rule | Selector
        | Declaration | Property | Value | Atrule | Function => ("", ""),
    }
}

pub fn write_node(out: &mut impl fmt::Write, node: &Node) -> fmt::Result {
    let (prefix, suffix) = delimiters(node.kind);
    out.write_str(prefix)?;
    match &node.value {
        NodeValue::Text(text) => out.write_str(text)?,
        NodeValue::Children(children) => {
            for child in children {
                write_node(out, child)?;
            }
        }
    }
    out.write_str(suffix)
}

pub fn stringify(node: &Node) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_node(&mut out, node);
    out
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self)
    }
}
