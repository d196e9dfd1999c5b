use std::collections::HashMap;

use tracing::trace;

use crate::parser::scss_error::PositionedError;
use crate::parser::scss_nodes::NodeKind::{self, *};
use crate::parser::scss_nodes::{Node, NodeValue, Position};
use crate::tokenizer::Lexer;

type Result<T> = std::result::Result<T, PositionedError>;

/// Deepest allowed nesting of `( )`, `[ ]`, `{ }` and `#{ }`
pub(crate) const MAX_NESTING: usize = 64;

/// What kind of sequence the parser is currently inside. Decides which
/// punctuation ends a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Top level of the stylesheet
    Root,
    /// Inside `{ }`
    Block,
    /// Inside `( )`, `[ ]` or `#{ }`, where `,` also separates entries
    Parens,
}

/// Outcome of looking ahead over the tokens of one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Statement {
    /// `selector { ... }`
    Rule,
    /// `property: value` with optional trailing block and terminator
    Declaration,
    /// Neither: loose nodes up to the end of the statement
    Plain,
}

/// Recursive descent parser turning the token stream into a lossless tree.
///
/// The only lookahead that spans more than a couple of tokens is
/// [`Parser::scan_statement`], which inspects one statement without consuming
/// it to pick between a rule and a declaration.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Number of tokens taken from the lexer so far
    consumed: usize,
    /// Wrapped nodes currently open
    depth: usize,
    /// Token index of the closer matching each opener walked by
    /// `scan_statement`, `None` when the input ends first
    groups: HashMap<usize, Option<usize>>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        return Parser {
            lexer,
            consumed: 0,
            depth: 0,
            groups: HashMap::new(),
        };
    }

    // ================
    // LOOKAHEAD (never consumes)
    // ================

    fn peek_kind(&mut self, offset: usize) -> Result<Option<NodeKind>> {
        return Ok(self.lexer.peek(offset)?.map(|t| t.kind));
    }

    fn peek_punct(&mut self, offset: usize) -> Result<Option<char>> {
        return Ok(self.lexer.peek(offset)?.and_then(punctuation_char));
    }

    fn at_punct(&mut self, offset: usize, c: char) -> Result<bool> {
        return Ok(self.peek_punct(offset)? == Some(c));
    }

    fn at_operator(&mut self, offset: usize, op: &str) -> Result<bool> {
        return Ok(self.lexer.peek(offset)?.is_some_and(|t| t.is(Operator, op)));
    }

    /// `#{`
    fn at_interpolation(&mut self, offset: usize) -> Result<bool> {
        return Ok(self.at_punct(offset, '#')? && self.at_punct(offset + 1, '{')?);
    }

    fn at_eof(&mut self) -> Result<bool> {
        return Ok(self.lexer.peek(0)?.is_none());
    }

    /// Something a `:` or `::` selector prefix can apply to
    fn at_pseudo_target(&mut self, offset: usize) -> Result<bool> {
        return Ok(self.peek_kind(offset)? == Some(Identifier) || self.at_interpolation(offset)?);
    }

    /// Decides how the statement starting at the next token is parsed.
    ///
    /// Walks forward to the first terminator outside of `( )`, `[ ]`, `#{ }`:
    /// a `{`, a `;`, a `,` inside parentheses, a closing bracket or the end of
    /// input. A `:` seen on the way makes the statement a declaration, except
    /// that a `{` only commits to a declaration when one of the colons cannot
    /// start a pseudo selector (`a:hover {` is a rule, `padding: 1px {` is a
    /// declaration with a trailing block). A colon in first position never
    /// counts.
    ///
    /// Groups walked once are remembered in `groups` and skipped by later
    /// scans, so every token is walked at most twice.
    pub(crate) fn scan_statement(&mut self, scope: Scope) -> Result<Statement> {
        let mut open: Vec<usize> = Vec::new();
        let mut offset = 0usize;
        let mut colon = false;
        let mut hard_colon = false;

        loop {
            let Some(kind) = self.peek_kind(offset)? else {
                break;
            };
            if kind != Punctuation {
                offset += 1;
                continue;
            }
            let index = self.consumed + offset;
            let opener = match self.peek_punct(offset)? {
                Some('#') if self.at_punct(offset + 1, '{')? => 2,
                Some('(' | '[') => 1,
                Some('{') if !open.is_empty() => 1,
                _ => 0,
            };
            if opener > 0 {
                match self.groups.get(&index).copied() {
                    Some(Some(close)) => offset = close + 1 - self.consumed,
                    Some(None) => break,
                    None => {
                        open.push(index);
                        offset += opener;
                    }
                }
                continue;
            }
            match self.peek_punct(offset)? {
                Some(')' | ']' | '}') => match open.pop() {
                    Some(opener) => {
                        self.groups.insert(opener, Some(index));
                    }
                    None => break,
                },
                Some('{') => {
                    let statement = if offset == 0 {
                        Statement::Plain
                    } else if hard_colon {
                        Statement::Declaration
                    } else {
                        Statement::Rule
                    };
                    trace!(?statement, offset, "scanned statement up to `{{`");
                    return Ok(statement);
                }
                Some(';') if open.is_empty() => break,
                Some(',') if open.is_empty() && scope == Scope::Parens => break,
                Some(':') if open.is_empty() && offset > 0 => {
                    colon = true;
                    let soft = self.at_pseudo_target(offset + 1)? || self.at_punct(offset + 1, ':')?;
                    hard_colon |= !soft;
                }
                _ => {}
            }
            offset += 1;
        }
        for opener in open {
            self.groups.insert(opener, None);
        }

        let statement = if colon {
            Statement::Declaration
        } else {
            Statement::Plain
        };
        trace!(?statement, offset, "scanned statement");
        return Ok(statement);
    }

    /// Next token ends a loose run of nodes in `scope`
    fn at_statement_end(&mut self, scope: Scope) -> Result<bool> {
        return Ok(match self.peek_punct(0)? {
            Some(';' | '{' | ')' | ']' | '}') => true,
            Some(',') => scope == Scope::Parens,
            Some(_) => false,
            None => self.at_eof()?,
        });
    }

    // ================
    // PARSE (consumes tokens)
    // ================

    fn bump(&mut self) -> Result<Node> {
        match self.lexer.next()? {
            Some(token) => {
                self.consumed += 1;
                return Ok(token);
            }
            None => return Err(self.lexer.fail("Unexpected end of input")),
        }
    }

    /// Parses the whole input into a `stylesheet` node.
    #[tracing::instrument(skip_all)]
    pub fn parse(mut self) -> Result<Node> {
        let children = self.parse_sequence(Scope::Root, None, Position::default())?;
        debug_assert!(self.lexer.eof());
        trace!(tokens = self.consumed, "parsed stylesheet");
        return Ok(Node::composite(Stylesheet, children, Position::default()));
    }

    /// Parses statements until `close` (left unconsumed) or the end of input.
    /// Reaching the end of input while a `close` is pending fails at `opened_at`.
    fn parse_sequence(
        &mut self,
        scope: Scope,
        close: Option<char>,
        opened_at: Position,
    ) -> Result<Vec<Node>> {
        let mut children = Vec::new();
        loop {
            if self.at_eof()? {
                return match close {
                    Some(c) => Err(self.lexer.fail_at(opened_at, format!("Expected \"{c}\""))),
                    None => Ok(children),
                };
            }
            match self.peek_punct(0)? {
                Some(c) if Some(c) == close => return Ok(children),
                Some(c @ (')' | ']' | '}')) => {
                    return Err(self.lexer.fail(format!("Unexpected \"{c}\"")));
                }
                _ => self.parse_statement(scope, &mut children)?,
            }
        }
    }

    fn parse_statement(&mut self, scope: Scope, out: &mut Vec<Node>) -> Result<()> {
        match self.peek_kind(0)? {
            Some(kind) if kind.is_trivia() => out.push(self.bump()?),
            Some(Atkeyword) => out.push(self.parse_atrule(scope)?),
            _ if self.at_punct(0, ';')? => out.push(self.bump()?),
            _ if scope == Scope::Parens && self.at_punct(0, ',')? => out.push(self.bump()?),
            _ => match self.scan_statement(scope)? {
                Statement::Rule => out.push(self.parse_rule()?),
                Statement::Declaration => out.push(self.parse_declaration(scope)?),
                Statement::Plain => {
                    let first = self.parse_atom(false)?;
                    let block = first.kind == Block;
                    out.push(first);
                    while !block && !self.at_statement_end(scope)? {
                        out.push(self.parse_atom(false)?);
                    }
                }
            },
        }
        return Ok(());
    }

    /// `selector block`
    #[tracing::instrument(level = "trace", skip_all)]
    fn parse_rule(&mut self) -> Result<Node> {
        let at = self.lexer.peek(0)?.map_or_else(Position::default, |t| t.start);
        let mut selector = Vec::new();
        while !self.at_punct(0, '{')? {
            selector.push(self.parse_atom(true)?);
        }
        let selector = Node::composite(Selector, selector, at);
        let block = self.parse_wrapped(Block, Scope::Block, '}')?;
        return Ok(Node::composite(Rule, vec![selector, block], at));
    }

    /// `property ":" value (";" | ",")?`, the value possibly ending in a block.
    #[tracing::instrument(level = "trace", skip_all)]
    fn parse_declaration(&mut self, scope: Scope) -> Result<Node> {
        let at = self.lexer.peek(0)?.map_or_else(Position::default, |t| t.start);

        let mut property = Vec::new();
        while !self.at_punct(0, ':')? {
            if self.at_eof()? {
                return Err(self.lexer.fail("Expected \":\""));
            }
            property.push(self.parse_atom(false)?);
        }
        let property = Node::composite(Property, property, at);
        let colon = self.bump()?;

        let mut value = Vec::new();
        let mut terminator = None;
        loop {
            if self.at_eof()? {
                break;
            }
            match self.peek_punct(0)? {
                Some(';') => {
                    terminator = Some(self.bump()?);
                    break;
                }
                Some(',') if scope == Scope::Parens => {
                    terminator = Some(self.bump()?);
                    break;
                }
                Some(')' | ']' | '}') => break,
                Some('{') => {
                    value.push(self.parse_wrapped(Block, Scope::Block, '}')?);
                    if self.at_punct(0, ';')? {
                        terminator = Some(self.bump()?);
                    }
                    break;
                }
                _ => value.push(self.parse_atom(false)?),
            }
        }
        let value = Node::composite(Value, value, colon.next);

        let mut children = vec![property, colon, value];
        children.extend(terminator);
        return Ok(Node::composite(Declaration, children, at));
    }

    /// `atkeyword (space* identifier arguments)? prelude* (";" | block)?`
    #[tracing::instrument(level = "trace", skip_all)]
    fn parse_atrule(&mut self, scope: Scope) -> Result<Node> {
        let keyword = self.bump()?;
        let at = keyword.start;
        let mut children = vec![keyword];

        let mut offset = 0;
        while self.peek_kind(offset)? == Some(Space) {
            offset += 1;
        }
        if self.peek_kind(offset)? == Some(Identifier) && self.at_punct(offset + 1, '(')? {
            for _ in 0..=offset {
                children.push(self.bump()?);
            }
            children.push(self.parse_wrapped(Arguments, Scope::Parens, ')')?);
        }

        loop {
            if self.at_eof()? {
                break;
            }
            match self.peek_punct(0)? {
                Some(';') => {
                    children.push(self.bump()?);
                    break;
                }
                Some('{') => {
                    children.push(self.parse_wrapped(Block, Scope::Block, '}')?);
                    break;
                }
                Some(')' | ']' | '}') => break,
                Some(',') if scope == Scope::Parens => break,
                _ => children.push(self.parse_atom(true)?),
            }
        }
        return Ok(Node::composite(Atrule, children, at));
    }

    /// Parses `open ... close` into a `kind` node that keeps only the inner nodes.
    /// The opener is the next token (`#{` for interpolation).
    fn parse_wrapped(&mut self, kind: NodeKind, scope: Scope, close: char) -> Result<Node> {
        let opener = self.bump()?;
        if self.depth == MAX_NESTING {
            return Err(self.lexer.fail_at(opener.start, "Nesting too deep"));
        }
        if kind == Interpolation {
            self.bump()?;
        }
        self.depth += 1;
        let children = self.parse_sequence(scope, Some(close), opener.start);
        self.depth -= 1;
        let children = children?;
        let closer = self.bump()?;
        return Ok(Node {
            kind,
            value: NodeValue::Children(children),
            start: opener.start,
            next: closer.next,
        });
    }

    /// One node of a selector, property or value run.
    ///
    /// With `selector` set, `:` and `::` followed by an identifier or an
    /// interpolation start pseudo classes and pseudo elements.
    fn parse_atom(&mut self, selector: bool) -> Result<Node> {
        if self.at_eof()? {
            return Err(self.lexer.fail("Unexpected end of input"));
        }
        if self.at_interpolation(0)? {
            let interpolation = self.parse_wrapped(Interpolation, Scope::Parens, '}')?;
            return self.maybe_function(interpolation);
        }
        match self.peek_punct(0)? {
            Some('#') if self.at_segment_start(1)? => return self.parse_compound(Id),
            Some('.') if self.at_segment_start(1)? => return self.parse_compound(Class),
            Some('(') => return self.parse_wrapped(Parentheses, Scope::Parens, ')'),
            Some('[') => return self.parse_wrapped(Attribute, Scope::Parens, ']'),
            Some('{') => return self.parse_wrapped(Block, Scope::Block, '}'),
            Some(c @ (')' | ']' | '}')) => {
                return Err(self.lexer.fail(format!("Unexpected \"{c}\"")));
            }
            Some(':') if selector => {
                if self.at_punct(1, ':')? && self.at_pseudo_target(2)? {
                    return self.parse_pseudo(PseudoElement, 2);
                }
                if self.at_pseudo_target(1)? {
                    return self.parse_pseudo(PseudoClass, 1);
                }
            }
            _ => {}
        }
        let token = self.bump()?;
        if token.kind == Identifier {
            return self.maybe_function(token);
        }
        return Ok(token);
    }

    fn at_segment_start(&mut self, offset: usize) -> Result<bool> {
        return Ok(self.peek_kind(offset)? == Some(Identifier) || self.at_interpolation(offset)?);
    }

    /// `.` or `#` followed by a run of identifiers, interpolations, `-` and numbers
    fn parse_compound(&mut self, kind: NodeKind) -> Result<Node> {
        let sigil = self.bump()?;
        let mut children = Vec::new();
        loop {
            if self.at_interpolation(0)? {
                children.push(self.parse_wrapped(Interpolation, Scope::Parens, '}')?);
                continue;
            }
            let leading_dot = self
                .lexer
                .peek(0)?
                .and_then(Node::text)
                .is_some_and(|text| text.starts_with('.'));
            let continues = match self.peek_kind(0)? {
                Some(Identifier) => true,
                Some(Number) => !children.is_empty() && !leading_dot,
                _ => !children.is_empty() && self.at_operator(0, "-")?,
            };
            if !continues {
                break;
            }
            children.push(self.bump()?);
        }
        let next = children.last().map_or(sigil.next, |c| c.next);
        return Ok(Node {
            kind,
            value: NodeValue::Children(children),
            start: sigil.start,
            next,
        });
    }

    /// `:target` or `::target`, where `prefix` is the number of colons
    fn parse_pseudo(&mut self, kind: NodeKind, prefix: usize) -> Result<Node> {
        let start = self.bump()?.start;
        for _ in 1..prefix {
            self.bump()?;
        }
        let target = if self.at_interpolation(0)? {
            self.parse_wrapped(Interpolation, Scope::Parens, '}')?
        } else {
            self.bump()?
        };
        let target = self.maybe_function(target)?;
        return Ok(Node {
            kind,
            start,
            next: target.next,
            value: NodeValue::Children(vec![target]),
        });
    }

    /// Wraps `caller` into a function when an argument list follows without a gap.
    fn maybe_function(&mut self, caller: Node) -> Result<Node> {
        if !self.at_punct(0, '(')? {
            return Ok(caller);
        }
        let at = caller.start;
        let arguments = self.parse_wrapped(Arguments, Scope::Parens, ')')?;
        return Ok(Node::composite(Function, vec![caller, arguments], at));
    }
}

fn punctuation_char(token: &Node) -> Option<char> {
    if token.kind != Punctuation {
        return None;
    }
    return token.text()?.chars().next();
}

#[cfg(test)]
mod test_scss_parser {
    use serde_json::{json, Value};

    use super::{Parser, Scope, Statement, MAX_NESTING};
    use crate::tokenizer::{cursor::Cursor, Lexer};

    fn ast(input: &str, expected: Value) {
        let tree = crate::parse(input).unwrap_or_else(|e| panic!("failed to parse `{input}`: {e}"));
        assert_eq!(
            tree.shape(),
            json!({ "type": "stylesheet", "value": expected }),
            "on input `{input}`"
        );
        assert_eq!(crate::stringify(&tree), input);
    }

    fn assert_error(input: &str, message: &str) {
        match crate::parse(input) {
            Ok(tree) => panic!("expected `{input}` to fail, got {}", tree.shape()),
            Err(err) => assert_eq!(err.to_string(), message, "on input `{input}`"),
        }
    }

    fn scan(input: &str, scope: Scope) -> Statement {
        let mut parser = Parser::new(Lexer::new(Cursor::new(input)));
        return parser.scan_statement(scope).unwrap();
    }

    fn tok(kind: &str, value: &str) -> Value {
        json!({ "type": kind, "value": value })
    }

    fn node(kind: &str, value: Vec<Value>) -> Value {
        json!({ "type": kind, "value": value })
    }

    fn ident(value: &str) -> Value {
        tok("identifier", value)
    }

    fn var(value: &str) -> Value {
        tok("variable", value)
    }

    fn punct(value: &str) -> Value {
        tok("punctuation", value)
    }

    fn space() -> Value {
        tok("space", " ")
    }

    fn class(value: &str) -> Value {
        node("class", vec![ident(value)])
    }

    fn empty_block() -> Value {
        node("block", vec![])
    }

    fn declaration(property: Vec<Value>, value: Vec<Value>, terminator: Option<&str>) -> Value {
        let mut children = vec![node("property", property), punct(":"), node("value", value)];
        children.extend(terminator.map(punct));
        node("declaration", children)
    }

    #[test]
    fn empty() {
        ast("", json!([]));
        ast("  \n", json!([tok("space", "  \n")]));
        ast("/* hi */", json!([tok("comment_multiline", " hi ")]));
    }

    #[test]
    fn function() {
        ast("fn()", json!([node("function", vec![ident("fn"), node("arguments", vec![])])]));
        ast(
            "fn($a)",
            json!([node("function", vec![ident("fn"), node("arguments", vec![var("a")])])]),
        );
        ast(
            "fn($a, $b)",
            json!([node(
                "function",
                vec![ident("fn"), node("arguments", vec![var("a"), punct(","), space(), var("b")])]
            )]),
        );
        ast(
            "hello(world($a))",
            json!([node(
                "function",
                vec![
                    ident("hello"),
                    node(
                        "arguments",
                        vec![node("function", vec![ident("world"), node("arguments", vec![var("a")])])]
                    )
                ]
            )]),
        );
        ast(
            "#{hello}($a)",
            json!([node(
                "function",
                vec![node("interpolation", vec![ident("hello")]), node("arguments", vec![var("a")])]
            )]),
        );
        // a gap means no call
        ast("fn ($a)", json!([ident("fn"), space(), node("parentheses", vec![var("a")])]));
    }

    #[test]
    fn interpolation() {
        ast("#{$a}", json!([node("interpolation", vec![var("a")])]));
        ast(
            "#{#{$a}}",
            json!([node("interpolation", vec![node("interpolation", vec![var("a")])])]),
        );
    }

    #[test]
    fn parentheses() {
        ast("($a)", json!([node("parentheses", vec![var("a")])]));
        ast("(($a))", json!([node("parentheses", vec![node("parentheses", vec![var("a")])])]));
    }

    #[test]
    fn attribute() {
        ast("[$a]", json!([node("attribute", vec![var("a")])]));
        ast("[[$a]]", json!([node("attribute", vec![node("attribute", vec![var("a")])])]));
    }

    #[test]
    fn class_and_id() {
        ast(".hello", json!([class("hello")]));
        ast(
            ".hello-#{$a}",
            json!([node("class", vec![ident("hello-"), node("interpolation", vec![var("a")])])]),
        );
        ast(
            ".hello-#{$a}-world",
            json!([node(
                "class",
                vec![
                    ident("hello-"),
                    node("interpolation", vec![var("a")]),
                    tok("operator", "-"),
                    ident("world")
                ]
            )]),
        );
        ast(".hello#world", json!([class("hello"), node("id", vec![ident("world")])]));
        ast("#hello", json!([node("id", vec![ident("hello")])]));
        ast(
            "#hello-#{$a}",
            json!([node("id", vec![ident("hello-"), node("interpolation", vec![var("a")])])]),
        );
        ast("##{$a}", json!([node("id", vec![node("interpolation", vec![var("a")])])]));
        ast(".a.b", json!([class("a"), class("b")]));
    }

    #[test]
    fn declaration_simple() {
        ast(
            "$color: red;",
            json!([declaration(vec![var("color")], vec![space(), ident("red")], Some(";"))]),
        );
        ast(
            "color:red",
            json!([declaration(vec![ident("color")], vec![ident("red")], None)]),
        );
        ast("a:;", json!([declaration(vec![ident("a")], vec![], Some(";"))]));
    }

    #[test]
    fn declaration_map() {
        ast(
            "$map: (\"foo\": \"bar\", \"hello\": rgba($a));",
            json!([declaration(
                vec![var("map")],
                vec![
                    space(),
                    node(
                        "parentheses",
                        vec![
                            declaration(
                                vec![tok("string_double", "foo")],
                                vec![space(), tok("string_double", "bar")],
                                Some(",")
                            ),
                            space(),
                            declaration(
                                vec![tok("string_double", "hello")],
                                vec![
                                    space(),
                                    node("function", vec![ident("rgba"), node("arguments", vec![var("a")])])
                                ],
                                None
                            ),
                        ]
                    )
                ],
                Some(";")
            )]),
        );
    }

    #[test]
    fn declaration_trailing_block() {
        let inner = node(
            "block",
            vec![
                space(),
                declaration(
                    vec![ident("top")],
                    vec![space(), tok("number", "2"), ident("px")],
                    Some(";"),
                ),
                space(),
            ],
        );
        let padding = declaration(
            vec![ident("padding")],
            vec![space(), tok("number", "1"), ident("px"), space(), inner],
            None,
        );
        ast("padding: 1px { top: 2px; }", json!([padding.clone()]));
        ast(
            ".a { padding: 1px { top: 2px; } }",
            json!([node(
                "rule",
                vec![
                    node("selector", vec![class("a"), space()]),
                    node("block", vec![space(), padding, space()])
                ]
            )]),
        );

        // a semicolon after the block still ends the declaration
        let tree = crate::parse("font: { family: x; };").unwrap();
        let children = tree.children()[0].children();
        assert_eq!(children.len(), 4);
        assert_eq!(children[3].text(), Some(";"));
    }

    #[test]
    fn rule() {
        ast(
            ".a {}",
            json!([node("rule", vec![node("selector", vec![class("a"), space()]), empty_block()])]),
        );
        ast(
            ".a { color: red; }",
            json!([node(
                "rule",
                vec![
                    node("selector", vec![class("a"), space()]),
                    node(
                        "block",
                        vec![
                            space(),
                            declaration(vec![ident("color")], vec![space(), ident("red")], Some(";")),
                            space()
                        ]
                    )
                ]
            )]),
        );
        ast(
            ".a { color: red; .b { color: blue; } }",
            json!([node(
                "rule",
                vec![
                    node("selector", vec![class("a"), space()]),
                    node(
                        "block",
                        vec![
                            space(),
                            declaration(vec![ident("color")], vec![space(), ident("red")], Some(";")),
                            space(),
                            node(
                                "rule",
                                vec![
                                    node("selector", vec![class("b"), space()]),
                                    node(
                                        "block",
                                        vec![
                                            space(),
                                            declaration(
                                                vec![ident("color")],
                                                vec![space(), ident("blue")],
                                                Some(";")
                                            ),
                                            space()
                                        ]
                                    )
                                ]
                            ),
                            space()
                        ]
                    )
                ]
            )]),
        );
    }

    #[test]
    fn rule_trailing_semicolon() {
        let rule = |name| node("rule", vec![node("selector", vec![class(name), space()]), empty_block()]);
        ast(".a {}; .b {}", json!([rule("a"), punct(";"), space(), rule("b")]));
    }

    #[test]
    fn rule_pseudo() {
        let pseudo = |name| node("pseudo_class", vec![ident(name)]);
        ast(
            ":hover {}",
            json!([node("rule", vec![node("selector", vec![pseudo("hover"), space()]), empty_block()])]),
        );
        ast(
            ".a:hover:active {}",
            json!([node(
                "rule",
                vec![
                    node("selector", vec![class("a"), pseudo("hover"), pseudo("active"), space()]),
                    empty_block()
                ]
            )]),
        );
        ast(
            ".a:hover:#{active} {}",
            json!([node(
                "rule",
                vec![
                    node(
                        "selector",
                        vec![
                            class("a"),
                            pseudo("hover"),
                            node("pseudo_class", vec![node("interpolation", vec![ident("active")])]),
                            space()
                        ]
                    ),
                    empty_block()
                ]
            )]),
        );
        ast(
            "a::before {}",
            json!([node(
                "rule",
                vec![
                    node("selector", vec![ident("a"), node("pseudo_element", vec![ident("before")]), space()]),
                    empty_block()
                ]
            )]),
        );
        ast(
            "&:not(.b){}",
            json!([node(
                "rule",
                vec![
                    node(
                        "selector",
                        vec![
                            tok("operator", "&"),
                            node(
                                "pseudo_class",
                                vec![node("function", vec![ident("not"), node("arguments", vec![class("b")])])]
                            )
                        ]
                    ),
                    empty_block()
                ]
            )]),
        );
    }

    #[test]
    fn atrule_include() {
        let head = || vec![tok("atkeyword", "include"), space(), ident("myMixin")];
        let with = |mut children: Vec<Value>, rest: Vec<Value>| {
            children.extend(rest);
            node("atrule", children)
        };

        ast("@include myMixin;", json!([with(head(), vec![punct(";")])]));
        ast(
            "@include myMixin($a);",
            json!([with(head(), vec![node("arguments", vec![var("a")]), punct(";")])]),
        );
        ast(
            "@include myMixin($a, $b: null);",
            json!([with(
                head(),
                vec![
                    node(
                        "arguments",
                        vec![
                            var("a"),
                            punct(","),
                            space(),
                            declaration(vec![var("b")], vec![space(), ident("null")], None)
                        ]
                    ),
                    punct(";")
                ]
            )]),
        );
        ast(
            "@include myMixin($a, $b: rgba($c) + 1);",
            json!([with(
                head(),
                vec![
                    node(
                        "arguments",
                        vec![
                            var("a"),
                            punct(","),
                            space(),
                            declaration(
                                vec![var("b")],
                                vec![
                                    space(),
                                    node("function", vec![ident("rgba"), node("arguments", vec![var("c")])]),
                                    space(),
                                    tok("operator", "+"),
                                    space(),
                                    tok("number", "1")
                                ],
                                None
                            )
                        ]
                    ),
                    punct(";")
                ]
            )]),
        );
    }

    #[test]
    fn atrule_mixin() {
        let color = || declaration(vec![ident("color")], vec![space(), ident("red")], Some(";"));
        let head = || vec![tok("atkeyword", "mixin"), space(), ident("myMixin")];
        let with = |mut children: Vec<Value>, rest: Vec<Value>| {
            children.extend(rest);
            node("atrule", children)
        };

        ast("@mixin myMixin { }", json!([with(head(), vec![space(), node("block", vec![space()])])]));
        ast(
            "@mixin myMixin { color: red; }",
            json!([with(head(), vec![space(), node("block", vec![space(), color(), space()])])]),
        );
        ast(
            "@mixin myMixin($a) { color: red; }",
            json!([with(
                head(),
                vec![
                    node("arguments", vec![var("a")]),
                    space(),
                    node("block", vec![space(), color(), space()])
                ]
            )]),
        );
        ast(
            "@mixin myMixin($a, $b: null) { color: red; }",
            json!([with(
                head(),
                vec![
                    node(
                        "arguments",
                        vec![
                            var("a"),
                            punct(","),
                            space(),
                            declaration(vec![var("b")], vec![space(), ident("null")], None)
                        ]
                    ),
                    space(),
                    node("block", vec![space(), color(), space()])
                ]
            )]),
        );
    }

    #[test]
    fn atrule_prelude() {
        ast(
            "@if $a == 0 {}",
            json!([node(
                "atrule",
                vec![
                    tok("atkeyword", "if"),
                    space(),
                    var("a"),
                    space(),
                    tok("operator", "=="),
                    space(),
                    tok("number", "0"),
                    space(),
                    empty_block()
                ]
            )]),
        );
        ast(
            "@extend .a:hover",
            json!([node(
                "atrule",
                vec![
                    tok("atkeyword", "extend"),
                    space(),
                    class("a"),
                    node("pseudo_class", vec![ident("hover")])
                ]
            )]),
        );
    }

    #[test]
    fn scan_decisions() {
        use Scope::*;
        assert_eq!(scan(".a {}", Block), Statement::Rule);
        assert_eq!(scan("a:hover {}", Block), Statement::Rule);
        assert_eq!(scan("a::before, b:#{$x} {}", Block), Statement::Rule);
        assert_eq!(scan(":hover {}", Root), Statement::Rule);
        assert_eq!(scan("padding: 1px {}", Root), Statement::Declaration);
        assert_eq!(scan("color:red;", Block), Statement::Declaration);
        assert_eq!(scan("color: red", Block), Statement::Declaration);
        assert_eq!(scan("$b: null)", Parens), Statement::Declaration);
        assert_eq!(scan("a: fn(x, y) {}", Root), Statement::Declaration);
        assert_eq!(scan("#{$p}: 1; b {}", Root), Statement::Declaration);
        assert_eq!(scan("$a, $b", Parens), Statement::Plain);
        assert_eq!(scan("$a, $b", Root), Statement::Plain);
        assert_eq!(scan("fn(a: b) c", Root), Statement::Plain);
        assert_eq!(scan("{}", Root), Statement::Plain);
        assert_eq!(scan("a b }", Block), Statement::Plain);
    }

    #[test]
    fn scan_remembers_groups() {
        let mut parser = Parser::new(Lexer::new(Cursor::new("fn(a, [b]) c (d")));
        assert_eq!(parser.scan_statement(Scope::Root).unwrap(), Statement::Plain);
        // fn ( a , sp [ b ] ) sp c sp ( d
        assert_eq!(parser.groups.get(&1), Some(&Some(8)));
        assert_eq!(parser.groups.get(&5), Some(&Some(7)));
        assert_eq!(parser.groups.get(&12), Some(&None));

        // the scan after `fn(a,` jumps over the remembered `[b]`
        for _ in 0..4 {
            parser.bump().unwrap();
        }
        assert_eq!(parser.scan_statement(Scope::Parens).unwrap(), Statement::Plain);
        assert_eq!(parser.groups.len(), 3);
    }

    #[test]
    fn block_statement_then_declaration() {
        ast(
            "{}a: b;",
            json!([empty_block(), declaration(vec![ident("a")], vec![space(), ident("b")], Some(";"))]),
        );
    }

    #[test]
    fn nesting_limit() {
        let nested = |n: usize| format!("a: {}{};", "(".repeat(n), ")".repeat(n));
        let deepest = nested(MAX_NESTING);
        assert_eq!(crate::stringify(&crate::parse(&deepest).unwrap()), deepest);
        assert_error(
            &nested(MAX_NESTING + 1),
            &format!("Nesting too deep (1:{})", 3 + MAX_NESTING),
        );
        assert_error("{".repeat(10_000).as_str(), &format!("Nesting too deep (1:{MAX_NESTING})"));
        assert!(crate::parse(&nested(10_000)).is_err());
    }

    #[test]
    fn errors() {
        assert_error(".a {", "Expected \"}\" (1:3)");
        assert_error("fn(1, 2", "Expected \")\" (1:2)");
        assert_error(".a {\n  b: fn(1, 2;\n}", "Unexpected \"}\" (3:0)");
        assert_error("#{$a", "Expected \"}\" (1:0)");
        assert_error("[a", "Expected \"]\" (1:0)");
        assert_error("a }", "Unexpected \"}\" (1:2)");
        assert_error("(a]", "Unexpected \"]\" (1:2)");
        assert_error(".a { b: \"c }", "Expected \"\"\" (1:8)");
        assert_error("a ` b", "Can't handle character: \"`\" (1:2)");
    }

    #[test]
    fn unquoted_url_with_scheme() {
        // `//` always starts a comment, which swallows the closing `)`
        assert_error("a: url(http://x.y/z);", "Expected \")\" (1:6)");
        ast(
            "url(\"http://x.y\")",
            json!([node("function", vec![ident("url"), node("arguments", vec![tok("string_double", "http://x.y")])])]),
        );
    }

    #[test]
    fn positions() {
        let tree = crate::parse(".a {\n  b: c;\n}").unwrap();
        let rule = &tree.children()[0];
        assert_eq!((rule.start.line, rule.start.column), (1, 0));
        assert_eq!((rule.next.line, rule.next.column), (3, 1));
        let block = &rule.children()[1];
        assert_eq!(block.start.cursor, 3);
        let declaration = &block.children()[1];
        assert_eq!((declaration.start.line, declaration.start.column), (2, 2));
        assert_eq!(declaration.next.cursor, 12);
        assert_eq!(tree.next.cursor, 14);
    }
}
