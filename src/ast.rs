//! Syntax tree for Schist
//!
//! The reader produces a uniform prefix tree: every compound form is an
//! [`NodeKind::Apply`] holding an operator (or function-position node) and its
//! ordered operands. The `Display` form `op[arg, arg]` is what tests and
//! diagnostics compare against.

use std::fmt;
use std::rc::Rc;

/// Reserved words that appear as operators of special forms.
pub mod keywords {
    pub const DEFINE: &str = "define";
    pub const FN: &str = "fn";
    pub const IF: &str = "if";
    pub const THEN: &str = "then";
    pub const AND: &str = "and";
    pub const OR: &str = "or";
    pub const BACK: &str = "back";
}

/// Byte range in the source text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// 1-indexed line and column (columns count characters, not bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets back to line:column positions.
#[derive(Debug, Clone)]
pub struct SourceMap {
    source: String,
    /// Byte offset at which each line begins
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source: source.to_string(),
            line_starts,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    pub fn position(&self, byte_offset: usize) -> Position {
        let offset = byte_offset.min(self.source.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = self.source[line_start..offset].chars().count() + 1;
        Position::new(line_idx + 1, column)
    }

    /// Text of a 1-indexed line without its terminator
    pub fn line(&self, line_num: usize) -> Option<&str> {
        if line_num == 0 || line_num > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line_num - 1];
        let end = self
            .line_starts
            .get(line_num)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches('\r'))
    }

    pub fn span_text(&self, span: &Span) -> &str {
        let end = span.end.min(self.source.len());
        &self.source[span.start.min(end)..end]
    }
}

/// An identifier. Two symbols are equal exactly when their names are.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol(Rc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}", self.0)
    }
}

/// A node together with where it came from
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}

pub type Node = Spanned<NodeKind>;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Str(String),
    Bool(bool),
    Symbol(Symbol),
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Atom(Literal),
    /// Operator or function position applied to operands
    Apply { op: Rc<Node>, args: Rc<[Node]> },
    /// `[a, b, c]`
    List(Rc<[Node]>),
    /// `{ a; b; }`
    Block(Rc<[Node]>),
}

impl Node {
    pub fn atom(literal: Literal, span: Span) -> Node {
        Spanned::new(NodeKind::Atom(literal), span)
    }

    pub fn symbol(name: &str, span: Span) -> Node {
        Node::atom(Literal::Symbol(Symbol::new(name)), span)
    }

    pub fn apply(op: Node, args: Vec<Node>, span: Span) -> Node {
        Spanned::new(
            NodeKind::Apply {
                op: Rc::new(op),
                args: args.into(),
            },
            span,
        )
    }

    /// The symbol named by this node, if it is a bare symbol atom
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match &self.node {
            NodeKind::Atom(Literal::Symbol(s)) => Some(s),
            _ => None,
        }
    }

    /// True for nodes whose source text ends in a closing brace, which lets a
    /// statement omit its trailing `;`.
    pub fn ends_with_block(&self) -> bool {
        match &self.node {
            NodeKind::Block(_) => true,
            NodeKind::Apply { op, args } => {
                let special = op.as_symbol().map_or(false, |s| {
                    matches!(s.as_str(), keywords::DEFINE | keywords::FN | keywords::IF)
                });
                special && args.last().map_or(false, Node::ends_with_block)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "\"{}\"", s.escape_debug()),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Symbol(s) => write!(f, "{}", s),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Node], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Atom(lit) => write!(f, "{}", lit),
            NodeKind::Apply { op, args } => {
                write!(f, "{}[", op)?;
                write_joined(f, args, ", ")?;
                f.write_str("]")
            }
            NodeKind::List(items) => {
                f.write_str("[")?;
                write_joined(f, items, ", ")?;
                f.write_str("]")
            }
            NodeKind::Block(items) => {
                f.write_str("{")?;
                write_joined(f, items, "; ")?;
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Node {
        Node::symbol(name, Span::default())
    }

    fn int(n: i64) -> Node {
        Node::atom(Literal::Int(n), Span::default())
    }

    #[test]
    fn test_apply_display() {
        let inner = Node::apply(sym("*"), vec![int(2), int(3)], Span::default());
        let outer = Node::apply(sym("+"), vec![int(1), inner], Span::default());
        assert_eq!(outer.to_string(), "+[1, *[2, 3]]");
    }

    #[test]
    fn test_application_of_compound_operator() {
        let then = Node::apply(sym("then"), vec![sym("foo"), sym("bar")], Span::default());
        let app = Node::apply(then, vec![sym("baz")], Span::default());
        assert_eq!(app.to_string(), "then[foo, bar][baz]");
    }

    #[test]
    fn test_empty_application() {
        let app = Node::apply(sym("f"), vec![], Span::default());
        assert_eq!(app.to_string(), "f[]");
    }

    #[test]
    fn test_string_literal_is_quoted() {
        let node = Node::atom(Literal::Str("a\"b".into()), Span::default());
        assert_eq!(node.to_string(), "\"a\\\"b\"");
    }

    #[test]
    fn test_symbols_compare_by_name() {
        assert_eq!(Symbol::new("x"), Symbol::from("x"));
        assert_ne!(Symbol::new("x"), Symbol::new("y"));
    }

    #[test]
    fn test_source_map_positions() {
        let map = SourceMap::new("ab\ncd\n");
        assert_eq!(map.position(0), Position::new(1, 1));
        assert_eq!(map.position(4), Position::new(2, 2));
        assert_eq!(map.line(2), Some("cd"));
        assert_eq!(map.line(9), None);
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.span_text(&Span::new(3, 5)), "cd");
    }

    #[test]
    fn test_source_map_clamps_past_end() {
        let map = SourceMap::new("x;");
        assert_eq!(map.position(50), Position::new(1, 3));
    }
}
