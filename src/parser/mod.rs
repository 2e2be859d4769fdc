//! Precedence-climbing reader for Schist
//!
//! [`Reader::read`] returns one top-level statement per call, pulling tokens
//! from the lexer only as it needs them. Binary operators are resolved from an
//! [`OperatorTable`]; prefix operators and application are fixed.
//!
//! # Module Structure
//!
//! - `cursor` - Token stream navigation and lookahead
//! - `combinators` - Reusable list-parsing patterns
//! - `error` - Error types with source location tracking

pub mod combinators;
pub mod cursor;
pub mod error;

pub use combinators::Combinators;
pub use cursor::TokenCursor;
pub use error::{ParseError, ParseResult};

use std::io::Write;
use std::rc::Rc;

use crate::ast::{keywords, Literal, Node, NodeKind, SourceMap, Span, Spanned};
use crate::errors::{render_parse_error, render_warning, ErrorConfig, Warning};
use crate::lexer::{Lexer, Token};
use crate::operators::{OpInfo, OperatorTable};

/// Operator table and diagnostic settings for a [`Reader`]
#[derive(Debug, Clone, Default)]
pub struct ReaderConfig {
    pub operators: OperatorTable,
    pub errors: ErrorConfig,
    warnings: Vec<Warning>,
}

impl ReaderConfig {
    pub fn new(errors: ErrorConfig) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }

    /// Re-level an operator. Shadowing a built-in is allowed but produces a
    /// warning, which the reader writes to its sink when constructed.
    pub fn register_operator(&mut self, op: &str, info: OpInfo) -> Option<Warning> {
        let warning = self.operators.register(op, info);
        if let Some(w) = &warning {
            self.warnings.push(w.clone());
        }
        warning
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

pub struct Reader<'a, W: Write> {
    cursor: TokenCursor<'a>,
    sink: W,
    config: ReaderConfig,
    source_map: SourceMap,
}

impl<'a, W: Write> Combinators<'a> for Reader<'a, W> {
    fn cursor(&mut self) -> &mut TokenCursor<'a> {
        &mut self.cursor
    }
}

impl<'a, W: Write> Reader<'a, W> {
    /// A reader with the built-in operator table that writes plain-text
    /// diagnostics to `sink`.
    pub fn new(lexer: Lexer<'a>, sink: W) -> Self {
        Self::with_config(lexer, sink, ReaderConfig::default())
    }

    pub fn with_config(lexer: Lexer<'a>, sink: W, config: ReaderConfig) -> Self {
        let source_map = SourceMap::new(lexer.source());
        let mut reader = Self {
            cursor: TokenCursor::new(lexer),
            sink,
            config,
            source_map,
        };
        for warning in reader.config.warnings.clone() {
            let text = render_warning(&warning, &reader.config.errors.colors);
            let _ = writeln!(reader.sink, "{}", text);
        }
        reader
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn into_sink(self) -> W {
        self.sink
    }

    // ========================================================================
    // Public entry points
    // ========================================================================

    /// Read the next top-level statement, or `None` at end of input.
    ///
    /// A lexical or syntax error is written to the sink and returned. The
    /// reader is left at the offending token; call
    /// [`Reader::skip_statement`] to continue with the next statement.
    pub fn read(&mut self) -> ParseResult<Option<Node>> {
        match self.read_statement() {
            Ok(node) => Ok(node),
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Read statements until end of input, stopping at the first error.
    pub fn read_all(&mut self) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(node) = self.read()? {
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Discard input through the next `;`.
    pub fn skip_statement(&mut self) {
        self.cursor.skip_past_semicolon();
    }

    fn report(&mut self, err: &ParseError) {
        let text = render_parse_error(err, &self.source_map, &self.config.errors);
        // the error itself is returned to the caller either way
        let _ = writeln!(self.sink, "{}", text);
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn read_statement(&mut self) -> ParseResult<Option<Node>> {
        while self.cursor.match_token(&Token::Semicolon)? {}
        if self.cursor.is_at_end()? {
            return Ok(None);
        }
        let stmt = self.parse_statement()?;
        if !stmt.ends_with_block() {
            self.cursor.consume(Token::Semicolon)?;
        } else {
            self.cursor.match_token(&Token::Semicolon)?;
        }
        Ok(Some(stmt))
    }

    /// A statement without its terminator
    fn parse_statement(&mut self) -> ParseResult<Node> {
        let tok = self.cursor.peek()?.clone();
        match tok {
            Token::Define => self.parse_define(),
            Token::Fn if matches!(self.cursor.peek_nth(1)?, Token::Ident(_)) => {
                self.parse_named_fn()
            }
            Token::If => self.parse_if(),
            Token::LBrace => self.parse_block(),
            _ => self.parse_expr(0),
        }
    }

    /// `define name = expr`
    fn parse_define(&mut self) -> ParseResult<Node> {
        let kw = self.cursor.consume(Token::Define)?;
        let name = self.parse_ident()?;
        self.cursor.consume(Token::Eq)?;
        let value = self.parse_expr(0)?;
        let span = kw.span.merge(&value.span);
        Ok(Node::apply(
            Node::symbol(keywords::DEFINE, kw.span),
            vec![name, value],
            span,
        ))
    }

    /// `fn name(params) { body }`, read as `define name = fn (params) { body }`
    fn parse_named_fn(&mut self) -> ParseResult<Node> {
        let kw = self.cursor.consume(Token::Fn)?;
        let name = self.parse_ident()?;
        let func = self.parse_fn_rest(kw.span.clone())?;
        let span = kw.span.merge(&func.span);
        Ok(Node::apply(
            Node::symbol(keywords::DEFINE, kw.span),
            vec![name, func],
            span,
        ))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Binary operators at or above `min_prec`
    pub fn parse_expr(&mut self, min_prec: u16) -> ParseResult<Node> {
        let mut left = self.parse_unary()?;

        loop {
            let (op, info) = match self.peek_binary()? {
                Some(found) => found,
                None => break,
            };

            if u16::from(info.precedence) < min_prec {
                break;
            }

            let op_tok = self.cursor.advance()?;
            let right = self.parse_expr(info.right_binding())?;
            let span = left.span.merge(&right.span);
            left = Node::apply(Node::symbol(op, op_tok.span), vec![left, right], span);
        }

        Ok(left)
    }

    /// The current token as a binary operator known to the table
    fn peek_binary(&mut self) -> ParseResult<Option<(&'static str, OpInfo)>> {
        let op = match self.cursor.peek()?.binary_symbol() {
            Some(op) => op,
            None => return Ok(None),
        };
        Ok(self.config.operators.get(op).cloned().map(|info| (op, info)))
    }

    fn parse_unary(&mut self) -> ParseResult<Node> {
        let prefix = self.cursor.peek()?.prefix_symbol();
        match prefix {
            Some(op) => {
                let op_tok = self.cursor.advance()?;
                let operand = self.parse_unary()?;
                let span = op_tok.span.merge(&operand.span);
                Ok(Node::apply(Node::symbol(op, op_tok.span), vec![operand], span))
            }
            None => self.parse_postfix(),
        }
    }

    /// A primary followed by any number of argument lists
    fn parse_postfix(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_primary()?;

        while self.cursor.check(&Token::LParen)? {
            let args =
                self.delimited_list(Token::LParen, |p| p.parse_expr(0), &Token::Comma, Token::RParen)?;
            let span = expr.span.merge(&self.cursor.previous_span());
            expr = Node::apply(expr, args, span);
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Node> {
        let tok = self.cursor.peek()?.clone();
        match tok {
            Token::Int(n) => {
                let tok = self.cursor.advance()?;
                Ok(Node::atom(Literal::Int(n), tok.span))
            }
            Token::String(s) => {
                let tok = self.cursor.advance()?;
                Ok(Node::atom(Literal::Str(s), tok.span))
            }
            Token::True | Token::False => {
                let tok = self.cursor.advance()?;
                Ok(Node::atom(Literal::Bool(tok.token == Token::True), tok.span))
            }
            Token::Ident(_) => self.parse_ident(),
            Token::Back => {
                let tok = self.cursor.advance()?;
                Ok(Node::symbol(keywords::BACK, tok.span))
            }
            Token::LParen => {
                self.cursor.advance()?;
                let inner = self.parse_expr(0)?;
                self.cursor.consume(Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => {
                let start = self.cursor.current_span();
                let items = self.delimited_list(
                    Token::LBracket,
                    |p| p.parse_expr(0),
                    &Token::Comma,
                    Token::RBracket,
                )?;
                let span = start.merge(&self.cursor.previous_span());
                Ok(Spanned::new(NodeKind::List(items.into()), span))
            }
            Token::LBrace => self.parse_block(),
            Token::Fn => {
                let kw = self.cursor.advance()?;
                self.parse_fn_rest(kw.span)
            }
            Token::If => self.parse_if(),
            _ => Err(self.cursor.unexpected("expression")),
        }
    }

    /// `{ stmt; stmt; }`
    fn parse_block(&mut self) -> ParseResult<Node> {
        let open = self.cursor.consume(Token::LBrace)?;
        let stmts = self.terminated_list(
            |p| p.parse_statement(),
            &Token::Semicolon,
            &Token::RBrace,
            Node::ends_with_block,
        )?;
        let close = self.cursor.consume(Token::RBrace)?;
        Ok(Spanned::new(
            NodeKind::Block(stmts.into()),
            open.span.merge(&close.span),
        ))
    }

    /// `(params) { body }` after the `fn` keyword (and name, if any)
    fn parse_fn_rest(&mut self, kw_span: Span) -> ParseResult<Node> {
        let params_start = self.cursor.current_span();
        let params = self.delimited_list(
            Token::LParen,
            |p| p.parse_ident(),
            &Token::Comma,
            Token::RParen,
        )?;
        let params_span = params_start.merge(&self.cursor.previous_span());
        let params = Spanned::new(NodeKind::List(params.into()), params_span);
        let body = self.parse_block()?;
        let span = kw_span.merge(&body.span);
        Ok(Node::apply(
            Node::symbol(keywords::FN, kw_span),
            vec![params, body],
            span,
        ))
    }

    /// `if (cond) { .. } else { .. }`; `else if` chains nest, and a missing
    /// `else` reads as an empty block.
    fn parse_if(&mut self) -> ParseResult<Node> {
        let kw = self.cursor.consume(Token::If)?;
        self.cursor.consume(Token::LParen)?;
        let cond = self.parse_expr(0)?;
        self.cursor.consume(Token::RParen)?;
        let consequent = self.parse_block()?;

        let alternative = if self.cursor.match_token(&Token::Else)? {
            if self.cursor.check(&Token::If)? {
                self.parse_if()?
            } else {
                self.parse_block()?
            }
        } else {
            let end = consequent.span.end;
            Spanned::new(NodeKind::Block(Rc::from(Vec::new())), Span::new(end, end))
        };

        let span = kw.span.merge(&alternative.span);
        Ok(Node::apply(
            Node::symbol(keywords::IF, kw.span),
            vec![cond, consequent, alternative],
            span,
        ))
    }

    fn parse_ident(&mut self) -> ParseResult<Node> {
        let tok = self.cursor.peek()?.clone();
        match tok {
            Token::Ident(name) => {
                let tok = self.cursor.advance()?;
                Ok(Node::symbol(&name, tok.span))
            }
            _ => Err(self.cursor.unexpected("identifier")),
        }
    }
}
