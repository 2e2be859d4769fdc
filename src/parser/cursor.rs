//! Pull-based token cursor with lookahead
//!
//! Tokens are requested from the lexer only as lookahead demands them, so a
//! lexical error surfaces at the point the reader reaches it.

use std::collections::VecDeque;

use crate::ast::Span;
use crate::lexer::{Lexer, SpannedToken, Token};

use super::error::{ParseError, ParseResult};

pub struct TokenCursor<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<SpannedToken>,
    previous: Option<SpannedToken>,
}

impl<'a> TokenCursor<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            lookahead: VecDeque::new(),
            previous: None,
        }
    }

    pub fn source(&self) -> &'a str {
        self.lexer.source()
    }

    /// Make sure at least `n + 1` tokens are buffered
    fn fill(&mut self, n: usize) -> ParseResult<()> {
        while self.lookahead.len() <= n {
            let tok = self.lexer.next_token()?;
            self.lookahead.push_back(tok);
        }
        Ok(())
    }

    // ========================================================================
    // Lookahead
    // ========================================================================

    pub fn peek(&mut self) -> ParseResult<&Token> {
        self.peek_nth(0)
    }

    /// Token `n` positions ahead (0 = current)
    pub fn peek_nth(&mut self, n: usize) -> ParseResult<&Token> {
        self.fill(n)?;
        Ok(&self.lookahead[n].token)
    }

    /// Span of the current token, or an empty span just past the previous
    /// one when nothing is buffered
    pub fn current_span(&self) -> Span {
        match (self.lookahead.front(), &self.previous) {
            (Some(tok), _) => tok.span.clone(),
            (None, Some(prev)) => Span::new(prev.span.end, prev.span.end),
            (None, None) => Span::default(),
        }
    }

    pub fn previous_span(&self) -> Span {
        self.previous
            .as_ref()
            .map(|t| t.span.clone())
            .unwrap_or_default()
    }

    pub fn is_at_end(&mut self) -> ParseResult<bool> {
        Ok(matches!(self.peek()?, Token::Eof))
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    /// Consume the current token. `Eof` is never consumed.
    pub fn advance(&mut self) -> ParseResult<SpannedToken> {
        self.fill(0)?;
        let tok = self
            .lookahead
            .pop_front()
            .ok_or_else(|| ParseError::eof("token", self.current_span()))?;
        if tok.token == Token::Eof {
            self.lookahead.push_front(tok.clone());
        }
        self.previous = Some(tok.clone());
        Ok(tok)
    }

    pub fn check(&mut self, token: &Token) -> ParseResult<bool> {
        Ok(self.peek()? == token)
    }

    /// If the current token matches, consume it and return true
    pub fn match_token(&mut self, token: &Token) -> ParseResult<bool> {
        if self.check(token)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn consume(&mut self, expected: Token) -> ParseResult<SpannedToken> {
        if self.check(&expected)? {
            self.advance()
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    /// Error describing the current token. Call after a successful peek.
    pub fn unexpected(&self, expected: &str) -> ParseError {
        match self.lookahead.front() {
            Some(tok) if tok.token != Token::Eof => {
                ParseError::unexpected(expected, tok.token.clone(), tok.span.clone())
            }
            _ => ParseError::eof(expected, self.current_span()),
        }
    }

    /// Drop buffered tokens and skip input through the next `;` or to the
    /// end. Lexical errors met on the way are skipped too.
    pub fn skip_past_semicolon(&mut self) {
        loop {
            match self.advance() {
                Ok(tok) if matches!(tok.token, Token::Semicolon | Token::Eof) => break,
                Ok(_) | Err(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(input: &str) -> TokenCursor<'_> {
        TokenCursor::new(Lexer::new(input))
    }

    #[test]
    fn test_basic_navigation() {
        let mut c = cursor("define x = 42;");
        assert!(c.check(&Token::Define).unwrap());
        c.advance().unwrap();
        assert!(matches!(c.peek().unwrap(), Token::Ident(s) if s == "x"));
        c.advance().unwrap();
        assert!(c.check(&Token::Eq).unwrap());
    }

    #[test]
    fn test_lookahead() {
        let mut c = cursor("a b c");
        assert!(matches!(c.peek_nth(2).unwrap(), Token::Ident(s) if s == "c"));
        assert!(matches!(c.peek_nth(3).unwrap(), Token::Eof));
        assert!(matches!(c.peek().unwrap(), Token::Ident(s) if s == "a"));
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut c = cursor("a");
        c.advance().unwrap();
        assert_eq!(c.advance().unwrap().token, Token::Eof);
        assert_eq!(c.advance().unwrap().token, Token::Eof);
        assert!(c.is_at_end().unwrap());
    }

    #[test]
    fn test_lex_errors_surface_when_reached() {
        let mut c = cursor("a $");
        assert!(c.match_token(&Token::Ident("a".into())).unwrap());
        assert!(matches!(c.peek(), Err(ParseError::Lex(_))));
    }

    #[test]
    fn test_consume_reports_expected() {
        let mut c = cursor("x");
        let err = c.consume(Token::Semicolon).unwrap_err();
        assert_eq!(err.to_string(), "unexpected token: expected ';', found identifier 'x'");
    }

    #[test]
    fn test_skip_past_semicolon() {
        let mut c = cursor("1 $ 2; 3");
        c.skip_past_semicolon();
        assert_eq!(c.peek().unwrap(), &Token::Int(3));
    }
}
