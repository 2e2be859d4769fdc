//! Reusable list-parsing patterns

use crate::lexer::Token;

use super::cursor::TokenCursor;
use super::error::ParseResult;

/// Anything that parses from a [`TokenCursor`] can use these helpers.
pub trait Combinators<'a>: Sized {
    fn cursor(&mut self) -> &mut TokenCursor<'a>;

    /// `open item (sep item)* close`, possibly empty; no trailing separator
    fn delimited_list<T, F>(
        &mut self,
        open: Token,
        mut parse_item: F,
        separator: &Token,
        close: Token,
    ) -> ParseResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> ParseResult<T>,
    {
        self.cursor().consume(open)?;
        let mut items = Vec::new();
        if self.cursor().match_token(&close)? {
            return Ok(items);
        }
        loop {
            items.push(parse_item(self)?);
            if !self.cursor().match_token(separator)? {
                break;
            }
        }
        self.cursor().consume(close)?;
        Ok(items)
    }

    /// Items each followed by `terminator` until `close`. The terminator may
    /// be skipped after an item for which `self_terminated` holds.
    fn terminated_list<T, F, P>(
        &mut self,
        mut parse_item: F,
        terminator: &Token,
        close: &Token,
        self_terminated: P,
    ) -> ParseResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> ParseResult<T>,
        P: Fn(&T) -> bool,
    {
        let mut items = Vec::new();
        while !self.cursor().check(close)? {
            let item = parse_item(self)?;
            if !self.cursor().match_token(terminator)? && !self_terminated(&item) {
                return Err(self.cursor().unexpected(&terminator.to_string()));
            }
            items.push(item);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    struct Numbers<'a>(TokenCursor<'a>);

    impl<'a> Combinators<'a> for Numbers<'a> {
        fn cursor(&mut self) -> &mut TokenCursor<'a> {
            &mut self.0
        }
    }

    fn number(p: &mut Numbers<'_>) -> ParseResult<i64> {
        match p.0.advance()?.token {
            Token::Int(n) => Ok(n),
            _ => Err(p.0.unexpected("number")),
        }
    }

    fn numbers(input: &str) -> Numbers<'_> {
        Numbers(TokenCursor::new(Lexer::new(input)))
    }

    #[test]
    fn test_delimited_list() {
        let items = numbers("(1, 2, 3)")
            .delimited_list(Token::LParen, number, &Token::Comma, Token::RParen)
            .unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_delimited_list() {
        let items = numbers("[]")
            .delimited_list(Token::LBracket, number, &Token::Comma, Token::RBracket)
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_unclosed_delimited_list() {
        let result = numbers("(1, 2")
            .delimited_list(Token::LParen, number, &Token::Comma, Token::RParen);
        assert!(result.is_err());
    }

    #[test]
    fn test_terminated_list() {
        let mut p = numbers("1; 2; }");
        let items = p
            .terminated_list(number, &Token::Semicolon, &Token::RBrace, |_| false)
            .unwrap();
        assert_eq!(items, vec![1, 2]);
        assert!(p.0.check(&Token::RBrace).unwrap());
    }

    #[test]
    fn test_terminated_list_requires_terminator() {
        let result = numbers("1 2 }")
            .terminated_list(number, &Token::Semicolon, &Token::RBrace, |_| false);
        assert!(result.is_err());
    }
}
