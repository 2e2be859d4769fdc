//! Handwritten lexer for Schist
//!
//! Tokens are produced on demand: the reader pulls one at a time through
//! [`Lexer::next_token`] or the `Iterator` impl, so a syntax error in one
//! statement never forces the rest of the input to be scanned.

use crate::ast::Span;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Int(i64),
    String(String),
    True,
    False,

    Ident(String),

    // Keywords
    Define,
    Fn,
    If,
    Else,
    Back,

    // Word operators
    Then,
    And,
    Or,
    Xor,
    Not,

    // Delimiters
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    LBrace,    // {
    RBrace,    // }
    Comma,     // ,
    Semicolon, // ;
    Eq,        // =

    // Symbolic operators
    EqEq,    // ==
    Neq,     // !=
    Lt,      // <
    Gt,      // >
    Lte,     // <=
    Gte,     // >=
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    At,      // @
    AtAt,    // @@

    Eof,
}

impl Token {
    /// Lexeme of a token that can sit between two operands
    pub fn binary_symbol(&self) -> Option<&'static str> {
        let op = match self {
            Token::Then => "then",
            Token::And => "and",
            Token::Or => "or",
            Token::Xor => "xor",
            Token::EqEq => "==",
            Token::Neq => "!=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Lte => "<=",
            Token::Gte => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::At => "@",
            Token::AtAt => "@@",
            _ => return None,
        };
        Some(op)
    }

    /// Lexeme of a token that can prefix a single operand
    pub fn prefix_symbol(&self) -> Option<&'static str> {
        match self {
            Token::Not => Some("not"),
            Token::Minus => Some("-"),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = self.binary_symbol().or_else(|| self.prefix_symbol()) {
            return write!(f, "'{}'", op);
        }
        let text = match self {
            Token::Int(n) => return write!(f, "number {}", n),
            Token::String(s) => return write!(f, "string \"{}\"", s.escape_debug()),
            Token::Ident(name) => return write!(f, "identifier '{}'", name),
            Token::True => "'true'",
            Token::False => "'false'",
            Token::Define => "'define'",
            Token::Fn => "'fn'",
            Token::If => "'if'",
            Token::Else => "'else'",
            Token::Back => "'back'",
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::Comma => "','",
            Token::Semicolon => "';'",
            Token::Eq => "'='",
            Token::Eof => "end of input",
            _ => "operator",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character: {0:?}")]
    UnexpectedChar(char, Span),
    #[error("unterminated string")]
    UnterminatedString(Span),
    #[error("invalid escape sequence: \\{0}")]
    InvalidEscape(char, Span),
    #[error("invalid number: {0}")]
    InvalidNumber(String, Span),
}

impl LexError {
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedChar(_, span) => span,
            LexError::UnterminatedString(span) => span,
            LexError::InvalidEscape(_, span) => span,
            LexError::InvalidNumber(_, span) => span,
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    pos: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            pos: 0,
            finished: false,
        }
    }

    pub fn source(&self) -> &'a str {
        self.input
    }

    /// Scan the whole input eagerly, stopping at the first error.
    pub fn tokenize(self) -> Result<Vec<SpannedToken>, LexError> {
        self.collect()
    }

    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_second(&self) -> Option<char> {
        self.input[self.pos..].chars().nth(1)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.advance() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce the next token. Once the input is exhausted every call
    /// returns `Token::Eof`.
    pub fn next_token(&mut self) -> Result<SpannedToken, LexError> {
        self.skip_trivia();
        let start = self.pos;

        let Some(c) = self.advance() else {
            return Ok(SpannedToken {
                token: Token::Eof,
                span: Span::new(start, start),
            });
        };

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '=' => self.follow('=', Token::EqEq, Token::Eq),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::Neq
                } else {
                    return Err(LexError::UnexpectedChar('!', Span::new(start, self.pos)));
                }
            }
            '<' => self.follow('=', Token::Lte, Token::Lt),
            '>' => self.follow('=', Token::Gte, Token::Gt),
            '@' => self.follow('@', Token::AtAt, Token::At),
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '"' => self.lex_string(start)?,
            c if c.is_ascii_digit() => self.lex_number(c, start)?,
            c if c.is_alphabetic() || c == '_' => self.lex_ident(c),
            _ => return Err(LexError::UnexpectedChar(c, Span::new(start, self.pos))),
        };

        Ok(SpannedToken {
            token,
            span: Span::new(start, self.pos),
        })
    }

    /// Two-character operator if `next` follows, otherwise the single one
    fn follow(&mut self, next: char, double: Token, single: Token) -> Token {
        if self.peek() == Some(next) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<Token, LexError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => {
                    let escaped = match self.advance() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(c) => {
                            return Err(LexError::InvalidEscape(c, Span::new(start, self.pos)))
                        }
                        None => {
                            return Err(LexError::UnterminatedString(Span::new(start, self.pos)))
                        }
                    };
                    s.push(escaped);
                }
                Some(c) => s.push(c),
                None => return Err(LexError::UnterminatedString(Span::new(start, self.pos))),
            }
        }
        Ok(Token::String(s))
    }

    fn lex_number(&mut self, first: char, start: usize) -> Result<Token, LexError> {
        let mut s = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        // `12abc` is neither a number nor an identifier
        if self.peek().map_or(false, is_ident_continue) {
            while let Some(c) = self.peek() {
                if !is_ident_continue(c) {
                    break;
                }
                s.push(c);
                self.advance();
            }
            return Err(LexError::InvalidNumber(s, Span::new(start, self.pos)));
        }
        s.parse()
            .map(Token::Int)
            .map_err(|_| LexError::InvalidNumber(s.clone(), Span::new(start, self.pos)))
    }

    fn lex_ident(&mut self, first: char) -> Token {
        let mut s = String::from(first);
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match s.as_str() {
            "define" => Token::Define,
            "fn" => Token::Fn,
            "if" => Token::If,
            "else" => Token::Else,
            "back" => Token::Back,
            "then" => Token::Then,
            "and" => Token::And,
            "or" => Token::Or,
            "xor" => Token::Xor,
            "not" => Token::Not,
            "true" => Token::True,
            "false" => Token::False,
            _ => Token::Ident(s),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<SpannedToken, LexError>;

    /// Yields every token up to and including a single `Eof`, then `None`.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let tok = self.next_token();
        if matches!(&tok, Ok(t) if t.token == Token::Eof) {
            self.finished = true;
        }
        Some(tok)
    }
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
