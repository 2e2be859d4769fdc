//! Negative reader tests - malformed input that should be rejected
//!
//! These tests verify that the reader rejects invalid syntax, reports it to
//! its diagnostic sink, and can be resumed at the next statement.

use schist::errors::ErrorConfig;
use schist::lexer::{LexError, Lexer, Token};
use schist::parser::{ParseError, Reader, ReaderConfig};
use schist::test_support::read_diagnostics;

/// Read every statement and expect failure
fn read_fails(input: &str) -> ParseError {
    let mut reader = Reader::new(Lexer::new(input), std::io::sink());
    match reader.read_all() {
        Ok(nodes) => panic!("expected parse error for: {} (read {} nodes)", input, nodes.len()),
        Err(e) => e,
    }
}

fn should_fail(input: &str) {
    let mut reader = Reader::new(Lexer::new(input), std::io::sink());
    assert!(reader.read_all().is_err(), "expected parse error for: {}", input);
}

// ============================================================================
// Malformed expressions
// ============================================================================

mod expressions {
    use super::*;

    #[test]
    fn missing_operand() {
        let err = read_fails("1 + ;");
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { found: Token::Semicolon, ref expected, .. } if expected == "expression"
        ));
    }

    #[test]
    fn missing_operand_at_end() {
        assert!(matches!(read_fails("1 +"), ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn double_operator() {
        should_fail("1 * * 2;");
    }

    #[test]
    fn prefix_without_operand() {
        should_fail("not;");
    }

    #[test]
    fn unclosed_paren() {
        assert!(matches!(
            read_fails("(1 + 2;"),
            ParseError::UnexpectedToken { found: Token::Semicolon, ref expected, .. } if expected == "')'"
        ));
    }

    #[test]
    fn extra_paren() {
        should_fail("1 + 2);");
    }

    #[test]
    fn unclosed_argument_list() {
        should_fail("f(a, b;");
    }

    #[test]
    fn trailing_comma_in_arguments() {
        should_fail("f(a,);");
    }

    #[test]
    fn unclosed_list() {
        should_fail("[1, 2;");
    }

    #[test]
    fn keyword_in_operand_position() {
        should_fail("1 + else;");
    }
}

// ============================================================================
// Malformed statements
// ============================================================================

mod statements {
    use super::*;

    #[test]
    fn missing_semicolon() {
        assert!(matches!(
            read_fails("a b;"),
            ParseError::UnexpectedToken { found: Token::Ident(_), ref expected, .. } if expected == "';'"
        ));
    }

    #[test]
    fn missing_final_semicolon() {
        assert!(matches!(read_fails("a + b"), ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn define_without_equals() {
        should_fail("define x 1;");
    }

    #[test]
    fn define_without_value() {
        should_fail("define x = ;");
    }

    #[test]
    fn define_is_not_an_expression() {
        should_fail("1 + define x = 2;");
    }

    #[test]
    fn fn_parameters_must_be_names() {
        should_fail("fn (1) { 1; };");
    }

    #[test]
    fn fn_requires_block_body() {
        should_fail("fn (x) x;");
    }

    #[test]
    fn if_requires_parenthesized_condition() {
        should_fail("if x { 1; }");
    }

    #[test]
    fn unclosed_block() {
        assert!(matches!(read_fails("{ a; b;"), ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn statement_in_block_needs_semicolon() {
        should_fail("{ a b; }");
    }
}

// ============================================================================
// Lexical errors
// ============================================================================

mod lexical {
    use super::*;

    #[test]
    fn invalid_character() {
        assert!(matches!(
            read_fails("a # b;"),
            ParseError::Lex(LexError::UnexpectedChar('#', _))
        ));
    }

    #[test]
    fn unterminated_string() {
        assert!(matches!(
            read_fails("\"abc;"),
            ParseError::Lex(LexError::UnterminatedString(_))
        ));
    }

    #[test]
    fn earlier_statements_still_read() {
        let mut reader = Reader::new(Lexer::new("a; b $"), std::io::sink());
        assert_eq!(reader.read().unwrap().unwrap().to_string(), "a");
        assert!(matches!(reader.read(), Err(ParseError::Lex(_))));
    }
}

// ============================================================================
// Diagnostics and recovery
// ============================================================================

mod diagnostics {
    use super::*;

    #[test]
    fn syntax_error_is_written_to_sink() {
        let (text, err) = read_diagnostics("define x = 1;\nfoo + ;\n");
        let err = err.expect("second statement should fail");
        assert!(err.contains("expected expression"));
        assert!(text.contains("SYNTAX ERROR"));
        assert!(text.contains("2:7"));
        assert!(text.contains("foo + ;"));
    }

    #[test]
    fn lexical_error_is_labelled() {
        let (text, _) = read_diagnostics("a $;");
        assert!(text.contains("LEXICAL ERROR"));
    }

    #[test]
    fn nothing_is_written_for_valid_input() {
        let (text, err) = read_diagnostics("a; b;");
        assert!(err.is_none());
        assert!(text.is_empty());
    }

    #[test]
    fn filename_appears_in_location() {
        let config = ReaderConfig::new(ErrorConfig::new(false).with_filename("demo.sch"));
        let mut out = Vec::new();
        let mut reader = Reader::with_config(Lexer::new("(a;"), &mut out, config);
        assert!(reader.read().is_err());
        drop(reader);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("demo.sch:1:3"));
    }

    #[test]
    fn skip_statement_resumes_after_error() {
        let mut reader = Reader::new(Lexer::new("1 + ; 2 * * 3; 4;"), std::io::sink());
        assert!(reader.read().is_err());
        reader.skip_statement();
        assert!(reader.read().is_err());
        reader.skip_statement();
        assert_eq!(reader.read().unwrap().unwrap().to_string(), "4");
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn failed_read_stops_at_offending_token() {
        let mut reader = Reader::new(Lexer::new("a b;"), std::io::sink());
        assert!(reader.read().is_err());
        assert_eq!(reader.read().unwrap().unwrap().to_string(), "b");
    }

    #[test]
    fn skip_statement_passes_lexical_errors() {
        let mut reader = Reader::new(Lexer::new("a $ $ b; c;"), std::io::sink());
        assert!(reader.read().is_err());
        reader.skip_statement();
        assert_eq!(reader.read().unwrap().unwrap().to_string(), "c");
    }
}
