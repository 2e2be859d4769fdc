//! Reader tests - tree shapes produced for well-formed statements
//!
//! Every expectation compares the display form `op[arg, ...]`.

use schist::lexer::Lexer;
use schist::parser::Reader;
use schist::test_support::{assert_reads_as, read_displays};

// ============================================================================
// Precedence and associativity
// ============================================================================

mod precedence {
    use super::*;

    #[test]
    fn multiplication_binds_tighter() {
        assert_reads_as("1 + 2 * 3;", "+[1, *[2, 3]]");
    }

    #[test]
    fn addition_groups_left() {
        assert_reads_as("1 + 2 + 3;", "+[+[1, 2], 3]");
    }

    #[test]
    fn multiplicative_family_groups_left() {
        assert_reads_as("1 / 2 * 3 % 4;", "%[*[/[1, 2], 3], 4]");
    }

    #[test]
    fn then_groups_right() {
        assert_reads_as("a then b then c;", "then[a, then[b, c]]");
    }

    #[test]
    fn cons_family_groups_right() {
        assert_reads_as("a @ b @@ c;", "@[a, @@[b, c]]");
    }

    #[test]
    fn logical_operators_share_a_level() {
        assert_reads_as("a and b or c xor d;", "xor[or[and[a, b], c], d]");
    }

    #[test]
    fn then_is_loosest() {
        assert_reads_as("x == 1 then y;", "then[==[x, 1], y]");
    }

    #[test]
    fn cons_is_looser_than_arithmetic() {
        assert_reads_as("1 + 2 @ xs;", "@[+[1, 2], xs]");
    }

    #[test]
    fn parentheses_reset_precedence() {
        assert_reads_as("(1 + 2) * 3;", "*[+[1, 2], 3]");
        assert_reads_as("((a));", "a");
    }
}

// ============================================================================
// Prefix operators and application
// ============================================================================

mod prefix_and_application {
    use super::*;

    #[test]
    fn not_nests() {
        assert_reads_as("not not a;", "not[not[a]]");
    }

    #[test]
    fn not_binds_tighter_than_binary() {
        assert_reads_as("not a and b;", "and[not[a], b]");
    }

    #[test]
    fn unary_minus() {
        assert_reads_as("-a + b;", "+[-[a], b]");
        assert_reads_as("- -a;", "-[-[a]]");
    }

    #[test]
    fn prefix_operand_may_be_an_application() {
        assert_reads_as("not f(x);", "not[f[x]]");
    }

    #[test]
    fn single_argument() {
        assert_reads_as("foo(bar);", "foo[bar]");
    }

    #[test]
    fn several_arguments() {
        assert_reads_as("f(1, a + b, []);", "f[1, +[a, b], []]");
    }

    #[test]
    fn no_arguments() {
        assert_reads_as("f();", "f[]");
    }

    #[test]
    fn chained_application() {
        assert_reads_as("foo(a)(b);", "foo[a][b]");
    }

    #[test]
    fn application_of_parenthesized_expression() {
        assert_reads_as("(foo then bar)(baz);", "then[foo, bar][baz]");
    }

    #[test]
    fn application_binds_tighter_than_then() {
        assert_reads_as("foo then bar(baz);", "then[foo, bar[baz]]");
    }
}

// ============================================================================
// Statements and special forms
// ============================================================================

mod statements {
    use super::*;

    #[test]
    fn bare_literal() {
        assert_reads_as("1;", "1");
    }

    #[test]
    fn define() {
        assert_reads_as("define x = 1 then 2;", "define[x, then[1, 2]]");
    }

    #[test]
    fn anonymous_function() {
        assert_reads_as(
            "define double = fn (x) { x + x; };",
            "define[double, fn[[x], {+[x, x]}]]",
        );
    }

    #[test]
    fn unterminated_function_literal_takes_following_arguments() {
        // without the `;` the parenthesized group is an application
        assert_eq!(
            read_displays("define f = fn (x) { x; } (g)(1);").unwrap(),
            vec!["define[f, fn[[x], {x}][g][1]]"]
        );
        assert_eq!(
            read_displays("define f = fn (x) { x; }; (g)(1);").unwrap(),
            vec!["define[f, fn[[x], {x}]]", "g[1]"]
        );
    }

    #[test]
    fn named_function() {
        assert_reads_as(
            "fn add(a, b) { a + b; }",
            "define[add, fn[[a, b], {+[a, b]}]]",
        );
    }

    #[test]
    fn if_else() {
        assert_reads_as(
            "if (x < 3) { back; } else { x; }",
            "if[<[x, 3], {back}, {x}]",
        );
    }

    #[test]
    fn if_as_expression() {
        assert_reads_as(
            "define y = if (a) { 1; } else { 2; };",
            "define[y, if[a, {1}, {2}]]",
        );
    }

    #[test]
    fn nested_blocks() {
        assert_reads_as("{ a; { b; } c; }", "{a; {b}; c}");
    }

    #[test]
    fn string_and_booleans() {
        assert_reads_as("[\"a\\n\", true, false];", "[\"a\\n\", true, false]");
    }
}

// ============================================================================
// Multi-statement input
// ============================================================================

#[test]
fn statements_are_read_one_per_call() {
    let mut reader = Reader::new(Lexer::new("1 + 2 * 3;\n5 + 4;"), std::io::sink());
    let first = reader.read().unwrap().unwrap();
    assert_eq!(first.to_string(), "+[1, *[2, 3]]");
    let second = reader.read().unwrap().unwrap();
    assert_eq!(second.to_string(), "+[5, 4]");
    assert!(reader.read().unwrap().is_none());
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn block_terminated_statements_need_no_semicolon() {
    let source = "
        fn double(x) { x * 2; }
        double(2);
        if (a) { b; } else { c; }
        d;
    ";
    assert_eq!(
        read_displays(source).unwrap(),
        vec![
            "define[double, fn[[x], {*[x, 2]}]]",
            "double[2]",
            "if[a, {b}, {c}]",
            "d",
        ]
    );
}

#[test]
fn comments_are_ignored() {
    assert_eq!(
        read_displays("// leading\na; // trailing\n// only a comment").unwrap(),
        vec!["a"]
    );
}

#[test]
fn empty_input_reads_nothing() {
    assert_eq!(read_displays("  \n\t").unwrap(), Vec::<String>::new());
}
