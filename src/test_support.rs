//! Test support for the reader, environments, and evaluator.
//!
//! Helpers here drive single environment operations under a trampoline and
//! expose the display form of parsed statements, so integration tests can
//! assert on the tree shape and on bindings without rebuilding the plumbing.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::Symbol;
use crate::cont::{amb, backtrack, continuation, done, finish, trampoline, Amb};
use crate::env::Environment;
use crate::eval::{EvalError, Interpreter, RunError, Value};
use crate::lexer::Lexer;
use crate::parser::Reader;

// ============================================================================
// Reader Inspection
// ============================================================================

/// Display forms of every statement in `input`
pub fn read_displays(input: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::new(Lexer::new(input), std::io::sink());
    let nodes = reader
        .read_all()
        .map_err(|e| format!("Parse error: {}", e))?;
    Ok(nodes.iter().map(|n| n.to_string()).collect())
}

/// Display form of the first statement in `input`
pub fn read_display(input: &str) -> Result<String, String> {
    let mut reader = Reader::new(Lexer::new(input), std::io::sink());
    match reader.read() {
        Ok(Some(node)) => Ok(node.to_string()),
        Ok(None) => Err("no statement".to_string()),
        Err(e) => Err(format!("Parse error: {}", e)),
    }
}

/// Read `input` and return the diagnostics written to the reader's sink
/// along with the first error.
pub fn read_diagnostics(input: &str) -> (String, Option<String>) {
    let mut reader = Reader::new(Lexer::new(input), Vec::new());
    let err = reader.read_all().err().map(|e| e.to_string());
    let out = reader.into_sink();
    (String::from_utf8_lossy(&out).into_owned(), err)
}

pub fn assert_reads_as(input: &str, expected: &str) {
    match read_display(input) {
        Ok(actual) => assert_eq!(
            actual, expected,
            "Tree mismatch for: {}\nExpected: {}\nActual: {}",
            input, expected, actual
        ),
        Err(e) => panic!("Reading failed for: {}\nError: {}", input, e),
    }
}

// ============================================================================
// Environment Operations
// ============================================================================

/// Look `name` up from `env`, forcing the lookup to completion
pub fn lookup_value(env: &Environment, name: &str) -> Result<Value, EvalError> {
    trampoline(env.lookup(Symbol::new(name), finish(), amb(|| done(Value::Bool(false)))))
}

/// Define `name` in `env` and return the undo continuation the definition
/// hands to its success continuation.
///
/// The failure continuation in effect at definition time yields `false`, so
/// running the undo with [`undo`] returns `Ok(Value::Bool(false))`.
pub fn define_value(env: &Environment, name: &str, value: Value) -> Result<Amb, EvalError> {
    let captured: Rc<RefCell<Option<Amb>>> = Rc::default();
    let slot = Rc::clone(&captured);
    let k = continuation(move |result, undo| {
        *slot.borrow_mut() = Some(undo);
        done(result)
    });
    trampoline(env.define(Symbol::new(name), value, k, amb(|| done(Value::Bool(false)))))?;
    let undo = captured.borrow_mut().take();
    undo.ok_or(EvalError::NoMoreAlternatives)
}

/// Run an undo continuation to completion
pub fn undo(undo: &Amb) -> Result<Value, EvalError> {
    trampoline(backtrack(undo))
}

// ============================================================================
// Evaluation Helpers
// ============================================================================

/// Run every statement of `input` in a fresh interpreter
pub fn run_program(input: &str) -> Result<Value, RunError> {
    Interpreter::new().run(input)
}

pub fn assert_eval_value(input: &str, expected: Value) {
    match run_program(input) {
        Ok(actual) => assert_eq!(
            actual, expected,
            "Value mismatch for: {}\nExpected: {:?}\nActual: {:?}",
            input, expected, actual
        ),
        Err(e) => panic!(
            "Evaluation failed for: {}\nExpected: {:?}\nError: {}",
            input, expected, e
        ),
    }
}

pub fn assert_eval_int(input: &str, expected: i64) {
    assert_eval_value(input, Value::Int(expected));
}

pub fn assert_eval_bool(input: &str, expected: bool) {
    assert_eval_value(input, Value::Bool(expected));
}

/// Assert that evaluation fails with an error accepted by `check`
pub fn assert_eval_error<F>(input: &str, check: F)
where
    F: FnOnce(&RunError) -> bool,
{
    match run_program(input) {
        Ok(v) => panic!("Expected error for: {}\nBut got value: {:?}", input, v),
        Err(e) => assert!(
            check(&e),
            "Error type mismatch for: {}\nActual error: {:?}",
            input,
            e
        ),
    }
}

// ============================================================================
// Test Macros
// ============================================================================

#[macro_export]
macro_rules! assert_evals_to_int {
    ($input:expr, $expected:expr) => {
        $crate::test_support::assert_eval_int($input, $expected)
    };
}

#[macro_export]
macro_rules! assert_reads_as {
    ($input:expr, $expected:expr) => {
        $crate::test_support::assert_reads_as($input, $expected)
    };
}
