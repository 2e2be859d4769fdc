//! Schist - a small expression language evaluated in continuation-passing
//! style, with reversible definitions and `then`/`back` backtracking

pub mod ast;
pub mod builtins;
pub mod cont;
pub mod env;
pub mod errors;
pub mod eval;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod test_support;

pub use ast::{Node, NodeKind, Position, SourceMap, Span, Symbol};
pub use cont::{trampoline, Amb, Continuation, Promise, Step, Trampoline};
pub use env::Environment;
pub use errors::{
    find_similar, format_header, format_location, format_snippet, format_suggestions,
    levenshtein_distance, Colors, ErrorConfig, Warning,
};
pub use eval::{EvalError, Interpreter, RunError, Value};
pub use lexer::Lexer;
pub use operators::{Associativity, OpInfo, OperatorTable};
pub use parser::{ParseError, Reader, ReaderConfig};
