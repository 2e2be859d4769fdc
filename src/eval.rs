//! Continuation-passing evaluator for Schist
//!
//! Every function here returns a [`Promise`]; nothing recurses through a
//! continuation directly. Continuations may be invoked more than once when a
//! `then` choice is retried, so captured state is cloned rather than mutated.

use std::fmt;
use std::io;
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{keywords, Literal, Node, NodeKind, Symbol};
use crate::builtins::{self, Builtin};
use crate::cont::{
    amb, backtrack, continuation, exhausted, finish, resume, suspend, Amb, Continuation, Promise,
    Trampoline,
};
use crate::env::Environment;
use crate::errors::{find_similar, render_eval_error, Colors};
use crate::lexer::Lexer;
use crate::parser::{ParseError, Reader};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("symbol not found: {0}")]
    SymbolNotFound(Symbol),
    #[error("symbol already defined: {0}")]
    SymbolAlreadyDefined(Symbol),
    #[error("type error: {0}")]
    TypeError(String),
    #[error("{name} expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("no more alternatives")]
    NoMoreAlternatives,
    #[error("evaluation exceeded {0} steps")]
    StepLimitExceeded(u64),
}

/// Anything that can stop `Interpreter::run`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Clone)]
pub enum Value {
    Int(i64),
    Str(Rc<str>),
    Bool(bool),
    Symbol(Symbol),
    List(Rc<[Value]>),
    Closure(Rc<Closure>),
    Builtin(Builtin),
}

pub struct Closure {
    pub params: Rc<[Symbol]>,
    pub body: Rc<[Node]>,
    pub env: Environment,
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(items.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Closure(_) | Value::Builtin(_) => "function",
        }
    }

    fn from_literal(lit: &Literal) -> Value {
        match lit {
            Literal::Int(n) => Value::Int(*n),
            Literal::Str(s) => Value::Str(Rc::from(s.as_str())),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Symbol(s) => Value::Symbol(s.clone()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s.escape_debug()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Closure(closure) => {
                let params: Vec<&str> = closure.params.iter().map(Symbol::as_str).collect();
                write!(f, "fn ({})", params.join(", "))
            }
            Value::Builtin(b) => write!(f, "<builtin {}>", b.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Closure(closure) => write!(f, "{} in {}", self, closure.env),
            _ => write!(f, "{}", self),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Continuation receiving every value of a left-to-right evaluation
type Collect = Rc<dyn Fn(Vec<Value>, Amb) -> Promise>;

/// Evaluate `node` in `env`, delivering its value to `k`.
pub fn eval(node: &Node, env: &Environment, k: Continuation, failure: Amb) -> Promise {
    match &node.node {
        NodeKind::Atom(Literal::Symbol(s)) if s.as_str() == keywords::BACK => backtrack(&failure),
        NodeKind::Atom(Literal::Symbol(s)) => env.lookup(s.clone(), k, failure),
        NodeKind::Atom(lit) => resume(&k, Value::from_literal(lit), failure),
        NodeKind::List(items) => {
            let collect: Collect = Rc::new(move |values: Vec<Value>, failure: Amb| {
                resume(&k, Value::list(values), failure)
            });
            eval_all(Rc::clone(items), 0, Vec::new(), env.clone(), collect, failure)
        }
        NodeKind::Block(stmts) => eval_sequence(Rc::clone(stmts), 0, env.clone(), k, failure),
        NodeKind::Apply { op, args } => match op.as_symbol().map(Symbol::as_str) {
            Some(keywords::DEFINE) => eval_define(args, env, k, failure),
            Some(keywords::FN) => eval_fn(args, env, k, failure),
            Some(keywords::IF) => eval_if(args, env, k, failure),
            Some(keywords::THEN) => eval_then(args, env, k, failure),
            Some(keywords::AND) => eval_logical(false, args, env, k, failure),
            Some(keywords::OR) => eval_logical(true, args, env, k, failure),
            _ => eval_application(op, args, env, k, failure),
        },
    }
}

/// Evaluate `nodes[index..]` left to right, appending to `values`.
fn eval_all(
    nodes: Rc<[Node]>,
    index: usize,
    values: Vec<Value>,
    env: Environment,
    k: Collect,
    failure: Amb,
) -> Promise {
    if index == nodes.len() {
        return suspend(move || k(values, failure));
    }
    let node = nodes[index].clone();
    let scope = env.clone();
    let next = continuation(move |value, failure| {
        let mut values = values.clone();
        values.push(value);
        eval_all(Rc::clone(&nodes), index + 1, values, env.clone(), Rc::clone(&k), failure)
    });
    eval(&node, &scope, next, failure)
}

/// Evaluate statements in order; the last one is in tail position.
fn eval_sequence(
    stmts: Rc<[Node]>,
    index: usize,
    env: Environment,
    k: Continuation,
    failure: Amb,
) -> Promise {
    if stmts.is_empty() {
        return resume(&k, Value::list(Vec::new()), failure);
    }
    let stmt = stmts[index].clone();
    if index + 1 == stmts.len() {
        return eval(&stmt, &env, k, failure);
    }
    let scope = env.clone();
    let next = continuation(move |_, failure| {
        eval_sequence(Rc::clone(&stmts), index + 1, env.clone(), Rc::clone(&k), failure)
    });
    eval(&stmt, &scope, next, failure)
}

fn malformed(form: &str) -> EvalError {
    EvalError::TypeError(format!("malformed {} form", form))
}

fn expect_args<'a>(form: &str, args: &'a [Node], count: usize) -> Result<&'a [Node], EvalError> {
    if args.len() == count {
        Ok(args)
    } else {
        Err(malformed(form))
    }
}

fn eval_define(args: &[Node], env: &Environment, k: Continuation, failure: Amb) -> Promise {
    let args = expect_args(keywords::DEFINE, args, 2)?;
    let name = args[0].as_symbol().cloned().ok_or_else(|| malformed(keywords::DEFINE))?;
    let target = env.clone();
    let bind = continuation(move |value, failure| {
        target.define(name.clone(), value, Rc::clone(&k), failure)
    });
    eval(&args[1], env, bind, failure)
}

fn eval_fn(args: &[Node], env: &Environment, k: Continuation, failure: Amb) -> Promise {
    let args = expect_args(keywords::FN, args, 2)?;
    let (NodeKind::List(params), NodeKind::Block(body)) = (&args[0].node, &args[1].node) else {
        return Err(malformed(keywords::FN));
    };
    let params = params
        .iter()
        .map(|p| p.as_symbol().cloned().ok_or_else(|| malformed(keywords::FN)))
        .collect::<Result<Vec<_>, _>>()?;
    let closure = Closure {
        params: params.into(),
        body: Rc::clone(body),
        env: env.clone(),
    };
    resume(&k, Value::Closure(Rc::new(closure)), failure)
}

fn eval_if(args: &[Node], env: &Environment, k: Continuation, failure: Amb) -> Promise {
    let args = expect_args(keywords::IF, args, 3)?;
    let (consequent, alternative) = (args[1].clone(), args[2].clone());
    let scope = env.clone();
    let choose = continuation(move |test, failure| match test {
        Value::Bool(true) => eval(&consequent, &scope, Rc::clone(&k), failure),
        Value::Bool(false) => eval(&alternative, &scope, Rc::clone(&k), failure),
        other => Err(EvalError::TypeError(format!(
            "if condition must be a boolean, found {}",
            other.type_name()
        ))),
    });
    eval(&args[0], env, choose, failure)
}

/// `a then b`: evaluate `a`; if anything downstream backtracks, evaluate `b`
/// with the failure continuation that was current before the choice.
fn eval_then(args: &[Node], env: &Environment, k: Continuation, failure: Amb) -> Promise {
    let args = expect_args(keywords::THEN, args, 2)?;
    let second = args[1].clone();
    let scope = env.clone();
    let retry_k = Rc::clone(&k);
    let retry = amb(move || eval(&second, &scope, Rc::clone(&retry_k), Rc::clone(&failure)));
    eval(&args[0], env, k, retry)
}

/// Short-circuit `and` (`short_on == false`) and `or` (`short_on == true`).
fn eval_logical(
    short_on: bool,
    args: &[Node],
    env: &Environment,
    k: Continuation,
    failure: Amb,
) -> Promise {
    let form = if short_on { keywords::OR } else { keywords::AND };
    let args = expect_args(form, args, 2)?;
    let right = args[1].clone();
    let scope = env.clone();
    let next = continuation(move |left, failure| match left {
        Value::Bool(b) if b == short_on => resume(&k, Value::Bool(b), failure),
        Value::Bool(_) => {
            let check = continuation({
                let k = Rc::clone(&k);
                move |right, failure| match right {
                    Value::Bool(_) => resume(&k, right, failure),
                    other => Err(EvalError::TypeError(format!(
                        "{} expects booleans, found {}",
                        form,
                        other.type_name()
                    ))),
                }
            });
            eval(&right, &scope, check, failure)
        }
        other => Err(EvalError::TypeError(format!(
            "{} expects booleans, found {}",
            form,
            other.type_name()
        ))),
    });
    eval(&args[0], env, next, failure)
}

fn eval_application(
    op: &Rc<Node>,
    args: &Rc<[Node]>,
    env: &Environment,
    k: Continuation,
    failure: Amb,
) -> Promise {
    let args = Rc::clone(args);
    let scope = env.clone();
    let with_func = continuation(move |func, failure| {
        let k = Rc::clone(&k);
        let call: Collect = Rc::new(move |values: Vec<Value>, failure: Amb| {
            apply(&func, values, Rc::clone(&k), failure)
        });
        eval_all(Rc::clone(&args), 0, Vec::new(), scope.clone(), call, failure)
    });
    eval(op, env, with_func, failure)
}

/// Apply a function value to already-evaluated arguments.
pub fn apply(func: &Value, args: Vec<Value>, k: Continuation, failure: Amb) -> Promise {
    match func {
        Value::Closure(closure) => {
            if closure.params.len() != args.len() {
                return Err(EvalError::Arity {
                    name: func.to_string(),
                    expected: closure.params.len(),
                    found: args.len(),
                });
            }
            let frame = closure
                .env
                .extend(closure.params.iter().cloned().zip(args));
            eval_sequence(Rc::clone(&closure.body), 0, frame, k, failure)
        }
        Value::Builtin(builtin) => {
            let value = builtin.apply(&args)?;
            resume(&k, value, failure)
        }
        other => Err(EvalError::TypeError(format!(
            "cannot apply a {}",
            other.type_name()
        ))),
    }
}

// ============================================================================
// Interpreter
// ============================================================================

/// Owns a global frame and evaluates top-level statements one at a time.
pub struct Interpreter {
    global: Environment,
    step_limit: Option<u64>,
    last_steps: u64,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            global: Environment::root().extend(builtins::bindings()),
            step_limit: None,
            last_steps: 0,
        }
    }

    /// Abort any single statement that takes more than `limit` steps.
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn global(&self) -> &Environment {
        &self.global
    }

    /// Trampoline bounces taken by the statement most recently evaluated
    pub fn steps(&self) -> u64 {
        self.last_steps
    }

    /// Evaluate one statement. Exhausting every alternative is reported as
    /// `NoMoreAlternatives`.
    pub fn eval(&mut self, node: &Node) -> Result<Value, EvalError> {
        let mut driver = match self.step_limit {
            Some(limit) => Trampoline::with_limit(limit),
            None => Trampoline::new(),
        };
        let result = driver.run(eval(node, &self.global, finish(), exhausted()));
        self.last_steps = driver.steps();
        result
    }

    /// Read and evaluate every statement of `source`, returning the value of
    /// the last one. Syntax diagnostics are discarded.
    pub fn run(&mut self, source: &str) -> Result<Value, RunError> {
        self.run_with(source, io::sink())
    }

    /// As [`Interpreter::run`], writing syntax diagnostics to `sink`.
    pub fn run_with<W: io::Write>(&mut self, source: &str, sink: W) -> Result<Value, RunError> {
        let mut reader = Reader::new(Lexer::new(source), sink);
        let mut last = Value::list(Vec::new());
        while let Some(node) = reader.read()? {
            last = self.eval(&node)?;
        }
        Ok(last)
    }

    /// Render a runtime error, suggesting visible names for unbound symbols.
    pub fn describe(&self, err: &EvalError, colors: &Colors) -> String {
        let suggestions = match err {
            EvalError::SymbolNotFound(name) => {
                let visible = self.global.visible_symbols();
                find_similar(name.as_str(), visible.iter().map(Symbol::as_str), 2)
            }
            _ => Vec::new(),
        };
        render_eval_error(err, &suggestions, colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Result<Value, RunError> {
        Interpreter::new().run(source)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("1 + 2 * 3;").unwrap(), Value::Int(7));
        assert_eq!(run("-(2 - 5);").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_define_and_lookup() {
        assert_eq!(run("define x = 4; x * x;").unwrap(), Value::Int(16));
    }

    #[test]
    fn test_closure_captures_defining_scope() {
        let source = "
            define adder = fn (n) { fn (x) { x + n; }; };
            define add2 = adder(2);
            add2(40);
        ";
        assert_eq!(run(source).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_if_requires_boolean() {
        assert!(matches!(
            run("if (1) { 2; } else { 3; }"),
            Err(RunError::Eval(EvalError::TypeError(_)))
        ));
    }

    #[test]
    fn test_short_circuit() {
        // the right operand would be a type error if evaluated
        assert_eq!(run("false and 1;").unwrap(), Value::Bool(false));
        assert_eq!(run("true or 1;").unwrap(), Value::Bool(true));
        assert!(run("true and 1;").is_err());
    }

    #[test]
    fn test_then_picks_first_alternative() {
        assert_eq!(run("1 then 2;").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_back_retries_next_alternative() {
        let source = "{ define x = 1 then 2 then 3; if (x < 3) { back; } else { x; } }";
        assert_eq!(run(source).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_bare_back_exhausts() {
        assert_eq!(
            run("back;").unwrap_err(),
            RunError::Eval(EvalError::NoMoreAlternatives)
        );
    }

    #[test]
    fn test_applying_non_function() {
        assert!(matches!(
            run("1(2);"),
            Err(RunError::Eval(EvalError::TypeError(_)))
        ));
    }

    #[test]
    fn test_closure_arity() {
        assert!(matches!(
            run("fn (a, b) { a; }(1);"),
            Err(RunError::Eval(EvalError::Arity { expected: 2, found: 1, .. }))
        ));
    }

    #[test]
    fn test_describe_suggests_names() {
        let interp = Interpreter::new();
        let err = EvalError::SymbolNotFound(Symbol::new("lenght"));
        let text = interp.describe(&err, &Colors::new(false));
        assert!(text.contains("Did you mean length?"));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(run("[1, 2] @@ [3];").unwrap().to_string(), "[1, 2, 3]");
        assert_eq!(run("fn (a, b) { a; };").unwrap().to_string(), "fn (a, b)");
        assert_eq!(run("\"hi\";").unwrap().to_string(), "\"hi\"");
    }
}
