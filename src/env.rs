//! Lexical environments with reversible definition.
//!
//! An [`Environment`] is either the terminal root or a [`Frame`] linked to its
//! parent. Lookups walk the chain outward one trampoline bounce per frame.
//! Definitions go into the receiving frame only, and each successful
//! definition hands its success continuation an undo failure continuation
//! that removes the binding before resuming the failure continuation that
//! was current when the definition was made.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::Symbol;
use crate::cont::{amb, backtrack, resume, suspend, Amb, Continuation, Promise};
use crate::eval::{EvalError, Value};

/// Source of frame numbers for one environment tree. Numbers are diagnostic
/// only; they take no part in lookup or equality.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter(Rc<Cell<usize>>);

impl FrameCounter {
    fn next(&self) -> usize {
        let n = self.0.get() + 1;
        self.0.set(n);
        n
    }

    /// Number of frames created so far
    pub fn count(&self) -> usize {
        self.0.get()
    }
}

#[derive(Clone)]
pub enum Environment {
    /// Terminal environment: nothing is bound here
    Root(FrameCounter),
    Frame(Rc<Frame>),
}

pub struct Frame {
    number: usize,
    parent: Environment,
    bindings: RefCell<HashMap<Symbol, Value>>,
    counter: FrameCounter,
}

impl Environment {
    /// A fresh root with its own frame counter
    pub fn root() -> Self {
        Environment::Root(FrameCounter::default())
    }

    fn counter(&self) -> &FrameCounter {
        match self {
            Environment::Root(counter) => counter,
            Environment::Frame(frame) => &frame.counter,
        }
    }

    /// Diagnostic number: 0 for the root, otherwise creation order.
    pub fn number(&self) -> usize {
        match self {
            Environment::Root(_) => 0,
            Environment::Frame(frame) => frame.number,
        }
    }

    pub fn parent(&self) -> Option<&Environment> {
        match self {
            Environment::Root(_) => None,
            Environment::Frame(frame) => Some(&frame.parent),
        }
    }

    pub fn frames_created(&self) -> usize {
        self.counter().count()
    }

    /// A new child frame pre-populated with `bindings`. Later duplicates in
    /// `bindings` replace earlier ones.
    pub fn extend(&self, bindings: impl IntoIterator<Item = (Symbol, Value)>) -> Environment {
        let counter = self.counter().clone();
        Environment::Frame(Rc::new(Frame {
            number: counter.next(),
            parent: self.clone(),
            bindings: RefCell::new(bindings.into_iter().collect()),
            counter,
        }))
    }

    /// Find `symbol` and pass its value to `success`.
    ///
    /// Absence is not backtrackable: reaching the root fails with
    /// `SymbolNotFound` rather than invoking `failure`.
    pub fn lookup(&self, symbol: Symbol, success: Continuation, failure: Amb) -> Promise {
        match self {
            Environment::Root(_) => Err(EvalError::SymbolNotFound(symbol)),
            Environment::Frame(frame) => {
                let found = frame.bindings.borrow().get(&symbol).cloned();
                match found {
                    Some(value) => resume(&success, value, failure),
                    None => {
                        let parent = frame.parent.clone();
                        suspend(move || parent.lookup(symbol, success, failure))
                    }
                }
            }
        }
    }

    /// Bind `symbol` in this frame and pass the symbol to `success` along
    /// with an undo failure continuation.
    ///
    /// Redefining a name already bound in this same frame is a hard
    /// `SymbolAlreadyDefined` error. On the root this is a no-op that
    /// resumes `success` with the caller's `failure`.
    pub fn define(
        &self,
        symbol: Symbol,
        value: Value,
        success: Continuation,
        failure: Amb,
    ) -> Promise {
        let frame = match self {
            Environment::Root(_) => return resume(&success, Value::Symbol(symbol), failure),
            Environment::Frame(frame) => frame,
        };

        if frame.bindings.borrow().contains_key(&symbol) {
            return Err(EvalError::SymbolAlreadyDefined(symbol));
        }
        frame.bindings.borrow_mut().insert(symbol.clone(), value);

        let owner = Rc::clone(frame);
        let bound = symbol.clone();
        let undo = amb(move || {
            owner.bindings.borrow_mut().remove(&bound);
            backtrack(&failure)
        });
        resume(&success, Value::Symbol(symbol), undo)
    }

    /// True if `symbol` is bound in this frame itself (parents not consulted)
    pub fn binds_locally(&self, symbol: &Symbol) -> bool {
        match self {
            Environment::Root(_) => false,
            Environment::Frame(frame) => frame.bindings.borrow().contains_key(symbol),
        }
    }

    /// Every name visible from here, innermost frame first, without
    /// duplicates.
    pub fn visible_symbols(&self) -> Vec<Symbol> {
        let mut seen = Vec::new();
        let mut env = self;
        while let Environment::Frame(frame) = env {
            let mut names: Vec<Symbol> = frame.bindings.borrow().keys().cloned().collect();
            names.sort();
            for name in names {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
            env = &frame.parent;
        }
        seen
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Root(_) => f.write_str("<0>"),
            Environment::Frame(frame) => write!(f, "<{}> -> {}", frame.number, frame.parent),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment({})", self)
    }
}
