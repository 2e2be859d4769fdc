//! Continuations, failure continuations, and the trampoline that drives them.
//!
//! Every evaluation step has the shape `step(.., success, failure) -> Promise`.
//! `success` receives the produced value together with the failure
//! continuation that is current at that point; `failure` abandons the current
//! branch and resumes the most recently pushed alternative.
//!
//! A [`Promise`] is never a nested call: it is either the final value or a
//! suspended [`Thunk`] that the [`Trampoline`] forces in a flat loop. Native
//! stack usage is therefore bounded by the shape of one step, not by the depth
//! of the program's recursion or backtracking.
//!
//! Hard errors (`Err`) bypass every failure continuation and abort the run.

use std::fmt;
use std::rc::Rc;

use crate::eval::{EvalError, Value};

pub type Promise = Result<Step, EvalError>;

/// Success continuation: `(result, failure) -> Promise`
pub type Continuation = Rc<dyn Fn(Value, Amb) -> Promise>;

/// Failure continuation: `() -> Promise`, "try the next alternative"
pub type Amb = Rc<dyn Fn() -> Promise>;

/// A suspended evaluation step
pub struct Thunk(Box<dyn FnOnce() -> Promise>);

impl Thunk {
    pub fn new(f: impl FnOnce() -> Promise + 'static) -> Self {
        Thunk(Box::new(f))
    }

    pub fn force(self) -> Promise {
        (self.0)()
    }
}

pub enum Step {
    Continue(Thunk),
    Done(Value),
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Continue(_) => f.write_str("Continue(..)"),
            Step::Done(value) => f.debug_tuple("Done").field(value).finish(),
        }
    }
}

pub fn suspend(f: impl FnOnce() -> Promise + 'static) -> Promise {
    Ok(Step::Continue(Thunk::new(f)))
}

pub fn done(value: Value) -> Promise {
    Ok(Step::Done(value))
}

/// Deliver `value` to `k` on the next trampoline bounce.
pub fn resume(k: &Continuation, value: Value, failure: Amb) -> Promise {
    let k = Rc::clone(k);
    suspend(move || k(value, failure))
}

/// Invoke `failure` on the next trampoline bounce.
pub fn backtrack(failure: &Amb) -> Promise {
    let failure = Rc::clone(failure);
    suspend(move || failure())
}

pub fn continuation(f: impl Fn(Value, Amb) -> Promise + 'static) -> Continuation {
    Rc::new(f)
}

pub fn amb(f: impl Fn() -> Promise + 'static) -> Amb {
    Rc::new(f)
}

/// The outermost failure continuation: no alternatives remain.
pub fn exhausted() -> Amb {
    amb(|| Err(EvalError::NoMoreAlternatives))
}

/// The outermost success continuation: stop with the value.
pub fn finish() -> Continuation {
    continuation(|value, _| done(value))
}

/// Iterative driver for [`Promise`]s.
#[derive(Debug, Clone, Default)]
pub struct Trampoline {
    steps: u64,
    limit: Option<u64>,
}

impl Trampoline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver that fails with `StepLimitExceeded` after `limit` bounces
    pub fn with_limit(limit: u64) -> Self {
        Self {
            steps: 0,
            limit: Some(limit),
        }
    }

    /// Bounces taken so far, across every `run`
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn run(&mut self, promise: Promise) -> Result<Value, EvalError> {
        let mut step = promise?;
        loop {
            match step {
                Step::Done(value) => return Ok(value),
                Step::Continue(thunk) => {
                    if let Some(limit) = self.limit {
                        if self.steps >= limit {
                            return Err(EvalError::StepLimitExceeded(limit));
                        }
                    }
                    self.steps += 1;
                    step = thunk.force()?;
                }
            }
        }
    }
}

/// Force `promise` to completion with no step limit.
pub fn trampoline(promise: Promise) -> Result<Value, EvalError> {
    Trampoline::new().run(promise)
}
