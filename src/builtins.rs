//! Primitive procedures bound in every interpreter's global frame.

use std::rc::Rc;

use crate::ast::Symbol;
use crate::eval::{EvalError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    Cons,
    Append,
    Xor,
    Not,
    Head,
    Tail,
    Length,
}

impl Builtin {
    pub const ALL: [Builtin; 18] = [
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Div,
        Builtin::Mod,
        Builtin::Eq,
        Builtin::Neq,
        Builtin::Lt,
        Builtin::Gt,
        Builtin::Lte,
        Builtin::Gte,
        Builtin::Cons,
        Builtin::Append,
        Builtin::Xor,
        Builtin::Not,
        Builtin::Head,
        Builtin::Tail,
        Builtin::Length,
    ];

    /// The name this primitive is bound to
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Add => "+",
            Builtin::Sub => "-",
            Builtin::Mul => "*",
            Builtin::Div => "/",
            Builtin::Mod => "%",
            Builtin::Eq => "==",
            Builtin::Neq => "!=",
            Builtin::Lt => "<",
            Builtin::Gt => ">",
            Builtin::Lte => "<=",
            Builtin::Gte => ">=",
            Builtin::Cons => "@",
            Builtin::Append => "@@",
            Builtin::Xor => "xor",
            Builtin::Not => "not",
            Builtin::Head => "head",
            Builtin::Tail => "tail",
            Builtin::Length => "length",
        }
    }

    pub fn apply(self, args: &[Value]) -> Result<Value, EvalError> {
        match (self, args) {
            (Builtin::Sub, [n]) => Ok(Value::Int(int(n)?.wrapping_neg())),
            (Builtin::Not, [b]) => Ok(Value::Bool(!boolean(b)?)),
            (Builtin::Head, [list]) => items(list)?
                .first()
                .cloned()
                .ok_or_else(|| EvalError::TypeError("head of empty list".into())),
            (Builtin::Tail, [list]) => {
                let items = items(list)?;
                if items.is_empty() {
                    return Err(EvalError::TypeError("tail of empty list".into()));
                }
                Ok(Value::list(items[1..].to_vec()))
            }
            (Builtin::Length, [list]) => Ok(Value::Int(items(list)?.len() as i64)),
            (_, [a, b]) => self.binary(a, b),
            _ => Err(EvalError::Arity {
                name: self.name().to_string(),
                expected: self.arity(),
                found: args.len(),
            }),
        }
    }

    fn arity(self) -> usize {
        match self {
            Builtin::Not | Builtin::Head | Builtin::Tail | Builtin::Length => 1,
            _ => 2,
        }
    }

    fn binary(self, a: &Value, b: &Value) -> Result<Value, EvalError> {
        let value = match self {
            Builtin::Add => Value::Int(int(a)?.wrapping_add(int(b)?)),
            Builtin::Sub => Value::Int(int(a)?.wrapping_sub(int(b)?)),
            Builtin::Mul => Value::Int(int(a)?.wrapping_mul(int(b)?)),
            Builtin::Div => Value::Int(
                int(a)?
                    .checked_div(nonzero(b)?)
                    .ok_or_else(|| EvalError::TypeError("integer overflow".into()))?,
            ),
            Builtin::Mod => Value::Int(
                int(a)?
                    .checked_rem(nonzero(b)?)
                    .ok_or_else(|| EvalError::TypeError("integer overflow".into()))?,
            ),
            Builtin::Eq => Value::Bool(a == b),
            Builtin::Neq => Value::Bool(a != b),
            Builtin::Lt => Value::Bool(int(a)? < int(b)?),
            Builtin::Gt => Value::Bool(int(a)? > int(b)?),
            Builtin::Lte => Value::Bool(int(a)? <= int(b)?),
            Builtin::Gte => Value::Bool(int(a)? >= int(b)?),
            Builtin::Cons => {
                let mut out = vec![a.clone()];
                out.extend(items(b)?.iter().cloned());
                Value::list(out)
            }
            Builtin::Append => {
                let mut out = items(a)?.to_vec();
                out.extend(items(b)?.iter().cloned());
                Value::list(out)
            }
            Builtin::Xor => Value::Bool(boolean(a)? ^ boolean(b)?),
            Builtin::Not | Builtin::Head | Builtin::Tail | Builtin::Length => {
                return Err(EvalError::Arity {
                    name: self.name().to_string(),
                    expected: 1,
                    found: 2,
                })
            }
        };
        Ok(value)
    }
}

fn int(value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(EvalError::TypeError(format!(
            "expected an integer, found {}",
            other.type_name()
        ))),
    }
}

fn nonzero(value: &Value) -> Result<i64, EvalError> {
    match int(value)? {
        0 => Err(EvalError::DivisionByZero),
        n => Ok(n),
    }
}

fn boolean(value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(EvalError::TypeError(format!(
            "expected a boolean, found {}",
            other.type_name()
        ))),
    }
}

fn items(value: &Value) -> Result<&Rc<[Value]>, EvalError> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(EvalError::TypeError(format!(
            "expected a list, found {}",
            other.type_name()
        ))),
    }
}

/// `(name, primitive)` pairs for seeding a global frame
pub fn bindings() -> impl Iterator<Item = (Symbol, Value)> {
    Builtin::ALL
        .into_iter()
        .map(|b| (Symbol::new(b.name()), Value::Builtin(b)))
}
