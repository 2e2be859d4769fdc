//! Operator precedence and associativity table.

use std::collections::HashMap;

use crate::errors::Warning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// `a op b op c` = `(a op b) op c`
    Left,
    /// `a op b op c` = `a op (b op c)`
    Right,
    /// Chains are accepted and grouped to the left
    None,
}

/// Information about an operator's fixity
#[derive(Debug, Clone)]
pub struct OpInfo {
    /// Higher binds tighter
    pub precedence: u8,
    pub assoc: Associativity,
    pub is_builtin: bool,
}

impl OpInfo {
    pub fn new(precedence: u8, assoc: Associativity) -> Self {
        Self {
            precedence,
            assoc,
            is_builtin: false,
        }
    }

    /// Minimum precedence for the right-hand operand. Wider than `u8` so the
    /// tightest level can still exclude itself.
    pub fn right_binding(&self) -> u16 {
        let precedence = u16::from(self.precedence);
        match self.assoc {
            Associativity::Right => precedence,
            Associativity::Left | Associativity::None => precedence + 1,
        }
    }
}

/// Table of binary operator precedences and associativities.
///
/// Prefix operators (`not`, unary `-`) are not listed: they always take a
/// single prefix-or-postfix operand and so bind tighter than every entry here.
/// Application binds tighter still.
#[derive(Debug, Clone)]
pub struct OperatorTable {
    operators: HashMap<String, OpInfo>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorTable {
    pub fn new() -> Self {
        let mut table = Self {
            operators: HashMap::new(),
        };
        table.register_builtins();
        table
    }

    /// An empty table; every binary operator ends the expression.
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    fn register_builtins(&mut self) {
        use Associativity::*;

        // Level 1: then (amb choice)
        // Level 2: and or xor
        // Level 3: == != < > <= >=
        // Level 4: @ @@ (cons family)
        // Level 5: + -
        // Level 6: * / %
        let builtins: [(&str, u8, Associativity); 17] = [
            ("then", 1, Right),
            ("and", 2, Left),
            ("or", 2, Left),
            ("xor", 2, Left),
            ("==", 3, None),
            ("!=", 3, None),
            ("<", 3, None),
            (">", 3, None),
            ("<=", 3, None),
            (">=", 3, None),
            ("@", 4, Right),
            ("@@", 4, Right),
            ("+", 5, Left),
            ("-", 5, Left),
            ("*", 6, Left),
            ("/", 6, Left),
            ("%", 6, Left),
        ];

        for (op, precedence, assoc) in builtins {
            self.operators.insert(
                op.to_string(),
                OpInfo {
                    precedence,
                    assoc,
                    is_builtin: true,
                },
            );
        }
    }

    /// Register or re-level an operator. Returns a warning when this replaces
    /// a built-in entry.
    pub fn register(&mut self, op: impl Into<String>, info: OpInfo) -> Option<Warning> {
        let op = op.into();
        let warning = match self.operators.get(&op) {
            Some(existing) if existing.is_builtin => {
                Some(Warning::ShadowingBuiltinOperator { op: op.clone() })
            }
            _ => None,
        };
        self.operators.insert(op, info);
        warning
    }

    pub fn get(&self, op: &str) -> Option<&OpInfo> {
        self.operators.get(op)
    }

    pub fn contains(&self, op: &str) -> bool {
        self.operators.contains_key(op)
    }
}
