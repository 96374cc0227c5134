//! Built-in operations registry.
//!
//! This module provides the fixed set of primitive procedures available in
//! the global frame. Each entry pairs an identifier with an arity contract
//! and an implementation; the evaluator validates the arity before the
//! implementation runs, so implementations can rely on it.
//!
//! ## Functions vs higher-order primitives
//!
//! - **Functions**: operate on already-evaluated arguments only (`null?`,
//!   `car`, `cdr`, `cons`, `+`)
//! - **Higher-order**: additionally re-enter procedure application, so they
//!   need access to the frame arena (`map`)
//!
//! Special forms (`if`, `let`, `quote`, `define`, `lambda`) are not in this
//! registry: they are syntax, dispatched by keyword in the evaluator before
//! any evaluation of their arguments happens, and their names are not
//! bindable values.
//!
//! ## Error handling
//!
//! Operations are strict: type mismatches are reported, never coerced, and
//! integer overflow in `+` is detected rather than wrapped.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::Error;
use crate::arena::Arena;
use crate::ast::Value;
use crate::evaluator::apply;

/// Expected argument count for a builtin operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    /// Check an actual argument count against this contract
    pub fn validate(&self, got: usize) -> Result<(), Error> {
        match self {
            Arity::Exact(expected) if got != *expected => Err(Error::arity_error(*expected, got)),
            Arity::AtLeast(expected) if got < *expected => Err(Error::arity_error(*expected, got)),
            _ => Ok(()),
        }
    }
}

/// Represents the implementation of a built-in operation
#[derive(Clone, Copy)]
pub enum OpKind {
    /// Regular function over evaluated arguments
    Function(fn(&[Value]) -> Result<Value, Error>),
    /// Function that applies procedures itself and therefore needs the frame
    /// arena and the current evaluation depth
    HigherOrder(fn(&[Value], &mut Arena, usize) -> Result<Value, Error>),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::HigherOrder(_) => write!(f, "HigherOrder(<fn>)"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug, Clone, Copy)]
pub struct BuiltinOp {
    /// The identifier this operation is bound to in the global frame
    pub id: &'static str,
    /// The implementation of this operation
    pub kind: OpKind,
    /// Expected number of arguments
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        // Operations are uniquely identified by their id
        self.id == other.id
    }
}

impl BuiltinOp {
    /// Check if the given number of arguments is valid for this operation
    pub(crate) fn validate_arity(&self, arg_count: usize) -> Result<(), Error> {
        self.arity.validate(arg_count)
    }
}

//
// Builtin implementations
//

fn builtin_null(args: &[Value]) -> Result<Value, Error> {
    match args {
        [value] => Ok(Value::Boolean(value.is_null())),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn builtin_car(args: &[Value]) -> Result<Value, Error> {
    match args {
        [Value::Pair(cell)] => Ok(cell.0.clone()),
        [other] => Err(Error::TypeError(format!("car requires a pair, got: {other}"))),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn builtin_cdr(args: &[Value]) -> Result<Value, Error> {
    match args {
        [Value::Pair(cell)] => Ok(cell.1.clone()),
        [other] => Err(Error::TypeError(format!("cdr requires a pair, got: {other}"))),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn builtin_cons(args: &[Value]) -> Result<Value, Error> {
    match args {
        // Any second argument is allowed; a non-list tail makes a dotted pair
        [first, rest] => Ok(Value::cons(first.clone(), rest.clone())),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// Sum of any number of Integers and Doubles. The result is an Integer only
/// when every argument was an Integer; a single Double makes it a Double.
fn builtin_add(args: &[Value]) -> Result<Value, Error> {
    let mut int_sum: i64 = 0;
    let mut double_sum: f64 = 0.0;
    let mut saw_double = false;
    for arg in args {
        match arg {
            Value::Integer(n) => {
                int_sum = int_sum
                    .checked_add(*n)
                    .ok_or_else(|| Error::EvalError("Integer overflow in addition".into()))?;
            }
            Value::Double(d) => {
                double_sum += d;
                saw_double = true;
            }
            other => {
                return Err(Error::TypeError(format!("+ requires numbers, got: {other}")));
            }
        }
    }
    if saw_double {
        Ok(Value::Double(double_sum + int_sum as f64))
    } else {
        Ok(Value::Integer(int_sum))
    }
}

/// Apply a procedure to each element of a proper list, in order, producing
/// a new list in the same order.
fn builtin_map(args: &[Value], arena: &mut Arena, depth: usize) -> Result<Value, Error> {
    let [procedure, list] = args else {
        return Err(Error::arity_error(2, args.len()));
    };
    // The procedure is checked before iteration, so a bad first argument is
    // reported even for an empty list.
    if !matches!(procedure, Value::Closure(_) | Value::Primitive(_)) {
        return Err(Error::TypeError(format!(
            "map requires a procedure as first argument, got: {procedure}"
        )));
    }
    let Some(elements) = list.list_elements() else {
        return Err(Error::TypeError(format!(
            "map requires a proper list as second argument, got: {list}"
        )));
    };
    let mut mapped = Vec::with_capacity(elements.len());
    for element in &elements {
        mapped.push(apply(
            procedure,
            std::slice::from_ref(element),
            arena,
            depth + 1,
        )?);
    }
    Ok(Value::list(mapped))
}

/// Registry of all built-in operations. The layout is a single contiguous
/// table for ease of auditing; lookup goes through an id-indexed map built
/// once at initialization time.
static BUILTIN_OPS: &[BuiltinOp] = &[
    BuiltinOp {
        id: "null?",
        kind: OpKind::Function(builtin_null),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        id: "car",
        kind: OpKind::Function(builtin_car),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        id: "cdr",
        kind: OpKind::Function(builtin_cdr),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        id: "cons",
        kind: OpKind::Function(builtin_cons),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        id: "+",
        kind: OpKind::Function(builtin_add),
        arity: Arity::AtLeast(0),
    },
    BuiltinOp {
        id: "map",
        kind: OpKind::HigherOrder(builtin_map),
        arity: Arity::Exact(2),
    },
];

/// Lazy static map from id to BuiltinOp (private - use find_op)
static BUILTIN_INDEX: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.id, op)).collect());

/// Get all builtin operations (for internal use by the evaluator)
pub(crate) fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS
}

/// Find a builtin operation by its identifier
pub(crate) fn find_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_INDEX.get(id).copied()
}
