//! This module defines the core [`Value`] type and helper functions for
//! representing S-expressions in the interpreter. One closed set of variants
//! is shared by the whole pipeline: the tokenizer's literal payloads, the
//! parser's trees, and the evaluator's results are all built from it.
//! Lists and trees are represented uniformly as right-nested pairs
//! terminated by [`Value::Null`]. Ergonomic helper functions such as
//! [`val`], [`sym`], and [`nil`] are provided for convenient construction
//! in tests, and conversion traits cover common Rust literals, arrays,
//! slices, and vectors. Display logic implements the interpreter's output
//! rendering contract, including dotted-pair notation for improper lists.

use std::rc::Rc;

use crate::arena::FrameId;
use crate::builtinops::BuiltinOp;

/// A user-defined procedure: parameter names, body expressions, and the
/// frame that was current when the `lambda` was evaluated. The frame is
/// captured by handle, not by copy, so later `define`s in that frame are
/// visible to the closure body (which is what makes recursive definitions
/// work).
pub struct Closure {
    pub params: Vec<String>,
    pub body: Vec<Value>,
    pub frame: FrameId,
}

/// Core S-expression type in the interpreter
///
/// To build a `Value` in test code, use the ergonomic helper functions:
/// - `val(42)` for literals, `sym("name")` for symbols, `nil()` for the empty list
/// - `val([1, 2, 3])` for homogeneous lists
/// - `val(vec![sym("op"), val(42)])` for mixed lists
#[derive(Clone)]
pub enum Value {
    /// The empty list
    Null,
    /// Integer numbers
    Integer(i64),
    /// Floating-point numbers
    Double(f64),
    /// String literals
    String(String),
    /// Boolean values
    Boolean(bool),
    /// Symbols (identifiers)
    Symbol(String),
    /// An ordered pair of two values, the universal list-building cell.
    /// Cells are immutable once constructed; sharing is by reference count.
    Pair(Rc<(Value, Value)>),
    /// User-defined procedures (params, body, captured frame)
    Closure(Rc<Closure>),
    /// Built-in procedures from the fixed registry
    Primitive(&'static BuiltinOp),
    /// The explicit "no meaningful value" result (e.g. `(if #f 1)`)
    Unspecified,
    /// The result of a binding form; prints as nothing
    Void,
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::Double(d) => write!(f, "Double({d})"),
            Value::String(s) => write!(f, "String(\"{s}\")"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::Pair(cell) => write!(f, "Pair({:?}, {:?})", cell.0, cell.1),
            Value::Closure(closure) => {
                write!(f, "Closure(params={:?})", closure.params)
            }
            Value::Primitive(op) => write!(f, "Primitive({})", op.id),
            Value::Unspecified => write!(f, "Unspecified"),
            Value::Void => write!(f, "Void"),
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Integer(n as i64)
            }
        }
    };
}

// Generate From implementations for all integer types
impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(i64); // Special case - no casting
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::list(arr.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(slice: &[T]) -> Self {
        Value::list(slice.iter().cloned().map(|x| x.into()).collect())
    }
}

///   Helper function for creating symbols - works great in mixed lists!
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values - works great in mixed lists!
/// Accepts any type that can be converted to Value
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating the empty list (nil)
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn nil() -> Value {
    Value::Null
}

impl Value {
    /// Build a new pair cell
    pub fn cons(first: Value, rest: Value) -> Value {
        Value::Pair(Rc::new((first, rest)))
    }

    /// Build a proper list (right-nested pairs ending in `Null`)
    pub fn list(elements: Vec<Value>) -> Value {
        elements
            .into_iter()
            .rev()
            .fold(Value::Null, |tail, head| Value::cons(head, tail))
    }

    /// Check if a value is the empty list
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Collect the elements of a proper list. Returns `None` if the value is
    /// not `Null`-terminated (an improper list) or not a list at all.
    pub fn list_elements(&self) -> Option<Vec<Value>> {
        let mut elements = Vec::new();
        let mut current = self;
        loop {
            match current {
                Value::Null => return Some(elements),
                Value::Pair(cell) => {
                    elements.push(cell.0.clone());
                    current = &cell.1;
                }
                _ => return None,
            }
        }
    }
}

/// Render a double in fixed-point form, always with a decimal point so it
/// cannot be mistaken for an integer.
pub(crate) fn write_double(f: &mut std::fmt::Formatter<'_>, value: f64) -> std::fmt::Result {
    if value.is_finite() && value.fract() == 0.0 {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "()"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Double(d) => write_double(f, *d),
            // String contents are rendered verbatim; the dialect has no
            // escape sequences on input or output.
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Pair(cell) => {
                write!(f, "(")?;
                let mut cell = cell;
                loop {
                    write!(f, "{}", cell.0)?;
                    match &cell.1 {
                        Value::Null => break,
                        Value::Pair(next) => {
                            write!(f, " ")?;
                            cell = next;
                        }
                        tail => {
                            write!(f, " . {tail}")?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Value::Closure(_) => write!(f, "#<procedure>"),
            Value::Primitive(op) => write!(f, "#<primitive:{}>", op.id),
            Value::Unspecified => write!(f, "#<unspecified>"),
            Value::Void => Ok(()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Unspecified never equals anything, including itself
            (Value::Unspecified, _) | (_, Value::Unspecified) => false,
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => a.0 == b.0 && a.1 == b.1,
            // Closures compare by identity, primitives by registry id
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Primitive(a), Value::Primitive(b)) => a.id == b.id,
            (Value::Void, Value::Void) => true,
            _ => false, // Different variants are never equal
        }
    }
}
