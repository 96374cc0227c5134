//! Schemelet - a minimal Scheme-dialect interpreter
//!
//! This crate implements a small, strict interpreter for a Scheme-like
//! language: source text is tokenized, parsed into a forest of S-expression
//! trees, and each top-level expression is evaluated against a chain of
//! lexically-scoped frames.
//!
//! ```scheme
//! (define add-one (lambda (x) (+ x 1)))
//! (add-one 41)                     ; => 42
//! (map car (quote ((1 2) (3 4))))  ; => (1 3)
//! (let ((x 1) (y 2)) (cons x y))   ; => (1 . 2)
//! ```
//!
//! ## Strictness
//!
//! The dialect is deliberately small and unforgiving:
//! - Only the boolean `#f` is treated as false; every other value is truthy.
//! - `let` evaluates its binding initializers against the *enclosing* frame
//!   (parallel binding, not sequential).
//! - Duplicate binding names within one frame are rejected, whether they come
//!   from `let`, `define`, or a `lambda` parameter list.
//! - Every contract violation is an error that aborts the run; there is no
//!   recovery path and later expressions are never evaluated.
//!
//! ## Modules
//!
//! - `tokenizer`: character stream to lexical tokens
//! - `parser`: token sequence to a forest of S-expression trees
//! - `evaluator`: tree-walking evaluation with frames and closures
//! - `arena`: frame storage with index handles and bulk release
//! - `ast`: the `Value` representation shared by the whole pipeline
//! - `builtinops`: the fixed registry of primitive procedures

use std::fmt;

/// Maximum evaluation depth to prevent stack overflow in recursive evaluation.
/// Expression nesting and call chains beyond this fail with an evaluation
/// error instead of crashing the process.
pub const MAX_EVAL_DEPTH: usize = 256;

/// Default bound on the text length of a single token (numeric literal,
/// string contents, or symbol name). The tokenizer reports inputs exceeding
/// the bound instead of truncating them; see [`tokenizer::TokenizerConfig`].
pub const DEFAULT_MAX_TOKEN_LEN: usize = 300;

/// Categorizes the different kinds of syntax errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SyntaxErrorKind {
    /// A character that cannot begin any token
    UnrecognizedCharacter,
    /// Input ended inside a string literal
    UnterminatedString,
    /// A numeric literal that cannot be read (bad dot placement, out of range)
    MalformedNumber,
    /// A single token longer than the configured maximum
    TokenTooLong,
    /// More closing parentheses than opening ones
    TooManyCloses,
    /// Input ended with unclosed parentheses
    NotEnoughCloses,
    /// `}` with nothing open, or not followed by end-of-input or `(`
    MisusedCloseBrace,
}

/// A structured error providing detailed information about a syntax failure.
#[derive(Debug, PartialEq, Clone)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl SyntaxError {
    /// Create a SyntaxError with all fields
    pub fn new(
        kind: SyntaxErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        SyntaxError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a simple SyntaxError with a kind and message but no context
    pub fn from_message(kind: SyntaxErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a SyntaxError with context extracted from input at a given offset
    pub fn with_context(
        kind: SyntaxErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        Self::with_context_and_found(kind, message, input, error_offset, None)
    }

    /// Create a SyntaxError with context and found token
    pub fn with_context_and_found(
        kind: SyntaxErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
        found: Option<String>,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        // Show a little input before the failure point where possible
        let context_start = error_offset.saturating_sub(20);

        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.len() < input.len() {
            display_context.push_str("[...]");
        }

        // Replace newlines with visible markers for better error display
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        Self::new(kind, message, Some(display_context), found)
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    SyntaxError(SyntaxError),
    EvalError(String),
    TypeError(String),
    UnboundSymbol(String),
    ArityError {
        expected: usize,
        got: usize,
        expression: Option<String>, // Optional expression context
    },
}

impl Error {
    /// Create an ArityError without expression context
    pub fn arity_error(expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: None,
        }
    }

    /// Create an ArityError with expression context
    pub fn arity_error_with_expr(expected: usize, got: usize, expression: String) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: Some(expression),
        }
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::SyntaxError(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::SyntaxError(e) => {
                write!(f, "SyntaxError: {}", e.message)?;
                if let Some(found) = &e.found {
                    write!(f, "\nFound: {found}")?;
                }
                if let Some(context) = &e.context {
                    write!(f, "\nContext: {context}")?;
                }
                Ok(())
            }
            Error::EvalError(msg) => write!(f, "EvaluationError: {msg}"),
            Error::TypeError(msg) => write!(f, "Type error: {msg}"),
            Error::UnboundSymbol(name) => write!(f, "Unbound symbol: {name}"),
            Error::ArityError {
                expected,
                got,
                expression,
            } => match expression {
                Some(expr) => write!(
                    f,
                    "ArityError: expression {expr}: expected {expected} arguments, got {got}"
                ),
                None => write!(
                    f,
                    "ArityError: procedure expected {expected} arguments but got {got}"
                ),
            },
        }
    }
}

pub mod arena;
pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod parser;
pub mod tokenizer;
