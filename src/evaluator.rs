use std::rc::Rc;

use crate::arena::{Arena, FrameId};
use crate::ast::{Closure, Value};
use crate::builtinops::{OpKind, get_builtin_ops};
use crate::parser::parse;
use crate::tokenizer::tokenize;
use crate::{Error, MAX_EVAL_DEPTH};

/// A complete, self-contained interpreter instance: the frame arena plus the
/// global frame. Independent instances do not share any state, so several
/// can coexist in one process. Dropping the interpreter releases every frame
/// allocated during the run in one sweep.
pub struct Interpreter {
    arena: Arena,
    global: FrameId,
}

impl Interpreter {
    /// Create an interpreter whose global frame holds the builtin primitives
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let global = create_global_env(&mut arena);
        Interpreter { arena, global }
    }

    /// Evaluate a single expression against the global frame
    pub fn eval(&mut self, expr: &Value) -> Result<Value, Error> {
        eval(expr, &mut self.arena, self.global)
    }

    /// Run a whole program: tokenize, parse, and evaluate each top-level
    /// expression in source order. Stops at the first error.
    pub fn run(&mut self, source: &str) -> Result<Vec<Value>, Error> {
        let tokens = tokenize(source)?;
        let forest = parse(&tokens)?;
        forest.iter().map(|expr| self.eval(expr)).collect()
    }

    /// All bindings visible from the global frame, sorted by name
    pub fn global_bindings(&self) -> Vec<(String, Value)> {
        self.arena.get_all_bindings(self.global)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a global frame populated with the builtin primitives
pub fn create_global_env(arena: &mut Arena) -> FrameId {
    let global = arena.alloc_frame(None);
    for op in get_builtin_ops() {
        arena
            .bind(global, op.id.to_owned(), Value::Primitive(op))
            .expect("builtin ids must be unique");
    }
    global
}

/// Evaluate an S-expression against a frame (public API)
pub fn eval(expr: &Value, arena: &mut Arena, frame: FrameId) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, arena, frame, 0)
}

/// Evaluate an S-expression with depth tracking to prevent stack overflow
pub(crate) fn eval_with_depth_tracking(
    expr: &Value,
    arena: &mut Arena,
    frame: FrameId,
    depth: usize,
) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::EvalError(format!(
            "Evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
        )));
    }
    match expr {
        // Self-evaluating literals
        Value::Integer(_) | Value::Double(_) | Value::String(_) | Value::Boolean(_) => {
            Ok(expr.clone())
        }

        // Variable lookup
        Value::Symbol(name) => arena
            .lookup(frame, name)
            .cloned()
            .ok_or_else(|| Error::UnboundSymbol(name.clone())),

        // Special forms and procedure application
        Value::Pair(cell) => {
            eval_pair(cell, arena, frame, depth).map_err(|err| add_context(err, expr))
        }

        Value::Null => Err(Error::EvalError("Cannot evaluate empty list".to_owned())),

        // Unspecified, Void, and procedure values are results, not syntax
        other => Err(Error::EvalError(format!("Cannot evaluate: {other}"))),
    }
}

/// Evaluate a pair expression: dispatch to a special form by keyword, or
/// treat it as a procedure application.
fn eval_pair(
    cell: &(Value, Value),
    arena: &mut Arena,
    frame: FrameId,
    depth: usize,
) -> Result<Value, Error> {
    let head = &cell.0;
    let Some(args) = cell.1.list_elements() else {
        return Err(Error::EvalError(
            "Malformed expression: argument tail is not a proper list".to_owned(),
        ));
    };

    // Special forms receive their arguments unevaluated and are recognized
    // before symbol lookup, so their keywords cannot be shadowed.
    if let Value::Symbol(name) = head {
        match name.as_str() {
            "if" => return eval_if(&args, arena, frame, depth),
            "let" => return eval_let(&args, arena, frame, depth),
            "quote" => return eval_quote(&args, arena, frame, depth),
            "define" => return eval_define(&args, arena, frame, depth),
            "lambda" => return eval_lambda(&args, arena, frame, depth),
            _ => {}
        }
    }

    // Procedure application: head first, then arguments left-to-right
    let procedure = eval_with_depth_tracking(head, arena, frame, depth + 1)?;
    let args = eval_args(&args, arena, frame, depth)?;
    apply(&procedure, &args, arena, depth)
}

/// Helper function to add expression context to errors
fn add_context(error: Error, expr: &Value) -> Error {
    let context = format!("while evaluating: {expr}");
    match error {
        Error::EvalError(msg) => Error::EvalError(format!("{msg}\n  Context: {context}")),
        Error::TypeError(msg) => Error::TypeError(format!("{msg}\n  Context: {context}")),
        // Syntax errors, unbound symbols, and arity errors carry their own context
        other => other,
    }
}

/// Helper function to evaluate a list of argument expressions with depth tracking
fn eval_args(
    args: &[Value],
    arena: &mut Arena,
    frame: FrameId,
    depth: usize,
) -> Result<Vec<Value>, Error> {
    args.iter()
        .map(|arg| eval_with_depth_tracking(arg, arena, frame, depth + 1))
        .collect()
}

/// Only the boolean false value is falsy; every other value is truthy.
fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Boolean(false))
}

/// Evaluate an if special form: condition, then-branch, optional else-branch
fn eval_if(args: &[Value], arena: &mut Arena, frame: FrameId, depth: usize) -> Result<Value, Error> {
    let (condition, then_expr, else_expr) = match args {
        [condition, then_expr] => (condition, then_expr, None),
        [condition, then_expr, else_expr] => (condition, then_expr, Some(else_expr)),
        [..] if args.len() < 2 => return Err(Error::arity_error(2, args.len())),
        _ => return Err(Error::arity_error(3, args.len())),
    };

    let condition = eval_with_depth_tracking(condition, arena, frame, depth + 1)?;
    if is_truthy(&condition) {
        eval_with_depth_tracking(then_expr, arena, frame, depth + 1)
    } else {
        match else_expr {
            Some(expr) => eval_with_depth_tracking(expr, arena, frame, depth + 1),
            None => Ok(Value::Unspecified),
        }
    }
}

/// Evaluate a let special form: parallel bindings plus a body
fn eval_let(
    args: &[Value],
    arena: &mut Arena,
    frame: FrameId,
    depth: usize,
) -> Result<Value, Error> {
    let [bindings_expr, body @ ..] = args else {
        return Err(Error::arity_error(1, args.len()));
    };
    let Some(bindings) = bindings_expr.list_elements() else {
        return Err(Error::TypeError("let bindings must be a list".to_owned()));
    };

    let let_frame = arena.alloc_frame(Some(frame));
    for binding in &bindings {
        let Some(pair) = binding.list_elements() else {
            return Err(Error::TypeError(
                "let binding must be a (name value) pair".to_owned(),
            ));
        };
        let [Value::Symbol(name), value_expr] = pair.as_slice() else {
            return Err(Error::TypeError(
                "let binding must be a (name value) pair".to_owned(),
            ));
        };
        // Initializers see the enclosing frame, not each other
        let value = eval_with_depth_tracking(value_expr, arena, frame, depth + 1)?;
        arena.bind(let_frame, name.clone(), value)?;
    }

    let mut result = Value::Unspecified;
    for expr in body {
        result = eval_with_depth_tracking(expr, arena, let_frame, depth + 1)?;
    }
    Ok(result)
}

/// Evaluate a quote special form
fn eval_quote(
    args: &[Value],
    _arena: &mut Arena,
    _frame: FrameId,
    _depth: usize,
) -> Result<Value, Error> {
    match args {
        [expr] => Ok(expr.clone()),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

/// Evaluate a define special form. The value expression is evaluated in the
/// current frame before the binding is installed, so the new name is not
/// visible to its own initializer.
fn eval_define(
    args: &[Value],
    arena: &mut Arena,
    frame: FrameId,
    depth: usize,
) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            if arena.has_local(frame, name) {
                return Err(Error::EvalError(format!(
                    "define: name already bound in this frame: {name}"
                )));
            }
            let value = eval_with_depth_tracking(expr, arena, frame, depth + 1)?;
            arena.bind(frame, name.clone(), value)?;
            Ok(Value::Void)
        }
        [_, _] => Err(Error::TypeError("define requires a symbol".to_owned())),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// Evaluate a lambda special form, producing a closure that captures the
/// current frame by handle. The body is not evaluated here.
fn eval_lambda(
    args: &[Value],
    _arena: &mut Arena,
    frame: FrameId,
    _depth: usize,
) -> Result<Value, Error> {
    let [params_expr, body @ ..] = args else {
        return Err(Error::arity_error(2, args.len()));
    };
    if body.is_empty() {
        return Err(Error::EvalError("lambda requires a non-empty body".to_owned()));
    }
    let Some(param_list) = params_expr.list_elements() else {
        return Err(Error::TypeError("Lambda parameters must be a list".to_owned()));
    };

    let mut params = Vec::with_capacity(param_list.len());
    for param in &param_list {
        match param {
            Value::Symbol(name) => {
                if params.contains(name) {
                    return Err(Error::EvalError(format!("Duplicate parameter name: {name}")));
                }
                params.push(name.clone());
            }
            _ => {
                return Err(Error::TypeError("Lambda parameters must be symbols".to_owned()));
            }
        }
    }

    Ok(Value::Closure(Rc::new(Closure {
        params,
        body: body.to_vec(),
        frame,
    })))
}

/// Apply a procedure value to already-evaluated arguments
pub(crate) fn apply(
    procedure: &Value,
    args: &[Value],
    arena: &mut Arena,
    depth: usize,
) -> Result<Value, Error> {
    match procedure {
        Value::Closure(closure) => {
            if closure.params.len() != args.len() {
                return Err(Error::arity_error(closure.params.len(), args.len()));
            }

            // Bind parameters positionally in a new frame chained to the
            // closure's captured frame, not the caller's.
            let call_frame = arena.alloc_frame(Some(closure.frame));
            for (param, arg) in closure.params.iter().zip(args) {
                arena.bind(call_frame, param.clone(), arg.clone())?;
            }

            let mut result = Value::Unspecified;
            for expr in &closure.body {
                result = eval_with_depth_tracking(expr, arena, call_frame, depth + 1)?;
            }
            Ok(result)
        }
        Value::Primitive(op) => {
            op.validate_arity(args.len())?;
            match op.kind {
                OpKind::Function(func) => func(args),
                OpKind::HigherOrder(func) => func(args, arena, depth),
            }
        }
        other => Err(Error::TypeError(format!("Cannot apply non-procedure: {other}"))),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, sym, val};

    /// Test result variants for comprehensive testing
    #[derive(Debug)]
    enum TestResult {
        EvalResult(Value),           // Evaluation should succeed with this value
        SpecificError(&'static str), // Evaluation should fail with error containing this string
        Error,                       // Evaluation should fail (any error)
    }
    use TestResult::*;

    /// Test environment containing test cases that share state
    struct TestEnvironment(Vec<(&'static str, TestResult)>);

    /// Micro-helper for success cases in comprehensive tests
    fn success<T: Into<Value>>(value: T) -> TestResult {
        EvalResult(val(value))
    }

    /// Macro for setup expressions that return Void (like define)
    macro_rules! test_setup {
        ($expr:expr) => {
            ($expr, EvalResult(Value::Void))
        };
    }

    /// Parse a single expression for evaluation tests
    fn parse_one(input: &str) -> Value {
        let tokens = tokenize(input).unwrap_or_else(|e| panic!("tokenize failed for '{input}': {e:?}"));
        let mut forest = parse(&tokens).unwrap_or_else(|e| panic!("parse failed for '{input}': {e:?}"));
        assert_eq!(forest.len(), 1, "expected a single expression in '{input}'");
        forest.remove(0)
    }

    /// Execute a single test case with detailed error reporting
    fn execute_test_case(
        input: &str,
        expected: &TestResult,
        interp: &mut Interpreter,
        test_id: &str,
    ) {
        let expr = parse_one(input);
        match (interp.eval(&expr), expected) {
            (Ok(actual), EvalResult(expected_val)) => {
                // Unspecified values never compare equal; match on the variant
                match (&actual, expected_val) {
                    (Value::Unspecified, Value::Unspecified) => {} // Both unspecified - OK
                    _ => {
                        assert!(
                            !(actual != *expected_val),
                            "{test_id}: expected {expected_val:?}, got {actual:?}"
                        );
                    }
                }
            }
            (Err(_), Error) => {} // Expected generic error
            (Err(e), SpecificError(expected_text)) => {
                let error_msg = format!("{e}");
                assert!(
                    error_msg.contains(expected_text),
                    "{test_id}: error should contain '{expected_text}', got: {error_msg}"
                );
            }
            (Ok(actual), Error) => {
                panic!("{test_id}: expected error, got {actual:?}");
            }
            (Ok(actual), SpecificError(expected_text)) => {
                panic!("{test_id}: expected error containing '{expected_text}', got {actual:?}");
            }
            (Err(err), EvalResult(expected_val)) => {
                panic!("{test_id}: expected {expected_val:?}, got error {err:?}");
            }
        }
    }

    /// Run each case in a fresh interpreter
    fn run_comprehensive_tests(test_cases: Vec<(&str, TestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let mut interp = Interpreter::new();
            let test_id = format!("#{}", i + 1);
            execute_test_case(input, expected, &mut interp, &test_id);
        }
    }

    /// Run grouped test cases that share one interpreter per group
    fn run_tests_in_environment(test_environments: Vec<TestEnvironment>) {
        for (env_idx, TestEnvironment(test_cases)) in test_environments.iter().enumerate() {
            let mut interp = Interpreter::new();
            for (test_idx, (input, expected)) in test_cases.iter().enumerate() {
                let test_id = format!("Environment #{} test #{}", env_idx + 1, test_idx + 1);
                execute_test_case(input, expected, &mut interp, &test_id);
            }
        }
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_comprehensive_operations_data_driven() {
        let test_cases = vec![
            // === SELF-EVALUATING FORMS ===
            ("42", success(42)),
            ("-271", success(-271)),
            ("0", success(0)),
            ("9223372036854775807", success(i64::MAX)),
            ("3.5", success(3.5)),
            ("-0.25", success(-0.25)),
            ("#t", success(true)),
            ("#f", success(false)),
            ("\"hello\"", success("hello")),
            ("\"hello world\"", success("hello world")),
            ("\"\"", success("")),
            // === ADDITION ===
            ("(+ 1 2)", success(3)),
            ("(+ 1 2 3)", success(6)),
            ("(+)", success(0)),
            ("(+ 42)", success(42)),
            ("(+ -5 10)", success(5)),
            // Any Double argument forces a Double result
            ("(+ 1 2.0)", success(3.0)),
            ("(+ 0.5 0.25)", success(0.75)),
            ("(+ 1 (+ 2 3))", success(6)),
            ("(+ 9223372036854775807 1)", SpecificError("overflow")),
            ("(+ 1 \"hello\")", SpecificError("+ requires numbers")),
            ("(+ 1 #t)", Error),
            ("(+ (quote a))", Error),
            // === QUOTE ===
            ("(quote hello)", success(sym("hello"))),
            ("(quote (1 2 3))", success([1, 2, 3])),
            ("(quote (+ 1 2))", success(vec![sym("+"), val(1), val(2)])),
            ("(quote (a (b c)))", success(vec![sym("a"), val(vec![sym("b"), sym("c")])])),
            ("(quote ())", EvalResult(nil())),
            ("(quote)", Error),
            ("(quote a b)", Error),
            // === IF AND TRUTHINESS ===
            ("(if #t 1 2)", success(1)),
            ("(if #f 1 2)", success(2)),
            ("(if #t \"yes\" \"no\")", success("yes")),
            // Only #f is falsy; every other value is truthy
            ("(if 0 1 2)", success(1)),
            ("(if \"\" 1 2)", success(1)),
            ("(if (quote ()) 1 2)", success(1)),
            ("(if (quote (a)) 1 2)", success(1)),
            ("(if (null? (quote ())) 1 2)", success(1)),
            // Missing else-branch with a false condition is Unspecified
            ("(if #f 1)", EvalResult(Value::Unspecified)),
            ("(if #t 1)", success(1)),
            ("(if #t)", Error),
            ("(if #t 1 2 3)", Error),
            ("(if)", Error),
            // === LIST PRIMITIVES ===
            ("(car (quote (1 2 3)))", success(1)),
            ("(cdr (quote (1 2 3)))", success([2, 3])),
            ("(cdr (quote (1)))", EvalResult(nil())),
            ("(cons 1 (quote (2 3)))", success([1, 2, 3])),
            ("(cons 1 (quote ()))", success([1])),
            // cons happily builds dotted pairs
            ("(cons 1 2)", EvalResult(Value::cons(val(1), val(2)))),
            ("(car (cons 1 2))", success(1)),
            ("(cdr (cons 1 2))", success(2)),
            ("(car (quote ()))", SpecificError("car requires a pair")),
            ("(cdr (quote ()))", SpecificError("cdr requires a pair")),
            ("(car 5)", Error),
            ("(car)", Error),
            ("(car (quote (1)) (quote (2)))", Error),
            ("(cons 1)", Error),
            // === null? ===
            ("(null? (quote ()))", success(true)),
            ("(null? (quote (1)))", success(false)),
            ("(null? 42)", success(false)),
            ("(null? #f)", success(false)),
            ("(null?)", Error),
            // === MAP ===
            ("(map car (quote ((1 2) (3 4))))", success([1, 3])),
            ("(map cdr (quote ((1 2) (3 4))))", success(vec![val([2]), val([4])])),
            ("(map car (quote ()))", EvalResult(nil())),
            (
                "(map (lambda (x) (+ x 1)) (quote (1 2 3)))",
                success([2, 3, 4]),
            ),
            ("(map null? (quote (() (1) ())))", success([true, false, true])),
            // The procedure check fires even when the list is empty
            ("(map 5 (quote ()))", SpecificError("map requires a procedure")),
            ("(map car 5)", SpecificError("map requires a proper list")),
            ("(map car (cons 1 2))", SpecificError("map requires a proper list")),
            ("(map car)", Error),
            // === LAMBDA AND APPLICATION ===
            ("((lambda (x) x) 42)", success(42)),
            ("((lambda (x y) (+ x y)) 3 4)", success(7)),
            ("((lambda () 42))", success(42)),
            // Body expressions evaluate in order; the last one is the value
            ("((lambda (x) (quote ignored) x) 7)", success(7)),
            // Innermost binding shadows outer
            ("((lambda (x) ((lambda (x) x) 2)) 1)", success(2)),
            ("(((lambda (x) (lambda (y) (+ x y))) 10) 5)", success(15)),
            // Parameter validation
            ("(lambda (x x) x)", SpecificError("Duplicate parameter name")),
            ("(lambda (a b a) a)", SpecificError("Duplicate parameter name")),
            ("(lambda (x 1) x)", SpecificError("parameters must be symbols")),
            ("(lambda x x)", SpecificError("parameters must be a list")),
            ("(lambda (x))", SpecificError("non-empty body")),
            ("(lambda)", Error),
            // Call arity
            ("((lambda (x) x))", SpecificError("ArityError")),
            ("((lambda (x) x) 1 2)", SpecificError("ArityError")),
            ("((lambda () 1) 2)", SpecificError("ArityError")),
            // === LET ===
            ("(let ((x 1) (y 2)) (+ x y))", success(3)),
            ("(let () 42)", success(42)),
            ("(let ((x 5)) x)", success(5)),
            // Empty body is tolerated, unlike lambda
            ("(let ())", EvalResult(Value::Unspecified)),
            ("(let ((x 1)))", EvalResult(Value::Unspecified)),
            // Body expressions run in order
            ("(let ((x 1)) (quote first) (+ x 1))", success(2)),
            ("(let ((x 1) (x 2)) x)", SpecificError("Duplicate binding name")),
            ("(let (x) 1)", SpecificError("(name value) pair")),
            ("(let ((x)) 1)", SpecificError("(name value) pair")),
            ("(let ((x 1 2)) 1)", SpecificError("(name value) pair")),
            ("(let ((1 2)) 3)", SpecificError("(name value) pair")),
            ("(let 5 1)", SpecificError("let bindings must be a list")),
            ("(let)", Error),
            // === DEFINE SHAPE ERRORS ===
            ("(define 123 42)", SpecificError("define requires a symbol")),
            ("(define \"x\" 42)", SpecificError("define requires a symbol")),
            ("(define x)", Error),
            ("(define x 1 2)", Error),
            // The initializer does not see the name being defined
            ("(define z z)", SpecificError("Unbound symbol: z")),
            // === APPLICATION ERRORS ===
            ("(1 2 3)", SpecificError("Cannot apply non-procedure")),
            ("(\"f\" 1)", SpecificError("Cannot apply non-procedure")),
            ("(#t)", SpecificError("Cannot apply non-procedure")),
            ("(undefined-proc 1)", SpecificError("Unbound symbol: undefined-proc")),
            ("undefined-var", SpecificError("Unbound symbol: undefined-var")),
            // The empty list is not self-evaluating
            ("()", SpecificError("Cannot evaluate empty list")),
            // === PROCEDURES AS VALUES ===
            ("((if #f car cdr) (quote (1 2)))", success([2])),
            ("((if #t car cdr) (quote (1 2)))", success(1)),
        ];

        run_comprehensive_tests(test_cases);

        // === ENVIRONMENT-SENSITIVE TESTS ===
        // Tests that require shared state between expressions in the same environment
        let environment_test_cases = vec![
            // === DEFINE AND LOOKUP ===
            TestEnvironment(vec![
                test_setup!("(define x 5)"),
                ("x", success(5)),
                ("(+ x 8)", success(13)),
                ("y", Error),
                // Redefinition in the same frame is rejected
                ("(define x 6)", SpecificError("already bound in this frame")),
                ("x", success(5)), // the original binding is untouched
            ]),
            // === DEFINE INSIDE AN INNER FRAME SHADOWS, OUTER IS UNTOUCHED ===
            TestEnvironment(vec![
                test_setup!("(define x 5)"),
                ("(let () (define x 6) x)", success(6)),
                ("x", success(5)),
            ]),
            // === PRIMITIVES AS FIRST-CLASS VALUES ===
            TestEnvironment(vec![
                test_setup!("(define first car)"),
                ("(first (quote (1 2)))", success(1)),
                test_setup!("(define plus +)"),
                ("(plus 10 20)", success(30)),
            ]),
            // === LAMBDA DEFINITION AND CALLS ===
            TestEnvironment(vec![
                test_setup!("(define add-one (lambda (x) (+ x 1)))"),
                ("(add-one 42)", success(43)),
                ("(add-one)", Error),
                ("(add-one 1 2)", Error),
            ]),
            // === LEXICAL SCOPING AND CLOSURE CAPTURE ===
            TestEnvironment(vec![
                test_setup!("(define x 10)"),
                test_setup!("(define add-x (lambda (y) (+ x y)))"),
                ("(add-x 5)", success(15)),
                test_setup!("(define make-adder (lambda (n) (lambda (x) (+ x n))))"),
                test_setup!("(define add5 (make-adder 5))"),
                ("(add5 3)", success(8)),
                ("((make-adder 3) 7)", success(10)),
                // Parameter shadows the global of the same name
                test_setup!("(define f (lambda (x) (+ x 100)))"),
                ("(f 5)", success(105)),
                ("x", success(10)),
                ("(f x)", success(110)),
            ]),
            // === PARALLEL LET AGAINST THE ENCLOSING FRAME ===
            TestEnvironment(vec![
                test_setup!("(define x 10)"),
                // The initializer for y sees the outer x, not the new binding
                ("(let ((x 1) (y x)) y)", success(10)),
                ("(let ((x 1) (y x)) x)", success(1)),
                // let bindings do not leak out
                ("(let ((z 9)) z)", success(9)),
                ("z", Error),
            ]),
            // === RECURSION THROUGH SHARED FRAMES ===
            // The closure shares the global frame it was defined in, so the
            // name bound by define is visible from the closure body.
            TestEnvironment(vec![
                test_setup!(
                    "(define len (lambda (lst) (if (null? lst) 0 (+ 1 (len (cdr lst))))))"
                ),
                ("(len (quote ()))", success(0)),
                ("(len (quote (a b c)))", success(3)),
                test_setup!(
                    "(define sum (lambda (lst) (if (null? lst) 0 (+ (car lst) (sum (cdr lst))))))"
                ),
                ("(sum (quote (1 2 3 4)))", success(10)),
            ]),
            // === MUTUAL RECURSION ===
            TestEnvironment(vec![
                test_setup!(
                    "(define even-len? (lambda (lst) (if (null? lst) #t (odd-len? (cdr lst)))))"
                ),
                test_setup!(
                    "(define odd-len? (lambda (lst) (if (null? lst) #f (even-len? (cdr lst)))))"
                ),
                ("(even-len? (quote ()))", success(true)),
                ("(even-len? (quote (1 2)))", success(true)),
                ("(even-len? (quote (1 2 3)))", success(false)),
                ("(odd-len? (quote (1 2 3)))", success(true)),
            ]),
            // === HIGHER ORDER FUNCTIONS ===
            TestEnvironment(vec![
                test_setup!("(define twice (lambda (f x) (f (f x))))"),
                test_setup!("(define inc (lambda (x) (+ x 1)))"),
                ("(twice inc 5)", success(7)),
                ("(map inc (quote (1 2)))", success([2, 3])),
                // map with a closure over a defined name
                test_setup!("(define base 100)"),
                ("(map (lambda (n) (+ n base)) (quote (1 2)))", success([101, 102])),
            ]),
        ];

        run_tests_in_environment(environment_test_cases);
    }

    #[test]
    fn test_closure_is_opaque_but_applicable() {
        let mut interp = Interpreter::new();
        let result = interp.eval(&parse_one("(lambda (x) x)")).unwrap();
        assert!(matches!(result, Value::Closure(_)));
        assert_eq!(format!("{result}"), "#<procedure>");

        let result = interp.eval(&parse_one("car")).unwrap();
        assert!(matches!(result, Value::Primitive(_)));
    }

    #[test]
    fn test_evaluation_depth_limit() {
        // Deeply nested additions exceed the depth guard without
        // overflowing the process stack.
        let depth = MAX_EVAL_DEPTH + 50;
        let mut source = String::new();
        for _ in 0..depth {
            source.push_str("(+ 1 ");
        }
        source.push('0');
        source.push_str(&")".repeat(depth));

        let mut interp = Interpreter::new();
        let err = interp.eval(&parse_one(&source)).unwrap_err();
        assert!(
            format!("{err}").contains("depth"),
            "expected a depth error, got: {err}"
        );
    }

    #[test]
    fn test_interpreter_run_sequences_results() {
        use crate::Error;
        let mut interp = Interpreter::new();
        let results = interp.run("(define x 5) (+ x 1) (cons x (quote ()))").unwrap();
        assert_eq!(results, vec![Value::Void, val(6), val([5])]);

        // The first failure aborts the run
        let mut interp = Interpreter::new();
        let err = interp.run("(+ 1 2) (car 5) (+ 3 4)").unwrap_err();
        assert!(matches!(err, Error::TypeError(_)));
    }

    #[test]
    fn test_independent_interpreter_instances() {
        let mut first = Interpreter::new();
        let mut second = Interpreter::new();
        first.run("(define x 1)").unwrap();
        // The definition is not visible from the other instance
        assert!(second.run("x").is_err());
        assert_eq!(first.run("x").unwrap(), vec![val(1)]);
    }

    #[test]
    fn test_global_bindings_lists_primitives() {
        let interp = Interpreter::new();
        let names: Vec<String> = interp
            .global_bindings()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["+", "car", "cdr", "cons", "map", "null?"]);
    }
}
