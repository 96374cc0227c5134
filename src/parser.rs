//! Syntactic analysis: a token sequence to a forest of S-expression trees,
//! one tree per top-level expression, in source order.
//!
//! The parser is a single pass over the token stream with a work stack and a
//! pair of open/close counters. Non-bracket tokens and open-markers are
//! pushed; a `)` pops entries back to the nearest open-marker and pushes the
//! completed list; a `}` repeats that once per currently-open level. Nesting
//! depth is bounded only by memory - there is no recursion here.

use crate::ast::Value;
use crate::tokenizer::Token;
use crate::{Error, SyntaxError, SyntaxErrorKind};

/// Work-stack entry: either the marker for an unclosed `(`, or a finished
/// value (literal, symbol, or completed list).
enum Entry {
    Open,
    Value(Value),
}

/// Parse a token stream into a forest of trees
pub fn parse(tokens: &[Token]) -> Result<Vec<Value>, Error> {
    let mut stack: Vec<Entry> = Vec::new();
    let mut num_open: usize = 0;
    let mut num_close: usize = 0;

    for (position, token) in tokens.iter().enumerate() {
        match token {
            Token::Open => {
                num_open += 1;
                stack.push(Entry::Open);
            }
            Token::Close => {
                num_close += 1;
                if num_close > num_open {
                    return Err(SyntaxError::from_message(
                        SyntaxErrorKind::TooManyCloses,
                        "Too many close parentheses",
                    )
                    .into());
                }
                collapse_level(&mut stack);
            }
            Token::CloseBrace => {
                if num_close >= num_open {
                    return Err(SyntaxError::from_message(
                        SyntaxErrorKind::TooManyCloses,
                        "Close brace with nothing open",
                    )
                    .into());
                }
                // A brace must end the expression: only end-of-input or a
                // fresh `(` may follow.
                if let Some(next) = tokens.get(position + 1)
                    && !matches!(next, Token::Open)
                {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::MisusedCloseBrace,
                        "Close brace must be followed by end of input or a new expression",
                        None,
                        Some(next.to_string()),
                    )
                    .into());
                }
                while num_close < num_open {
                    num_close += 1;
                    collapse_level(&mut stack);
                }
            }
            literal => stack.push(Entry::Value(literal_value(literal))),
        }
    }

    if num_close < num_open {
        return Err(SyntaxError::from_message(
            SyntaxErrorKind::NotEnoughCloses,
            "Not enough close parentheses",
        )
        .into());
    }

    // Everything left is a completed top-level expression, bottom-of-stack
    // first, which is source order.
    Ok(stack
        .into_iter()
        .map(|entry| match entry {
            Entry::Value(value) => value,
            // The counters guarantee every open-marker was consumed
            Entry::Open => unreachable!("unclosed open-marker survived the counter check"),
        })
        .collect())
}

/// Pop entries down to the nearest open-marker and push the completed list.
/// Popping most-recent-first and consing onto the front restores the
/// original left-to-right order.
fn collapse_level(stack: &mut Vec<Entry>) {
    let mut list = Value::Null;
    loop {
        match stack.pop() {
            Some(Entry::Value(value)) => list = Value::cons(value, list),
            Some(Entry::Open) => break,
            // The caller's counters guarantee a matching open-marker
            None => unreachable!("close parenthesis without a matching open"),
        }
    }
    stack.push(Entry::Value(list));
}

fn literal_value(token: &Token) -> Value {
    match token {
        Token::Integer(n) => Value::Integer(*n),
        Token::Double(d) => Value::Double(*d),
        Token::String(s) => Value::String(s.clone()),
        Token::Boolean(b) => Value::Boolean(*b),
        Token::Symbol(s) => Value::Symbol(s.clone()),
        Token::Open | Token::Close | Token::CloseBrace => {
            unreachable!("structural tokens are handled by the parse loop")
        }
    }
}
