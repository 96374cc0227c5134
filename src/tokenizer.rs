//! Lexical analysis: source text to an ordered sequence of [`Token`]s.
//!
//! The token set mirrors the shape of the language: three structural tokens
//! (`(`, `)`, and the close-everything `}`) plus literal tokens carrying the
//! same payload types as the corresponding [`Value`](crate::ast::Value)
//! variants. Strings are taken verbatim (no escape processing), `;` starts a
//! line comment, and `+`/`-` are symbols only when a delimiter follows,
//! otherwise they begin a signed numeric literal.

use nom::{
    IResult, Parser,
    bytes::complete::{take_while, take_while1},
};

use crate::ast::write_double;
use crate::{DEFAULT_MAX_TOKEN_LEN, Error, SyntaxError, SyntaxErrorKind};

/// Characters (other than letters) that may begin a symbol
pub(crate) const SYMBOL_INITIAL_CHARS: &str = "!$%&*/:<=>?~_^";

/// Characters (other than letters and digits) that may continue a symbol.
/// `+` and `-` can appear inside a symbol but cannot begin one.
pub(crate) const SYMBOL_CONSTITUENT_CHARS: &str = "!$%&*/:<=>?~_^+-";

fn is_symbol_initial(c: char) -> bool {
    c.is_alphabetic() || SYMBOL_INITIAL_CHARS.contains(c)
}

fn is_symbol_constituent(c: char) -> bool {
    c.is_alphanumeric() || SYMBOL_CONSTITUENT_CHARS.contains(c)
}

/// A lexical token, in source order
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(`
    Open,
    /// `)`
    Close,
    /// `}` - closes every currently-open level at once
    CloseBrace,
    Integer(i64),
    Double(f64),
    String(String),
    Boolean(bool),
    Symbol(String),
}

impl std::fmt::Display for Token {
    /// Diagnostic `value:type` rendering, one token per line when dumping a
    /// whole stream.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Open => write!(f, "(:open"),
            Token::Close => write!(f, "):close"),
            Token::CloseBrace => write!(f, "}}:closebrace"),
            Token::Integer(n) => write!(f, "{n}:integer"),
            Token::Double(d) => {
                write_double(f, *d)?;
                write!(f, ":double")
            }
            Token::String(s) => write!(f, "\"{s}\":string"),
            Token::Boolean(b) => write!(f, "{}:boolean", if *b { "#t" } else { "#f" }),
            Token::Symbol(s) => write!(f, "{s}:symbol"),
        }
    }
}

/// Control limits applied while tokenizing
#[derive(Debug, Clone, Copy)]
pub struct TokenizerConfig {
    /// Maximum length, in characters, of a single token's text (numeric
    /// literal, string contents, or symbol name). Longer tokens are
    /// reported as [`SyntaxErrorKind::TokenTooLong`].
    pub max_token_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
        }
    }
}

/// Tokenize `source` with the default limits
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    tokenize_with_config(source, TokenizerConfig::default())
}

/// Tokenize `source` to exhaustion, preserving source order
pub fn tokenize_with_config(source: &str, config: TokenizerConfig) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut rest = source;

    loop {
        rest = skip_atmosphere(rest);
        let Some(first) = rest.chars().next() else {
            break;
        };

        let (token, next) = match first {
            '(' => (Token::Open, &rest[1..]),
            ')' => (Token::Close, &rest[1..]),
            '}' => (Token::CloseBrace, &rest[1..]),
            '#' => lex_boolean(rest, source)?,
            '"' => lex_string(rest, source, &config)?,
            '+' | '-' => lex_signed(rest, source, &config)?,
            c if c.is_ascii_digit() || c == '.' => lex_number(rest, source, &config)?,
            c if is_symbol_initial(c) => lex_symbol(rest, source, &config)?,
            c => return Err(unrecognized(source, rest, c)),
        };
        tokens.push(token);
        rest = next;
    }

    Ok(tokens)
}

/// Skip whitespace and `;`-to-end-of-line comments
fn skip_atmosphere(input: &str) -> &str {
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        match trimmed.strip_prefix(';') {
            Some(comment) => match comment.find('\n') {
                Some(newline) => rest = &comment[newline + 1..],
                None => return "",
            },
            None => return trimmed,
        }
    }
}

fn numeric_run(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_digit() || c == '.').parse(input)
}

fn symbol_run(input: &str) -> IResult<&str, &str> {
    take_while1(is_symbol_constituent).parse(input)
}

fn string_run(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c != '"').parse(input)
}

fn syntax_error(
    kind: SyntaxErrorKind,
    message: impl Into<String>,
    source: &str,
    rest: &str,
    found: Option<String>,
) -> Error {
    Error::SyntaxError(SyntaxError::with_context_and_found(
        kind,
        message,
        source,
        source.len() - rest.len(),
        found,
    ))
}

fn unrecognized(source: &str, rest: &str, found: char) -> Error {
    syntax_error(
        SyntaxErrorKind::UnrecognizedCharacter,
        format!("Unrecognized character '{found}'"),
        source,
        rest,
        Some(found.to_string()),
    )
}

fn check_token_len(
    text: &str,
    source: &str,
    rest: &str,
    config: &TokenizerConfig,
) -> Result<(), Error> {
    if text.chars().count() > config.max_token_len {
        return Err(syntax_error(
            SyntaxErrorKind::TokenTooLong,
            format!(
                "Token exceeds the maximum length of {} characters",
                config.max_token_len
            ),
            source,
            rest,
            None,
        ));
    }
    Ok(())
}

/// `#t` / `#f`; anything else after `#` is an error
fn lex_boolean<'a>(rest: &'a str, source: &str) -> Result<(Token, &'a str), Error> {
    let mut chars = rest.chars();
    chars.next(); // consume '#'
    match chars.next() {
        Some('t') => Ok((Token::Boolean(true), chars.as_str())),
        Some('f') => Ok((Token::Boolean(false), chars.as_str())),
        found => Err(syntax_error(
            SyntaxErrorKind::UnrecognizedCharacter,
            "Expected #t or #f after '#'",
            source,
            rest,
            found.map(|c| c.to_string()),
        )),
    }
}

/// A double-quoted run with no escape processing; newlines are allowed inside
fn lex_string<'a>(
    rest: &'a str,
    source: &str,
    config: &TokenizerConfig,
) -> Result<(Token, &'a str), Error> {
    let (after, contents) = match string_run(&rest[1..]) {
        Ok(result) => result,
        Err(_) => ("", ""),
    };
    let Some(after_quote) = after.strip_prefix('"') else {
        return Err(syntax_error(
            SyntaxErrorKind::UnterminatedString,
            "Unterminated string",
            source,
            rest,
            None,
        ));
    };
    check_token_len(contents, source, rest, config)?;
    Ok((Token::String(contents.to_owned()), after_quote))
}

/// A run of digits and dots starting with a digit or `.`. One dot makes a
/// Double, zero dots an Integer; anything else is malformed.
fn lex_number<'a>(
    rest: &'a str,
    source: &str,
    config: &TokenizerConfig,
) -> Result<(Token, &'a str), Error> {
    let Ok((after, text)) = numeric_run(rest) else {
        return Err(malformed_number(source, rest, "Expected a numeric literal"));
    };
    if let Some(tail) = text.strip_prefix('.')
        && !tail.starts_with(|c: char| c.is_ascii_digit())
    {
        return Err(malformed_number(source, rest, "Expected a digit after '.'"));
    }
    check_token_len(text, source, rest, config)?;
    parse_numeric_text(text, source, rest).map(|token| (token, after))
}

/// `+`/`-` immediately followed by whitespace or a closing bracket is a
/// one-character symbol; followed by a digit it signs a numeric literal;
/// anything else is an error.
fn lex_signed<'a>(
    rest: &'a str,
    source: &str,
    config: &TokenizerConfig,
) -> Result<(Token, &'a str), Error> {
    let after_sign = &rest[1..];
    match after_sign.chars().next() {
        Some(c) if c.is_whitespace() || c == ')' || c == '}' => {
            Ok((Token::Symbol(rest[..1].to_owned()), after_sign))
        }
        Some(c) if c.is_ascii_digit() => {
            let Ok((after, digits)) = numeric_run(after_sign) else {
                return Err(malformed_number(source, rest, "Expected a numeric literal"));
            };
            let text = &rest[..1 + digits.len()];
            check_token_len(text, source, rest, config)?;
            parse_numeric_text(text, source, rest).map(|token| (token, after))
        }
        found => Err(syntax_error(
            SyntaxErrorKind::MalformedNumber,
            "Expected a digit or delimiter after sign",
            source,
            rest,
            found.map(|c| c.to_string()),
        )),
    }
}

fn lex_symbol<'a>(
    rest: &'a str,
    source: &str,
    config: &TokenizerConfig,
) -> Result<(Token, &'a str), Error> {
    let Ok((after, text)) = symbol_run(rest) else {
        return Err(unrecognized(source, rest, '\0'));
    };
    check_token_len(text, source, rest, config)?;
    Ok((Token::Symbol(text.to_owned()), after))
}

fn malformed_number(source: &str, rest: &str, message: &str) -> Error {
    syntax_error(
        SyntaxErrorKind::MalformedNumber,
        message,
        source,
        rest,
        None,
    )
}

fn parse_numeric_text(text: &str, source: &str, rest: &str) -> Result<Token, Error> {
    match text.matches('.').count() {
        0 => match text.parse::<i64>() {
            Ok(n) => Ok(Token::Integer(n)),
            Err(_) => Err(malformed_number(
                source,
                rest,
                "Integer literal out of range",
            )),
        },
        1 => match text.parse::<f64>() {
            Ok(d) => Ok(Token::Double(d)),
            Err(_) => Err(malformed_number(source, rest, "Malformed numeric literal")),
        },
        _ => Err(malformed_number(
            source,
            rest,
            "Numeric literal has more than one decimal point",
        )),
    }
}
