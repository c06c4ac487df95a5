//! Scalar coercion and list literals used by filter and argument values

use serde_json::{Number, Value};
use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, opt, preceded, repeat};
use winnow::prelude::*;
use winnow::token::{any, none_of, one_of, take_till};

type PResult<T> = winnow::ModalResult<T>;

/// Interpret a raw query-string scalar.
///
/// `null`, `true` and `false` map to their JSON counterparts, decimal
/// numbers (surrounding whitespace ignored) become JSON numbers, and
/// everything else, including the empty string, is returned unchanged.
/// Whole numbers that fit in an `i64` serialize as integers, so `1e3`
/// becomes `1000`.
pub fn coerce_value(raw: &str) -> Value {
    match raw {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    coerce_number(raw).unwrap_or_else(|| Value::String(raw.to_string()))
}

fn coerce_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    decimal.parse(trimmed).ok()?;
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    let float: f64 = trimmed.parse().ok()?;
    if !float.is_finite() {
        return None;
    }
    if float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64 {
        return Some(Value::Number((float as i64).into()));
    }
    Number::from_f64(float).map(Value::Number)
}

/// Parse an `in` list: `(1,"a,b",3)` -> `[1, "a,b", 3]`.
///
/// Outer parentheses are optional. Quoted segments are taken verbatim
/// (commas included); unquoted segments are coerced.
pub fn parse_in_list(raw: &str) -> Vec<Value> {
    let inner = raw
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(raw);
    split_list(inner, false)
}

/// Parse an array literal: `{1,2,3}` -> `[1, 2, 3]`.
///
/// Like [`parse_in_list`] but brace-delimited, and a backslash inside a
/// quoted segment escapes the next character.
pub fn parse_array_literal(raw: &str) -> Vec<Value> {
    let inner = raw
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .unwrap_or(raw);
    split_list(inner, true)
}

fn split_list(inner: &str, unescape: bool) -> Vec<Value> {
    let mut input = inner;
    list_items(&mut input, unescape).unwrap_or_default()
}

// ============ Grammar ============

/// `[+-]digits[.digits][(e|E)[+-]digits]`, or a mantissa of `.digits`
fn decimal<'a>(input: &mut &'a str) -> PResult<&'a str> {
    (
        opt(one_of(['+', '-'])),
        alt(((digit1, opt(('.', digit0))).void(), ('.', digit1).void())),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .parse_next(input)
}

/// Items separated by `,`; a quoted item ends at its closing quote
fn list_items(input: &mut &str, unescape: bool) -> PResult<Vec<Value>> {
    let mut items = Vec::new();
    while !input.is_empty() {
        items.push(list_item(input, unescape)?);
        opt(',').parse_next(input)?;
    }
    Ok(items)
}

fn list_item(input: &mut &str, unescape: bool) -> PResult<Value> {
    if opt('"').parse_next(input)?.is_none() {
        return take_till(0.., ',').map(coerce_value).parse_next(input);
    }

    let item: String = if unescape {
        repeat(0.., alt((preceded('\\', any), none_of('"')))).parse_next(input)?
    } else {
        take_till(0.., '"').map(str::to_string).parse_next(input)?
    };
    // an unterminated quote runs to the end
    opt('"').parse_next(input)?;
    Ok(Value::String(item))
}
