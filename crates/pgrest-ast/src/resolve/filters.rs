//! Filter resolution: per-column operators and logical groups

use indexmap::IndexMap;
use log::trace;
use serde_json::Value;
use thiserror::Error;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, cut_err, fail, opt, peek, repeat, separated};
use winnow::error::StrContext;
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::{any, take_till};

use super::{AliasPath, is_transform_key, split_embedded_key};
use crate::ast::{
    BaseOperator, FilterOperator, LogicalOp, Operand, OperatorMap, TextSearch, Where,
};
use crate::operators::{ResolvedOperator, is_reserved, parse_operator};
use crate::parse::EmbeddedAliases;
use crate::request::QueryParams;
use crate::values::{coerce_value, parse_array_literal, parse_in_list};

type PResult<T> = winnow::ModalResult<T>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Unknown operator: {0:?}")]
    UnknownOperator(String),

    #[error("Invalid logical expression: {0:?}")]
    InvalidLogicalExpression(String),

    #[error("Logical expression nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Top-level filter plus one filter per embed that has any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub filter: Where,
    pub embedded: IndexMap<AliasPath, Where>,
}

pub fn resolve_filters(
    params: &QueryParams,
    embedded: &EmbeddedAliases,
) -> Result<Filters, FilterError> {
    let mut filters = Filters::default();

    for (key, values) in params.iter() {
        if is_reserved(key) {
            continue;
        }

        let (path, rest) = split_embedded_key(key, embedded);
        if path.is_empty() {
            apply_filter_key(&mut filters.filter, key, values)?;
            continue;
        }
        if is_transform_key(rest) {
            continue;
        }
        let target = filters.embedded.entry(path).or_default();
        apply_filter_key(target, rest, values)?;
    }

    trace!(
        "resolved filters: {} top-level keys, {} embedded",
        filters.filter.len(),
        filters.embedded.len()
    );
    Ok(filters)
}

fn apply_filter_key(target: &mut Where, key: &str, values: &[String]) -> Result<(), FilterError> {
    let (negated, name) = match key.strip_prefix("not.") {
        Some(name) => (true, name),
        None => (false, key),
    };

    if let Some(op) = LogicalOp::from_name(name) {
        let mut items = Vec::new();
        for value in values {
            items.extend(parse_logical_group(value)?);
        }
        if negated {
            target.add_negated(Where::group(op, items));
        } else {
            target.add_group(op, items);
        }
        return Ok(());
    }

    for value in values {
        target.add_column_filter(key, parse_filter_value(value)?);
    }
    Ok(())
}

/// Parse `[not.]operator.value` into an operator map.
///
/// `not.in` becomes `$notIn`; every other negation wraps as
/// `{ $not: { op: value } }`.
pub fn parse_filter_value(value: &str) -> Result<OperatorMap, FilterError> {
    let (negated, rest) = match value.strip_prefix("not.") {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (token, raw) = rest.split_once('.').unwrap_or((rest, ""));

    let resolved =
        parse_operator(token).ok_or_else(|| FilterError::UnknownOperator(token.to_string()))?;

    if negated && resolved == ResolvedOperator::Base(BaseOperator::In) {
        return Ok(OperatorMap::single(
            FilterOperator::NotIn,
            Operand::Value(Value::Array(parse_in_list(raw))),
        ));
    }

    let op = resolved.filter_operator();
    let operand = operand(resolved, raw);
    Ok(if negated {
        OperatorMap::negated(op, operand)
    } else {
        OperatorMap::single(op, operand)
    })
}

fn operand(op: ResolvedOperator, raw: &str) -> Operand {
    let value = match op {
        ResolvedOperator::TextSearch { kind, config } => {
            return Operand::TextSearch(TextSearch {
                query: raw.to_string(),
                kind,
                config,
            });
        }
        ResolvedOperator::Quantified(..) => Value::Array(if raw.starts_with('{') {
            parse_array_literal(raw)
        } else {
            parse_in_list(raw)
        }),
        ResolvedOperator::Base(BaseOperator::In) => Value::Array(parse_in_list(raw)),
        ResolvedOperator::Base(base) if base.is_containment() => containment_operand(raw),
        ResolvedOperator::Base(base) if base.is_range() => Value::String(raw.to_string()),
        ResolvedOperator::Base(_) => coerce_value(raw),
    };
    Operand::Value(value)
}

/// `{...}` is a JSON object or an array literal; `[..`/`(..` is a range
fn containment_operand(raw: &str) -> Value {
    if raw.starts_with('{') {
        return match serde_json::from_str::<Value>(raw) {
            Ok(object @ Value::Object(_)) => object,
            _ => Value::Array(parse_array_literal(raw)),
        };
    }
    if raw.starts_with('[') || raw.starts_with('(') {
        return Value::String(raw.to_string());
    }
    coerce_value(raw)
}

// ============ Logical groups ============

/// Deepest `and(...)`/`or(...)` nesting accepted in one group
pub const MAX_LOGICAL_DEPTH: usize = 64;

const NESTING: &str = "nesting depth";

/// A group expression before its conditions are resolved
enum RawExpr<'a> {
    Group {
        op: LogicalOp,
        negated: bool,
        items: Vec<RawExpr<'a>>,
    },
    Condition(&'a str),
}

/// `(expr,expr,...)` -> one `Where` per expression
fn parse_logical_group(raw: &str) -> Result<Vec<Where>, FilterError> {
    let parsed = if raw.starts_with('(') {
        top_level_group.parse(raw)
    } else {
        expression_list.parse(raw)
    };
    let items = parsed.map_err(|e| {
        let too_deep = e
            .inner()
            .context()
            .any(|c| matches!(c, StrContext::Label(label) if *label == NESTING));
        if too_deep {
            FilterError::NestingTooDeep(MAX_LOGICAL_DEPTH)
        } else {
            FilterError::InvalidLogicalExpression(raw.to_string())
        }
    })?;
    build_items(items)
}

fn build_items(items: Vec<RawExpr<'_>>) -> Result<Vec<Where>, FilterError> {
    items
        .into_iter()
        .filter(|item| !matches!(item, RawExpr::Condition("")))
        .map(build_where)
        .collect()
}

fn build_where(expr: RawExpr<'_>) -> Result<Where, FilterError> {
    match expr {
        RawExpr::Group { op, negated, items } => {
            let group = Where::group(op, build_items(items)?);
            Ok(if negated {
                Where::negation(group)
            } else {
                group
            })
        }
        RawExpr::Condition(text) => parse_condition(text),
    }
}

/// `column.op.value` or `not.column.op.value`
fn parse_condition(expr: &str) -> Result<Where, FilterError> {
    let (negated, rest) = match expr.strip_prefix("not.") {
        Some(rest) => (true, rest),
        None => (false, expr),
    };
    let Some((column, op_and_value)) = rest.split_once('.') else {
        return Err(FilterError::InvalidLogicalExpression(expr.to_string()));
    };

    let ops = if negated {
        parse_filter_value(&format!("not.{op_and_value}"))?
    } else {
        parse_filter_value(op_and_value)?
    };
    Ok(Where::column(column, ops))
}

fn top_level_group<'a>(input: &mut &'a str) -> PResult<Vec<RawExpr<'a>>> {
    group_items(input, 0)
}

fn expression_list<'a>(input: &mut &'a str) -> PResult<Vec<RawExpr<'a>>> {
    expressions(input, 0)
}

/// `'(' expr (',' expr)* ')'`
fn group_items<'a>(input: &mut &'a str, depth: usize) -> PResult<Vec<RawExpr<'a>>> {
    if depth >= MAX_LOGICAL_DEPTH {
        return cut_err(fail).context(StrContext::Label(NESTING)).parse_next(input);
    }
    '('.parse_next(input)?;
    let items = expressions(input, depth)?;
    cut_err(')').parse_next(input)?;
    Ok(items)
}

fn expressions<'a>(input: &mut &'a str, depth: usize) -> PResult<Vec<RawExpr<'a>>> {
    separated(0.., |i: &mut &'a str| expression(i, depth), ',').parse_next(input)
}

/// A nested `[not.](and|or)(...)` group or a condition
fn expression<'a>(input: &mut &'a str, depth: usize) -> PResult<RawExpr<'a>> {
    multispace0.parse_next(input)?;

    let group = opt((
        opt("not.").map(|not| not.is_some()),
        alt(("and".value(LogicalOp::And), "or".value(LogicalOp::Or))),
        peek('('),
    ))
    .parse_next(input)?;

    if let Some((negated, op, _)) = group {
        let items = group_items(input, depth + 1)?;
        multispace0.parse_next(input)?;
        return Ok(RawExpr::Group { op, negated, items });
    }

    condition_text
        .map(|text: &'a str| RawExpr::Condition(text.trim()))
        .parse_next(input)
}

/// Text up to the next `,` or `)` outside parentheses
fn condition_text<'a>(input: &mut &'a str) -> PResult<&'a str> {
    repeat::<_, _, (), _, _>(
        0..,
        alt((take_till(1.., ['(', ')', ',']).void(), parenthesized)),
    )
    .take()
    .parse_next(input)
}

/// A balanced `(...)` run inside a value, such as an `in` list
fn parenthesized(input: &mut &str) -> PResult<()> {
    let start = input.checkpoint();
    '('.parse_next(input)?;

    let mut depth = 1usize;
    while depth > 0 {
        take_till(0.., ['(', ')']).parse_next(input)?;
        match any.parse_next(input) {
            Ok('(') => depth += 1,
            Ok(_) => depth -= 1,
            Err(e) => {
                input.reset(&start);
                return Err(e);
            }
        }
    }
    Ok(())
}
