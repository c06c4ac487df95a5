//! Filter operator table
//!
//! Maps the lower-case operator tokens of the filter language (`eq`,
//! `like(any)`, `plfts(english)`, ...) to AST operators.

use winnow::combinator::{delimited, opt};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::ast::{BaseOperator, FilterOperator, Quantifier, TextSearchKind};

type PResult<T> = winnow::ModalResult<T>;

/// Token -> operator, one entry per base operator
pub const BASE_OPERATORS: &[(&str, BaseOperator)] = &[
    ("eq", BaseOperator::Eq),
    ("neq", BaseOperator::Neq),
    ("gt", BaseOperator::Gt),
    ("gte", BaseOperator::Gte),
    ("lt", BaseOperator::Lt),
    ("lte", BaseOperator::Lte),
    ("like", BaseOperator::Like),
    ("ilike", BaseOperator::Ilike),
    ("match", BaseOperator::Regex),
    ("imatch", BaseOperator::Iregex),
    ("is", BaseOperator::Is),
    ("isdistinct", BaseOperator::IsDistinct),
    ("in", BaseOperator::In),
    ("cs", BaseOperator::Contains),
    ("cd", BaseOperator::ContainedBy),
    ("ov", BaseOperator::Overlaps),
    ("sl", BaseOperator::RangeLt),
    ("sr", BaseOperator::RangeGt),
    ("nxl", BaseOperator::RangeGte),
    ("nxr", BaseOperator::RangeLte),
    ("adj", BaseOperator::RangeAdjacent),
];

/// Full-text search tokens and the search type each implies
pub const TEXT_SEARCH_OPERATORS: &[(&str, Option<TextSearchKind>)] = &[
    ("fts", None),
    ("plfts", Some(TextSearchKind::Plain)),
    ("phfts", Some(TextSearchKind::Phrase)),
    ("wfts", Some(TextSearchKind::Websearch)),
];

/// Query keys that never carry filters
pub const RESERVED_KEYS: &[&str] = &["select", "order", "limit", "offset", "on_conflict", "columns"];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

pub fn base_operator(token: &str) -> Option<BaseOperator> {
    BASE_OPERATORS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, op)| *op)
}

fn text_search_kind(token: &str) -> Option<Option<TextSearchKind>> {
    TEXT_SEARCH_OPERATORS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, kind)| *kind)
}

/// An operator token resolved against the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedOperator {
    Base(BaseOperator),
    Quantified(BaseOperator, Quantifier),
    TextSearch {
        kind: Option<TextSearchKind>,
        config: Option<String>,
    },
}

impl ResolvedOperator {
    pub fn filter_operator(&self) -> FilterOperator {
        match self {
            ResolvedOperator::Base(op) => FilterOperator::Base(*op),
            ResolvedOperator::Quantified(op, q) => FilterOperator::Quantified(*op, *q),
            ResolvedOperator::TextSearch { .. } => FilterOperator::TextSearch,
        }
    }
}

// ============ Token grammar ============

fn word<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

/// `word` or `word(arg)`
fn operator_token<'a>(input: &mut &'a str) -> PResult<(&'a str, Option<&'a str>)> {
    (
        word,
        opt(delimited('(', take_while(1.., |c: char| c != ')'), ')')),
    )
        .parse_next(input)
}

/// Resolve an operator token. `None` means the operator is unsupported.
pub fn parse_operator(token: &str) -> Option<ResolvedOperator> {
    let (name, arg) = operator_token.parse(token).ok()?;

    if let Some(quantifier) = arg.and_then(Quantifier::from_name) {
        return base_operator(name).map(|op| ResolvedOperator::Quantified(op, quantifier));
    }

    if let Some(kind) = text_search_kind(name) {
        return Some(ResolvedOperator::TextSearch {
            kind,
            config: arg.map(str::to_string),
        });
    }

    match arg {
        Some(_) => None,
        None => base_operator(name).map(ResolvedOperator::Base),
    }
}

/// Heuristic for RPC GET: does `value` look like `op.rest`?
///
/// The prefix before the first `.`, minus any `(any)`/`(all)` suffix, must
/// be a known operator token or `not`.
pub fn is_filter(value: &str) -> bool {
    let Some((prefix, _)) = value.split_once('.') else {
        return false;
    };
    let base = prefix
        .strip_suffix("(any)")
        .or_else(|| prefix.strip_suffix("(all)"))
        .unwrap_or(prefix);
    base == "not" || base_operator(base).is_some() || text_search_kind(base).is_some()
}
