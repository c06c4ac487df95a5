//! Parser for the `select` mini-language
//!
//! ```text
//! query   := node (',' node)*
//! node    := '*' | '...' ident modifiers? '(' query ')' | ident ':' field | field
//! field   := ident modifiers? '(' query ')'
//!          | ident json_path? cast? agg? cast?
//! modifiers := '!' ident ('!' ('inner' | 'left'))?
//! json_path := (('->' | '->>') ident)+
//! cast    := '::' ident
//! agg     := '.' ('count'|'sum'|'avg'|'min'|'max') '()'
//! ident   := '"' [^"]* '"' | [A-Za-z0-9_]+
//! ```
//!
//! Failures that end the parse are cut errors carrying a [`StrContext`].
//! The innermost context and the stream offset become the [`SelectError`].

use indexmap::IndexMap;
use thiserror::Error;
use winnow::ascii::multispace0;
use winnow::combinator::{
    alt, cut_err, delimited, eof, fail, not, opt, peek, preceded, repeat, separated,
};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::{one_of, take_till, take_while};

use crate::ast::{Aggregate, ColumnDef, EmbedDef, JoinDef, JoinMap, JoinType, SelectEntry};

type PResult<T> = winnow::ModalResult<T>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("Unexpected input at position {position}: {remaining:?}")]
    UnexpectedToken { position: usize, remaining: String },

    #[error("Missing closing quote for identifier at position {position}")]
    UnterminatedQuotedIdentifier { position: usize },

    #[error("Expected {expected} at position {position}")]
    ExpectedToken {
        expected: &'static str,
        position: usize,
    },

    #[error("Embeds nested deeper than {limit} levels at position {position}")]
    NestingTooDeep { position: usize, limit: usize },
}

impl SelectError {
    pub fn position(&self) -> usize {
        match self {
            SelectError::UnexpectedToken { position, .. }
            | SelectError::UnterminatedQuotedIdentifier { position }
            | SelectError::ExpectedToken { position, .. }
            | SelectError::NestingTooDeep { position, .. } => *position,
        }
    }
}

/// Embed aliases per nesting level.
///
/// Each key is the alias of an embed at this level and maps to the aliases
/// of the embeds nested inside it. Dotted query keys are routed by walking
/// this tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedAliases(IndexMap<String, EmbeddedAliases>);

impl EmbeddedAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, nested: EmbeddedAliases) {
        self.0.insert(alias.into(), nested);
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.0.contains_key(alias)
    }

    pub fn get(&self, alias: &str) -> Option<&EmbeddedAliases> {
        self.0.get(alias)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Parsed `select` parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectResult {
    pub select: Vec<SelectEntry>,
    pub join: JoinMap,
    pub embedded: EmbeddedAliases,
}

/// Deepest embed nesting accepted
pub const MAX_EMBED_DEPTH: usize = 64;

const UNTERMINATED_QUOTE: &str = "closing quote";
const JOIN_TYPE: &str = "join type";
const NESTING: &str = "nesting depth";

/// Parse a `select` parameter. Absent or empty yields an empty result.
pub fn parse_select(raw: Option<&str>) -> Result<SelectResult, SelectError> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(SelectResult::default()),
    };

    let mut stream = raw;
    let mut level = Level::default();
    let select = match query(&mut stream, &mut level, 0) {
        Ok(select) => select,
        Err(e) => return Err(select_error(raw, stream, e)),
    };

    let rest = stream.trim_start();
    if !rest.is_empty() {
        return Err(SelectError::UnexpectedToken {
            position: offset(raw, rest),
            remaining: rest.to_string(),
        });
    }

    Ok(SelectResult {
        select,
        join: level.join,
        embedded: level.embedded,
    })
}

fn offset(input: &str, rest: &str) -> usize {
    input.len().saturating_sub(rest.len())
}

/// Map a failed parse to the error for the innermost context
fn select_error(input: &str, stream: &str, err: ErrMode<ContextError>) -> SelectError {
    let position = offset(input, stream);
    let context = match &err {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().next(),
        ErrMode::Incomplete(_) => None,
    };

    match context {
        Some(StrContext::Expected(
            StrContextValue::StringLiteral(expected) | StrContextValue::Description(expected),
        )) => SelectError::ExpectedToken {
            expected: *expected,
            position,
        },
        Some(StrContext::Label(label)) if *label == UNTERMINATED_QUOTE => {
            SelectError::UnterminatedQuotedIdentifier { position }
        }
        Some(StrContext::Label(label)) if *label == NESTING => SelectError::NestingTooDeep {
            position,
            limit: MAX_EMBED_DEPTH,
        },
        _ => SelectError::UnexpectedToken {
            position,
            remaining: stream.to_string(),
        },
    }
}

// ============ Lexical pieces ============

fn ws(input: &mut &str) -> PResult<()> {
    multispace0.void().parse_next(input)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn bare_identifier<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(1.., is_ident_char).parse_next(input)
}

/// `"..."`, taken verbatim. Unterminated quotes fail at the opening quote.
fn quoted_identifier<'a>(input: &mut &'a str) -> PResult<&'a str> {
    let start = input.checkpoint();
    '"'.parse_next(input)?;
    let body = take_till(0.., '"').parse_next(input)?;
    if opt('"').parse_next(input)?.is_none() {
        input.reset(&start);
        return cut_err(fail)
            .context(StrContext::Label(UNTERMINATED_QUOTE))
            .parse_next(input);
    }
    Ok(body)
}

fn identifier(input: &mut &str) -> PResult<String> {
    preceded(ws, alt((quoted_identifier, bare_identifier)))
        .map(str::to_string)
        .parse_next(input)
}

fn expect_identifier(input: &mut &str) -> PResult<String> {
    cut_err(identifier)
        .context(StrContext::Expected(StrContextValue::Description("identifier")))
        .parse_next(input)
}

fn expect(token: &'static str) -> impl FnMut(&mut &str) -> PResult<()> {
    move |input: &mut &str| {
        preceded(ws, cut_err(token))
            .void()
            .context(StrContext::Expected(StrContextValue::StringLiteral(token)))
            .parse_next(input)
    }
}

/// `::type`
fn cast(input: &mut &str) -> PResult<String> {
    preceded((ws, "::"), expect_identifier).parse_next(input)
}

/// `.agg()` for a known aggregate; anything else backtracks
fn aggregate_call(input: &mut &str) -> PResult<Aggregate> {
    delimited(
        (ws, '.'),
        bare_identifier.verify_map(Aggregate::from_name),
        "()",
    )
    .parse_next(input)
}

struct JsonPath {
    path: String,
    last: String,
}

/// `->a->>b`; `->>` extracts text, the path is the same
fn json_path(input: &mut &str) -> PResult<JsonPath> {
    let mut segment = preceded((ws, "->", opt('>')), expect_identifier);
    let first = segment.parse_next(input)?;
    let rest: Vec<String> = repeat(0.., segment).parse_next(input)?;

    let last = rest.last().unwrap_or(&first).clone();
    let segments: Vec<&str> = std::iter::once(first.as_str())
        .chain(rest.iter().map(String::as_str))
        .collect();
    Ok(JsonPath {
        path: format!("$.{}", segments.join(".")),
        last,
    })
}

fn join_type(name: &str) -> Option<JoinType> {
    match name {
        "inner" => Some(JoinType::Inner),
        "left" => Some(JoinType::Left),
        _ => None,
    }
}

/// `!hint`, `!inner`, `!left`, `!hint!inner`, `!hint!left`
fn join_modifiers(input: &mut &str) -> PResult<JoinDef> {
    let mut join = JoinDef::default();
    if opt((ws, '!')).parse_next(input)?.is_none() {
        return Ok(join);
    }

    let modifier = expect_identifier(input)?;
    if let Some(join_type) = join_type(&modifier) {
        join.join_type = join_type;
        return Ok(join);
    }
    join.hint = Some(modifier);

    if opt((ws, '!')).parse_next(input)?.is_some() {
        join.join_type = preceded(ws, cut_err(bare_identifier.verify_map(join_type)))
            .context(StrContext::Label(JOIN_TYPE))
            .parse_next(input)?;
    }
    Ok(join)
}

// ============ Grammar ============

/// Join map and embed aliases collected at one nesting level
#[derive(Default)]
struct Level {
    join: JoinMap,
    embedded: EmbeddedAliases,
}

impl Level {
    fn record_embed(&mut self, alias: &str, def: JoinDef, nested: EmbeddedAliases) {
        self.join.insert(alias.to_string(), def);
        self.embedded.insert(alias, nested);
    }
}

fn query(input: &mut &str, level: &mut Level, depth: usize) -> PResult<Vec<SelectEntry>> {
    ws.parse_next(input)?;
    if opt(peek(alt((eof.void(), ')'.void())))).parse_next(input)?.is_some() {
        return Ok(Vec::new());
    }
    separated(1.., |i: &mut &str| node(i, level, depth), (ws, ',')).parse_next(input)
}

fn node(input: &mut &str, level: &mut Level, depth: usize) -> PResult<SelectEntry> {
    ws.parse_next(input)?;

    if opt('*').parse_next(input)?.is_some() {
        return Ok(SelectEntry::Star);
    }
    if opt("...").parse_next(input)?.is_some() {
        return spread(input, level, depth);
    }

    let ident = expect_identifier(input)?;
    // `::` is a cast, a single `:` introduces an alias
    let target = opt(preceded((ws, ':', not(':')), expect_identifier)).parse_next(input)?;
    match target {
        Some(target) => field(input, level, depth, target, Some(ident)),
        None => field(input, level, depth, ident, None),
    }
}

fn spread(input: &mut &str, level: &mut Level, depth: usize) -> PResult<SelectEntry> {
    let relation = expect_identifier(input)?;
    let join = join_modifiers(input)?;
    let (select, nested) = embedded_query(input, depth)?;

    let def = EmbedDef {
        select,
        spread: true,
        join: (!nested.join.is_empty()).then_some(nested.join),
        ..Default::default()
    };
    level.record_embed(&relation, join, nested.embedded);

    Ok(SelectEntry::Embed {
        alias: relation,
        def,
    })
}

/// What may follow a bare `count` for it to be the standalone aggregate
fn count_follows(input: &mut &str) -> PResult<()> {
    peek(alt((
        eof.void(),
        one_of([',', ')']).void(),
        "()".void(),
        "::".void(),
    )))
    .parse_next(input)
}

fn field(
    input: &mut &str,
    level: &mut Level,
    depth: usize,
    ident: String,
    alias: Option<String>,
) -> PResult<SelectEntry> {
    ws.parse_next(input)?;

    if ident == "count" && opt(count_follows).parse_next(input)?.is_some() {
        return count_field(input, alias);
    }

    if opt(peek(one_of(['!', '(']))).parse_next(input)?.is_some() {
        return embed(input, level, depth, ident, alias);
    }

    column_field(input, ident, alias)
}

fn embed(
    input: &mut &str,
    level: &mut Level,
    depth: usize,
    relation: String,
    alias: Option<String>,
) -> PResult<SelectEntry> {
    let mut join = join_modifiers(input)?;
    let (select, nested) = embedded_query(input, depth)?;

    let def = EmbedDef {
        select,
        join: (!nested.join.is_empty()).then_some(nested.join),
        ..Default::default()
    };

    let alias = match alias {
        Some(alias) => {
            join.from = Some(relation);
            alias
        }
        None => relation,
    };
    level.record_embed(&alias, join, nested.embedded);

    Ok(SelectEntry::Embed { alias, def })
}

/// `'(' query ')'` with a fresh level; `()` selects everything
fn embedded_query(input: &mut &str, depth: usize) -> PResult<(Vec<SelectEntry>, Level)> {
    ws.parse_next(input)?;
    if depth >= MAX_EMBED_DEPTH {
        return cut_err(fail)
            .context(StrContext::Label(NESTING))
            .parse_next(input);
    }
    expect("(")(input)?;

    let mut nested = Level::default();
    if opt((ws, ')')).parse_next(input)?.is_some() {
        return Ok((vec![SelectEntry::Star], nested));
    }

    let select = query(input, &mut nested, depth + 1)?;
    expect(")")(input)?;

    Ok((select, nested))
}

/// Standalone `count()`, optionally cast
fn count_field(input: &mut &str, alias: Option<String>) -> PResult<SelectEntry> {
    opt("()").parse_next(input)?;
    let cast = opt(cast).parse_next(input)?;

    Ok(SelectEntry::Field {
        alias: alias.unwrap_or_else(|| "count".to_string()),
        def: ColumnDef {
            aggregate: Some(Aggregate::Count),
            cast,
            ..Default::default()
        },
    })
}

/// Casts and aggregate after the column: `::pre.agg()::post`, `.agg()::post`
/// or `::cast`
fn column_tail(
    input: &mut &str,
) -> PResult<(Option<String>, Option<Aggregate>, Option<String>)> {
    if let Some(first) = opt(cast).parse_next(input)? {
        return Ok(match opt(aggregate_call).parse_next(input)? {
            Some(aggregate) => (Some(first), Some(aggregate), opt(cast).parse_next(input)?),
            None => (None, None, Some(first)),
        });
    }

    match opt(aggregate_call).parse_next(input)? {
        Some(aggregate) => Ok((None, Some(aggregate), opt(cast).parse_next(input)?)),
        None => Ok((None, None, None)),
    }
}

fn column_field(input: &mut &str, ident: String, alias: Option<String>) -> PResult<SelectEntry> {
    let path = opt(json_path).parse_next(input)?;
    let (pre_cast, aggregate, cast) = column_tail(input)?;
    Ok(column_entry(ident, alias, path, pre_cast, aggregate, cast))
}

fn column_entry(
    ident: String,
    alias: Option<String>,
    path: Option<JsonPath>,
    pre_cast: Option<String>,
    aggregate: Option<Aggregate>,
    cast: Option<String>,
) -> SelectEntry {
    let (path, path_alias) = match path {
        Some(JsonPath { path, last }) => (Some(path), Some(last)),
        None => (None, None),
    };
    let alias = alias.or(path_alias);

    if alias.is_none()
        && pre_cast.is_none()
        && cast.is_none()
        && aggregate.is_none()
        && path.is_none()
    {
        return SelectEntry::Column(ident);
    }

    let key = alias.unwrap_or_else(|| ident.clone());
    let column = (ident != key || aggregate.is_some() || path.is_some()).then_some(ident);

    SelectEntry::Field {
        alias: key,
        def: ColumnDef {
            column,
            path,
            pre_cast,
            aggregate,
            cast,
        },
    }
}
