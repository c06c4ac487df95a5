//! Select tree: columns, computed fields and relation embeds

use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use super::{OrderEntry, Where};

/// Aggregate functions callable as `column.fn()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "count" => Some(Aggregate::Count),
            "sum" => Some(Aggregate::Sum),
            "avg" => Some(Aggregate::Avg),
            "min" => Some(Aggregate::Min),
            "max" => Some(Aggregate::Max),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }
}

/// A computed or renamed column.
///
/// `column` is omitted when it equals the entry's alias, except for
/// aggregates and JSON paths which always name their source column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// JSON path as `$.a.b.c`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Cast applied to the column before aggregation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_cast: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    /// Cast applied to the final value (after aggregation, if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<String>,
}

/// A nested relation selected alongside the parent row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbedDef {
    pub select: Vec<SelectEntry>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Where>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<OrderEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Flatten the embedded columns into the parent row
    #[serde(skip_serializing_if = "is_false")]
    pub spread: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinMap>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// One item of a `select` list, in source order
#[derive(Debug, Clone, PartialEq)]
pub enum SelectEntry {
    /// `*`
    Star,
    /// Plain column with no alias, cast, aggregate or path
    Column(String),
    /// `alias: { column, path, preCast, aggregate, cast }`
    Field { alias: String, def: ColumnDef },
    /// `alias: { select, where, order, ... }`
    Embed { alias: String, def: EmbedDef },
}

impl SelectEntry {
    /// Output name of the entry (`*` for the star)
    pub fn name(&self) -> &str {
        match self {
            SelectEntry::Star => "*",
            SelectEntry::Column(name) => name,
            SelectEntry::Field { alias, .. } | SelectEntry::Embed { alias, .. } => alias,
        }
    }

    pub fn as_embed(&self) -> Option<(&str, &EmbedDef)> {
        match self {
            SelectEntry::Embed { alias, def } => Some((alias, def)),
            _ => None,
        }
    }
}

impl Serialize for SelectEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SelectEntry::Star => serializer.serialize_str("*"),
            SelectEntry::Column(name) => serializer.serialize_str(name),
            SelectEntry::Field { alias, def } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(alias, def)?;
                map.end()
            }
            SelectEntry::Embed { alias, def } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(alias, def)?;
                map.end()
            }
        }
    }
}

// ============ Joins ============

/// Join metadata keyed by select-tree alias
pub type JoinMap = IndexMap<String, JoinDef>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Left,
    Inner,
}

impl JoinType {
    pub fn is_left(&self) -> bool {
        matches!(self, JoinType::Left)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinDef {
    /// Underlying relation when the embed is aliased
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "JoinType::is_left")]
    pub join_type: JoinType,
    /// Relationship or constraint name used for disambiguation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
