//! Boolean filter trees
//!
//! A [`Where`] is an ordered mapping whose keys are either column names
//! (mapping to an [`OperatorMap`]) or one of the logical keys `$and`, `$or`
//! (mapping to a list of `Where`) and `$not` (mapping to a single `Where`).
//! All keys of one level are implicitly AND-ed.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::Serializer;

// ============ Operators ============

/// Operators with a direct AST name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Regex,
    Iregex,
    Is,
    IsDistinct,
    In,
    Contains,
    ContainedBy,
    Overlaps,
    RangeLt,
    RangeGt,
    RangeGte,
    RangeLte,
    RangeAdjacent,
}

impl BaseOperator {
    pub fn ast_name(&self) -> &'static str {
        match self {
            BaseOperator::Eq => "$eq",
            BaseOperator::Neq => "$neq",
            BaseOperator::Gt => "$gt",
            BaseOperator::Gte => "$gte",
            BaseOperator::Lt => "$lt",
            BaseOperator::Lte => "$lte",
            BaseOperator::Like => "$like",
            BaseOperator::Ilike => "$ilike",
            BaseOperator::Regex => "$regex",
            BaseOperator::Iregex => "$iregex",
            BaseOperator::Is => "$is",
            BaseOperator::IsDistinct => "$isDistinct",
            BaseOperator::In => "$in",
            BaseOperator::Contains => "$contains",
            BaseOperator::ContainedBy => "$containedBy",
            BaseOperator::Overlaps => "$overlaps",
            BaseOperator::RangeLt => "$rangeLt",
            BaseOperator::RangeGt => "$rangeGt",
            BaseOperator::RangeGte => "$rangeGte",
            BaseOperator::RangeLte => "$rangeLte",
            BaseOperator::RangeAdjacent => "$rangeAdjacent",
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(
            self,
            BaseOperator::RangeLt
                | BaseOperator::RangeGt
                | BaseOperator::RangeGte
                | BaseOperator::RangeLte
                | BaseOperator::RangeAdjacent
        )
    }

    /// `cs`, `cd` and `ov`: operands may be arrays, JSON objects or ranges
    pub fn is_containment(&self) -> bool {
        matches!(
            self,
            BaseOperator::Contains | BaseOperator::ContainedBy | BaseOperator::Overlaps
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Any,
    All,
}

impl Quantifier {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "any" => Some(Quantifier::Any),
            "all" => Some(Quantifier::All),
            _ => None,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Quantifier::Any => "Any",
            Quantifier::All => "All",
        }
    }
}

/// Key of an operator map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Base(BaseOperator),
    /// `eq(any)` -> `$eqAny`
    Quantified(BaseOperator, Quantifier),
    /// `not.in` has its own name instead of `$not: { $in }`
    NotIn,
    TextSearch,
    /// Wraps exactly one nested operator map
    Not,
}

impl FilterOperator {
    pub fn ast_name(&self) -> Cow<'static, str> {
        match self {
            FilterOperator::Base(op) => Cow::Borrowed(op.ast_name()),
            FilterOperator::Quantified(op, q) => {
                Cow::Owned(format!("{}{}", op.ast_name(), q.suffix()))
            }
            FilterOperator::NotIn => Cow::Borrowed("$notIn"),
            FilterOperator::TextSearch => Cow::Borrowed("$textSearch"),
            FilterOperator::Not => Cow::Borrowed("$not"),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ast_name())
    }
}

impl Serialize for FilterOperator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.ast_name())
    }
}

// ============ Operands ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSearchKind {
    Plain,
    Phrase,
    Websearch,
}

/// Operand of `$textSearch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSearch {
    pub query: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TextSearchKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Value(serde_json::Value),
    TextSearch(TextSearch),
    /// Operand of `$not`
    Negated(OperatorMap),
}

/// `{ operator: operand, ... }` for one column; entries are AND-ed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OperatorMap(IndexMap<FilterOperator, Operand>);

impl OperatorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(op: FilterOperator, operand: Operand) -> Self {
        let mut map = Self::new();
        map.0.insert(op, operand);
        map
    }

    /// `{ $not: { op: operand } }`
    pub fn negated(op: FilterOperator, operand: Operand) -> Self {
        Self::single(
            FilterOperator::Not,
            Operand::Negated(Self::single(op, operand)),
        )
    }

    pub fn get(&self, op: &FilterOperator) -> Option<&Operand> {
        self.0.get(op)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FilterOperator, &Operand)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when both maps constrain the same operator
    pub fn overlaps(&self, other: &OperatorMap) -> bool {
        other.0.keys().any(|op| self.0.contains_key(op))
    }

    /// Add the entries of `other`. Callers check [`OperatorMap::overlaps`]
    /// first; an operator already present is replaced.
    pub fn extend(&mut self, other: OperatorMap) {
        self.0.extend(other.0);
    }
}

// ============ Where ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "and" => Some(LogicalOp::And),
            "or" => Some(LogicalOp::Or),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WhereKey {
    Column(String),
    Logical(LogicalOp),
    Not,
}

impl WhereKey {
    pub fn as_str(&self) -> &str {
        match self {
            WhereKey::Column(name) => name,
            WhereKey::Logical(LogicalOp::And) => "$and",
            WhereKey::Logical(LogicalOp::Or) => "$or",
            WhereKey::Not => "$not",
        }
    }
}

impl Serialize for WhereKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WhereNode {
    Operators(OperatorMap),
    Group(Vec<Where>),
    Negated(Box<Where>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Where(IndexMap<WhereKey, WhereNode>);

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(name: impl Into<String>, ops: OperatorMap) -> Self {
        let mut w = Self::new();
        w.add_column_filter(name, ops);
        w
    }

    pub fn group(op: LogicalOp, items: Vec<Where>) -> Self {
        let mut w = Self::new();
        w.add_group(op, items);
        w
    }

    pub fn negation(inner: Where) -> Self {
        let mut w = Self::new();
        w.add_negated(inner);
        w
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &WhereKey) -> Option<&WhereNode> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WhereKey, &WhereNode)> {
        self.0.iter()
    }

    /// Operator map of a column, if filtered
    pub fn column_ops(&self, name: &str) -> Option<&OperatorMap> {
        match self.0.get(&WhereKey::Column(name.to_string())) {
            Some(WhereNode::Operators(ops)) => Some(ops),
            _ => None,
        }
    }

    /// AND `ops` into the column's filter. Operators new to the column join
    /// its operator map; a repeated operator (`$not` included) is AND-ed in
    /// through `$and: [{ column: ops }]` so no condition is lost.
    pub fn add_column_filter(&mut self, name: impl Into<String>, ops: OperatorMap) {
        let key = WhereKey::Column(name.into());
        let repeated = match self.0.get(&key) {
            Some(WhereNode::Operators(existing)) => existing.overlaps(&ops),
            Some(_) => true,
            None => false,
        };

        if repeated {
            let mut nested = Where::new();
            nested.0.insert(key, WhereNode::Operators(ops));
            self.add_group(LogicalOp::And, vec![nested]);
            return;
        }

        let entry = self
            .0
            .entry(key)
            .or_insert_with(|| WhereNode::Operators(OperatorMap::new()));
        if let WhereNode::Operators(existing) = entry {
            existing.extend(ops);
        }
    }

    /// Append items to the `$and`/`$or` list of this level
    pub fn add_group(&mut self, op: LogicalOp, items: Vec<Where>) {
        let entry = self
            .0
            .entry(WhereKey::Logical(op))
            .or_insert_with(|| WhereNode::Group(Vec::new()));
        if let WhereNode::Group(existing) = entry {
            existing.extend(items);
        }
    }

    /// Set `$not`. A level holds at most one `$not`; further negations are
    /// AND-ed in through `$and: [{ $not: ... }]`.
    pub fn add_negated(&mut self, inner: Where) {
        if self.0.contains_key(&WhereKey::Not) {
            self.add_group(LogicalOp::And, vec![Where::negation(inner)]);
        } else {
            self.0.insert(WhereKey::Not, WhereNode::Negated(Box::new(inner)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eq(v: serde_json::Value) -> OperatorMap {
        OperatorMap::single(FilterOperator::Base(BaseOperator::Eq), Operand::Value(v))
    }

    #[test]
    fn quantified_names_append_suffix() {
        let op = FilterOperator::Quantified(BaseOperator::Like, Quantifier::All);
        assert_eq!(op.ast_name(), "$likeAll");
        assert_eq!(
            FilterOperator::Quantified(BaseOperator::IsDistinct, Quantifier::Any).to_string(),
            "$isDistinctAny"
        );
    }

    #[test]
    fn column_filters_merge_instead_of_overwriting() {
        let mut w = Where::new();
        w.add_column_filter(
            "price",
            OperatorMap::single(FilterOperator::Base(BaseOperator::Gte), Operand::Value(json!(100))),
        );
        w.add_column_filter(
            "price",
            OperatorMap::single(FilterOperator::Base(BaseOperator::Lte), Operand::Value(json!(500))),
        );
        assert_eq!(
            serde_json::to_value(&w).unwrap(),
            json!({"price": {"$gte": 100, "$lte": 500}})
        );
    }

    #[test]
    fn repeated_operators_are_anded_in() {
        let not_eq = OperatorMap::negated(
            FilterOperator::Base(BaseOperator::Eq),
            Operand::Value(json!("a")),
        );
        let not_like = OperatorMap::negated(
            FilterOperator::Base(BaseOperator::Like),
            Operand::Value(json!("b*")),
        );
        let mut w = Where::column("name", not_eq);
        w.add_column_filter("name", not_like);
        assert_eq!(
            serde_json::to_value(&w).unwrap(),
            json!({
                "name": {"$not": {"$eq": "a"}},
                "$and": [{"name": {"$not": {"$like": "b*"}}}],
            })
        );

        let mut w = Where::column("id", eq(json!(1)));
        w.add_column_filter("id", eq(json!(2)));
        w.add_column_filter("id", eq(json!(3)));
        assert_eq!(
            serde_json::to_value(&w).unwrap(),
            json!({
                "id": {"$eq": 1},
                "$and": [{"id": {"$eq": 2}}, {"id": {"$eq": 3}}],
            })
        );
    }

    #[test]
    fn second_negation_is_anded_in() {
        let mut w = Where::new();
        w.add_negated(Where::group(LogicalOp::Or, vec![Where::column("a", eq(json!(1)))]));
        w.add_negated(Where::group(LogicalOp::And, vec![Where::column("b", eq(json!(2)))]));
        assert_eq!(
            serde_json::to_value(&w).unwrap(),
            json!({
                "$not": {"$or": [{"a": {"$eq": 1}}]},
                "$and": [{"$not": {"$and": [{"b": {"$eq": 2}}]}}],
            })
        );
    }
}
