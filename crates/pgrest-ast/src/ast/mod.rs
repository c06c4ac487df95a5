//! AST types for translated resource requests
//!
//! Split into:
//! - `select`: the select tree (columns, aggregates, embeds) and join metadata
//! - `filter`: boolean filter trees (`where`)
//! - `meta`: response-shaping flags (`$meta`)
//!
//! Every type serializes to the plain nested-mapping shape consumed by the
//! SQL code generator, so `serde_json::to_value(&ast)` is the wire format.

pub mod filter;
pub mod meta;
pub mod select;

use serde::Serialize;

pub use filter::{
    BaseOperator, FilterOperator, LogicalOp, Operand, OperatorMap, Quantifier, TextSearch,
    TextSearchKind, Where, WhereKey, WhereNode,
};
pub use meta::{
    Cardinality, CountStrategy, ExplainOptions, Handling, Meta, MissingPolicy, ReturnPreference,
    TxMode,
};
pub use select::{Aggregate, ColumnDef, EmbedDef, JoinDef, JoinMap, JoinType, SelectEntry};

// ============ Root ============

/// Kind of statement a request translates to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AstType {
    Query,
    Insert,
    Update,
    Delete,
    Upsert,
    Rpc,
}

impl AstType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AstType::Query => "query",
            AstType::Insert => "insert",
            AstType::Update => "update",
            AstType::Delete => "delete",
            AstType::Upsert => "upsert",
            AstType::Rpc => "rpc",
        }
    }

    /// Statement kinds that carry a request body as `values`
    pub fn is_mutation(&self) -> bool {
        matches!(self, AstType::Insert | AstType::Update | AstType::Upsert)
    }
}

/// What the request targets: a relation (`from`) or a function (`function`).
///
/// Chosen once from the route and never switched afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Target {
    Relation {
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },
    Function {
        function: String,
    },
}

impl Target {
    pub fn relation(&self) -> Option<&str> {
        match self {
            Target::Relation { from } => from.as_deref(),
            Target::Function { .. } => None,
        }
    }

    pub fn function(&self) -> Option<&str> {
        match self {
            Target::Function { function } => Some(function),
            Target::Relation { .. } => None,
        }
    }
}

/// The translation result for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ast {
    #[serde(rename = "type")]
    pub kind: AstType,
    #[serde(flatten)]
    pub target: Target,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<SelectEntry>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Where>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<OrderEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_conflict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_duplicates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<RpcHttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params_type: Option<ParamsType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(rename = "$meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Ast {
    /// Empty AST of the given kind; every optional section unset
    pub fn new(kind: AstType, target: Target) -> Self {
        Self {
            kind,
            target,
            schema: None,
            join: None,
            select: None,
            filter: None,
            values: None,
            args: None,
            order: None,
            limit: None,
            offset: None,
            on_conflict: None,
            ignore_duplicates: None,
            http_method: None,
            params_type: None,
            input_type: None,
            meta: None,
        }
    }
}

// ============ Transforms ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// One `order` item: `column[.asc|desc][.nullsfirst|nullslast]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEntry {
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nulls_first: Option<bool>,
}

impl OrderEntry {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: None,
            nulls_first: None,
        }
    }
}

// ============ RPC shape ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RpcHttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamsType {
    Named,
    Positional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Json,
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relation_target_flattens_into_root() {
        let ast = Ast::new(
            AstType::Query,
            Target::Relation {
                from: Some("products".into()),
            },
        );
        assert_eq!(
            serde_json::to_value(&ast).unwrap(),
            json!({"type": "query", "from": "products"})
        );
    }

    #[test]
    fn missing_relation_is_omitted() {
        let ast = Ast::new(AstType::Query, Target::Relation { from: None });
        assert_eq!(serde_json::to_value(&ast).unwrap(), json!({"type": "query"}));
    }

    #[test]
    fn function_target_and_rpc_fields() {
        let mut ast = Ast::new(
            AstType::Rpc,
            Target::Function {
                function: "search".into(),
            },
        );
        ast.http_method = Some(RpcHttpMethod::Get);
        ast.params_type = Some(ParamsType::Named);
        ast.input_type = Some(InputType::Json);
        assert_eq!(
            serde_json::to_value(&ast).unwrap(),
            json!({
                "type": "rpc",
                "function": "search",
                "httpMethod": "GET",
                "paramsType": "named",
                "inputType": "json",
            })
        );
    }

    #[test]
    fn order_entry_omits_defaults() {
        let mut entry = OrderEntry::new("price");
        assert_eq!(serde_json::to_value(&entry).unwrap(), json!({"column": "price"}));
        entry.direction = Some(Direction::Desc);
        entry.nulls_first = Some(false);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"column": "price", "direction": "desc", "nullsFirst": false})
        );
    }
}
