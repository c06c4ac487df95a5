//! Phase-2 resolvers
//!
//! Each resolver combines Phase-1 results into one section of the AST.
//! Embedded filters and transforms are collected into side tables keyed by
//! alias path; the translator splices them into the select tree.

pub mod filters;
pub mod kind;
pub mod meta;
pub mod rpc;
pub mod transforms;
pub mod upsert;

pub use filters::{FilterError, Filters, parse_filter_value, resolve_filters};
pub use kind::resolve_type;
pub use meta::resolve_meta;
pub use rpc::{RpcParams, args_from_query, resolve_rpc_params, rpc_filter_params};
pub use transforms::{Transform, TransformError, Transforms, parse_order, resolve_transforms};
pub use upsert::{UpsertParams, resolve_upsert_params};

use crate::parse::EmbeddedAliases;

/// Aliases from the outermost embed inwards
pub type AliasPath = Vec<String>;

/// Keys handled by the transform resolver, also in `alias.key` form
pub const TRANSFORM_KEYS: &[&str] = &["order", "limit", "offset"];

pub fn is_transform_key(key: &str) -> bool {
    TRANSFORM_KEYS.contains(&key)
}

/// Peel leading embed aliases off a dotted query key.
///
/// `departments.employees.active` with `departments(employees(..))` in the
/// select yields `(["departments", "employees"], "active")`. Keys that do
/// not start with an embed alias come back unchanged with an empty path.
pub fn split_embedded_key<'k>(key: &'k str, embedded: &EmbeddedAliases) -> (AliasPath, &'k str) {
    let mut path = AliasPath::new();
    let mut level = embedded;
    let mut rest = key;

    while let Some((prefix, suffix)) = rest.split_once('.')
        && let Some(nested) = level.get(prefix)
    {
        path.push(prefix.to_string());
        level = nested;
        rest = suffix;
    }

    (path, rest)
}
