//! `order`, `limit` and `offset`, top-level and per embed
//!
//! Only the first value of a repeated key is used.

use indexmap::IndexMap;
use thiserror::Error;

use super::{AliasPath, is_transform_key, split_embedded_key};
use crate::ast::{Direction, OrderEntry};
use crate::parse::EmbeddedAliases;
use crate::request::QueryParams;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("Invalid {key} value {value:?}: expected a non-negative integer")]
    InvalidInteger { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transform {
    pub order: Option<Vec<OrderEntry>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transforms {
    pub top: Transform,
    pub embedded: IndexMap<AliasPath, Transform>,
}

pub fn resolve_transforms(
    params: &QueryParams,
    embedded: &EmbeddedAliases,
) -> Result<Transforms, TransformError> {
    let mut transforms = Transforms::default();

    for (key, values) in params.iter() {
        let Some(value) = values.first() else {
            continue;
        };

        let (path, rest) = split_embedded_key(key, embedded);
        if !is_transform_key(rest) {
            continue;
        }
        let target = if path.is_empty() {
            &mut transforms.top
        } else {
            transforms.embedded.entry(path).or_default()
        };
        apply(target, key, rest, value)?;
    }

    Ok(transforms)
}

fn apply(target: &mut Transform, key: &str, name: &str, value: &str) -> Result<(), TransformError> {
    match name {
        "order" => target.order = parse_order(value),
        "limit" => target.limit = Some(parse_count(key, value)?),
        "offset" => target.offset = Some(parse_count(key, value)?),
        _ => {}
    }
    Ok(())
}

fn parse_count(key: &str, value: &str) -> Result<u64, TransformError> {
    value
        .trim()
        .parse()
        .map_err(|_| TransformError::InvalidInteger {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// `col[.asc|.desc][.nullsfirst|.nullslast],...`; empty items are skipped.
/// `None` when no item is left.
pub fn parse_order(raw: &str) -> Option<Vec<OrderEntry>> {
    let entries: Vec<OrderEntry> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let mut parts = item.split('.');
            let mut entry = OrderEntry::new(parts.next().unwrap_or_default());
            for part in parts {
                match part {
                    "asc" => entry.direction = Some(Direction::Asc),
                    "desc" => entry.direction = Some(Direction::Desc),
                    "nullsfirst" => entry.nulls_first = Some(true),
                    "nullslast" => entry.nulls_first = Some(false),
                    _ => {}
                }
            }
            entry
        })
        .collect();

    (!entries.is_empty()).then_some(entries)
}
