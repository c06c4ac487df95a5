//! Conflict handling for upserts

use crate::parse::{Headers, PreferToken, Resolution};
use crate::request::QueryParams;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertParams {
    pub on_conflict: Option<String>,
    pub ignore_duplicates: bool,
}

pub fn resolve_upsert_params(params: &QueryParams, headers: &Headers) -> UpsertParams {
    UpsertParams {
        on_conflict: params
            .first("on_conflict")
            .filter(|cols| !cols.is_empty())
            .map(str::to_string),
        ignore_duplicates: headers
            .prefer
            .iter()
            .any(|t| *t == PreferToken::Resolution(Resolution::IgnoreDuplicates)),
    }
}
