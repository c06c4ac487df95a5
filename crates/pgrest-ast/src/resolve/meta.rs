//! `$meta`: Prefer tokens, HEAD, Accept and the `columns` parameter

use crate::ast::{Cardinality, ExplainOptions, Meta, TxMode};
use crate::parse::{Headers, PreferToken};
use crate::request::{Method, QueryParams};

const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";
const PLAN_MEDIA_PREFIX: &str = "application/vnd.pgrst.plan+";

pub fn resolve_meta(headers: &Headers, params: &QueryParams, method: &Method) -> Meta {
    let mut meta = Meta::default();

    for token in &headers.prefer {
        match token {
            PreferToken::Count(count) => meta.count = Some(*count),
            PreferToken::Missing(missing) => meta.missing = Some(*missing),
            PreferToken::Handling(handling) => meta.handling = Some(*handling),
            PreferToken::Tx(TxMode::Rollback) => meta.rollback = true,
            PreferToken::MaxAffected(n) => meta.max_affected = Some(*n),
            PreferToken::Timezone(tz) => meta.timezone = Some(tz.clone()),
            _ => {}
        }
    }

    meta.head = *method == Method::Head;

    if headers.accept.contains(OBJECT_MEDIA_TYPE) {
        meta.cardinality = Some(Cardinality::One);
    }
    if headers.accept.contains(PLAN_MEDIA_PREFIX) {
        meta.explain = Some(parse_explain_options(&headers.accept));
    }

    if let Some(raw) = params.first("columns") {
        meta.columns = Some(parse_columns(raw));
    }

    meta
}

/// Flags from `...; options=analyze|verbose; ...`
fn parse_explain_options(accept: &str) -> ExplainOptions {
    let mut options = ExplainOptions::default();
    let Some((_, tail)) = accept.split_once("options=") else {
        return options;
    };
    let flags = tail.split(';').next().unwrap_or_default();

    for flag in flags.split('|').map(str::trim) {
        match flag {
            "analyze" => options.analyze = true,
            "verbose" => options.verbose = true,
            "settings" => options.settings = true,
            "buffers" => options.buffers = true,
            "wal" => options.wal = true,
            _ => {}
        }
    }
    options
}

fn parse_columns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|col| {
            let col = col.trim();
            let col = col.strip_prefix('"').unwrap_or(col);
            col.strip_suffix('"').unwrap_or(col).to_string()
        })
        .collect()
}
