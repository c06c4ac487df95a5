//! Request -> AST orchestration
//!
//! Phase 1 parses the route, query string, headers, `select` and body; the
//! body read is the only await. Phase 2 runs the resolvers over those
//! results, and assembly splices embedded filters and transforms into the
//! select tree by alias path. Each phase is a [`Phases`] method.

use std::borrow::Cow;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::TranslateError;
use crate::ast::{Ast, AstType, SelectEntry, Where};
use crate::parse::{Body, Headers, Route, SelectResult};
use crate::phases::{DefaultPhases, Phases};
use crate::request::{IncomingRequest, parse_url};
use crate::resolve::{
    AliasPath, Filters, RpcParams, Transform, Transforms, UpsertParams, args_from_query,
    rpc_filter_params,
};

pub const DEFAULT_BASE_PATH: &str = "/rest/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// Path prefix stripped before routing
    pub base_path: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }
}

/// Translates requests into [`Ast`]s. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct Translator<P = DefaultPhases> {
    config: TranslatorConfig,
    phases: P,
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self {
            config,
            phases: DefaultPhases,
        }
    }

    /// Translator with a custom base path
    pub fn with_base_path(base_path: impl Into<String>) -> Self {
        Self::new(TranslatorConfig {
            base_path: base_path.into(),
        })
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(TranslatorConfig::default())
    }
}

impl<P> Translator<P> {
    /// Swap in custom phases, keeping the configuration
    pub fn with_phases<Q: Phases>(self, phases: Q) -> Translator<Q> {
        Translator {
            config: self.config,
            phases,
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn phases(&self) -> &P {
        &self.phases
    }
}

impl<P: Phases> Translator<P> {
    pub async fn translate<R: IncomingRequest>(&self, mut req: R) -> Result<Ast, TranslateError> {
        let phases = &self.phases;
        let method = req.method();
        let url = parse_url(req.url()).map_err(|e| TranslateError::InvalidUrl {
            url: req.url().to_string(),
            reason: e.to_string(),
        })?;

        // Phase 1
        let route = phases.parse_route(url.path(), &self.config.base_path);
        let params = phases.parse_query_params(&url);
        let headers = phases.parse_headers(&req, &method);
        let select = phases.parse_select(params.first("select"))?;
        let body = if method.is_read() {
            Body::Empty
        } else {
            let bytes = req.read_body().await?;
            let content_type = req.header("content-type").unwrap_or_default();
            phases.parse_body(&bytes, &content_type)?
        };
        trace!("route: {route:?}, headers: {headers:?}, select: {select:?}, body: {body:?}");

        // Phase 2
        let kind = phases.resolve_type(&route, &method, &headers);
        let filter_params = if args_from_query(&route, &method) {
            Cow::Owned(rpc_filter_params(&params))
        } else {
            Cow::Borrowed(&params)
        };
        let filters = phases.resolve_filters(&filter_params, &select.embedded)?;
        let transforms = phases.resolve_transforms(&params, &select.embedded)?;
        let meta = phases.resolve_meta(&headers, &params, &method);
        let rpc = phases.resolve_rpc_params(&route, &method, &params, &body);
        let upsert =
            (kind == AstType::Upsert).then(|| phases.resolve_upsert_params(&params, &headers));

        debug!(
            "translated {method} {} -> {}",
            url.path(),
            kind.as_str()
        );

        let mut ast = assemble(Parts {
            kind,
            route,
            headers,
            select,
            body,
            filters,
            transforms,
            rpc,
            upsert,
        });
        if !meta.is_empty() {
            ast.meta = Some(meta);
        }
        Ok(ast)
    }
}

/// Everything the resolvers produced for one request
struct Parts {
    kind: AstType,
    route: Route,
    headers: Headers,
    select: SelectResult,
    body: Body,
    filters: Filters,
    transforms: Transforms,
    rpc: RpcParams,
    upsert: Option<UpsertParams>,
}

fn assemble(parts: Parts) -> Ast {
    let Parts {
        kind,
        route,
        headers,
        select,
        body,
        filters,
        transforms,
        rpc,
        upsert,
    } = parts;

    let mut ast = Ast::new(kind, route.into_target());
    ast.schema = headers.schema;

    if !select.join.is_empty() {
        ast.join = Some(select.join);
    }
    if !select.select.is_empty() {
        let mut path = AliasPath::new();
        ast.select = Some(merge_embedded(
            select.select,
            &filters.embedded,
            &transforms.embedded,
            &mut path,
        ));
    }
    if !filters.filter.is_empty() {
        ast.filter = Some(filters.filter);
    }

    if kind.is_mutation()
        && let Body::Values(values) = body
    {
        ast.values = Some(values);
    }

    if kind == AstType::Rpc {
        ast.args = rpc.args;
        ast.http_method = rpc.http_method;
        ast.params_type = rpc.params_type;
        ast.input_type = rpc.input_type;
    }

    if let Some(upsert) = upsert {
        ast.on_conflict = upsert.on_conflict;
        ast.ignore_duplicates = Some(upsert.ignore_duplicates);
    }

    let Transform {
        order,
        limit,
        offset,
    } = transforms.top;
    ast.order = order;
    ast.limit = limit;
    ast.offset = offset;

    ast
}

/// Attach embedded filters and transforms to the embed at exactly their
/// alias path, at any depth
fn merge_embedded(
    entries: Vec<SelectEntry>,
    wheres: &IndexMap<AliasPath, Where>,
    transforms: &IndexMap<AliasPath, Transform>,
    path: &mut AliasPath,
) -> Vec<SelectEntry> {
    let mut merged = Vec::with_capacity(entries.len());

    for entry in entries {
        let (alias, mut def) = match entry {
            SelectEntry::Embed { alias, def } => (alias, def),
            other => {
                merged.push(other);
                continue;
            }
        };

        path.push(alias.clone());
        if let Some(filter) = wheres.get(path.as_slice()) {
            def.filter = Some(filter.clone());
        }
        if let Some(transform) = transforms.get(path.as_slice()) {
            if transform.order.is_some() {
                def.order = transform.order.clone();
            }
            if transform.limit.is_some() {
                def.limit = transform.limit;
            }
            if transform.offset.is_some() {
                def.offset = transform.offset;
            }
        }
        def.select = merge_embedded(std::mem::take(&mut def.select), wheres, transforms, path);
        path.pop();

        merged.push(SelectEntry::Embed { alias, def });
    }

    merged
}
