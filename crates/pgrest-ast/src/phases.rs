//! Overridable translation phases
//!
//! Every parser and resolver the [`Translator`](crate::Translator) runs goes
//! through [`Phases`]. The default methods call the functions in
//! [`parse`](crate::parse) and [`resolve`](crate::resolve); an implementation
//! overrides only the phases it wants to change.
//!
//! ```ignore
//! struct SoftDelete;
//!
//! impl Phases for SoftDelete {
//!     fn resolve_filters(&self, params: &QueryParams, embedded: &EmbeddedAliases)
//!         -> Result<Filters, FilterError>
//!     {
//!         let mut filters = resolve_filters(params, embedded)?;
//!         filters.filter.add_column_filter("deleted_at", parse_filter_value("is.null")?);
//!         Ok(filters)
//!     }
//! }
//!
//! let translator = Translator::default().with_phases(SoftDelete);
//! ```

use url::Url;

use crate::ast::{AstType, Meta};
use crate::parse::{
    Body, BodyError, EmbeddedAliases, Headers, Route, SelectError, SelectResult, classify_body,
    parse_headers, parse_route, parse_select,
};
use crate::request::{IncomingRequest, Method, QueryParams};
use crate::resolve::{
    FilterError, Filters, RpcParams, TransformError, Transforms, UpsertParams, resolve_filters,
    resolve_meta, resolve_rpc_params, resolve_transforms, resolve_type, resolve_upsert_params,
};

pub trait Phases {
    // ============ Phase 1 ============

    fn parse_route(&self, path: &str, base_path: &str) -> Route {
        parse_route(path, base_path)
    }

    fn parse_query_params(&self, url: &Url) -> QueryParams {
        QueryParams::from_url(url)
    }

    fn parse_headers<R: IncomingRequest>(&self, req: &R, method: &Method) -> Headers {
        parse_headers(req, method)
    }

    fn parse_select(&self, raw: Option<&str>) -> Result<SelectResult, SelectError> {
        parse_select(raw)
    }

    /// Classify a body that has already been read
    fn parse_body(&self, bytes: &[u8], content_type: &str) -> Result<Body, BodyError> {
        classify_body(bytes, content_type)
    }

    // ============ Phase 2 ============

    fn resolve_type(&self, route: &Route, method: &Method, headers: &Headers) -> AstType {
        resolve_type(route, method, headers)
    }

    fn resolve_filters(
        &self,
        params: &QueryParams,
        embedded: &EmbeddedAliases,
    ) -> Result<Filters, FilterError> {
        resolve_filters(params, embedded)
    }

    fn resolve_transforms(
        &self,
        params: &QueryParams,
        embedded: &EmbeddedAliases,
    ) -> Result<Transforms, TransformError> {
        resolve_transforms(params, embedded)
    }

    fn resolve_meta(&self, headers: &Headers, params: &QueryParams, method: &Method) -> Meta {
        resolve_meta(headers, params, method)
    }

    fn resolve_rpc_params(
        &self,
        route: &Route,
        method: &Method,
        params: &QueryParams,
        body: &Body,
    ) -> RpcParams {
        resolve_rpc_params(route, method, params, body)
    }

    fn resolve_upsert_params(&self, params: &QueryParams, headers: &Headers) -> UpsertParams {
        resolve_upsert_params(params, headers)
    }
}

/// The stock parsers and resolvers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultPhases;

impl Phases for DefaultPhases {}
