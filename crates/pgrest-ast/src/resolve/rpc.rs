//! RPC argument resolution
//!
//! POST calls take their arguments from the body. Every other method takes
//! them from the query string, where a parameter is an argument unless its
//! first value looks like a filter (`op.value`).

use serde_json::{Map, Value};

use crate::ast::{InputType, ParamsType, RpcHttpMethod};
use crate::operators::{is_filter, is_reserved};
use crate::parse::{Body, Route};
use crate::request::{Method, QueryParams};
use crate::values::coerce_value;

/// Key under which a non-JSON body is passed
pub const RAW_ARG_KEY: &str = "_raw";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RpcParams {
    pub args: Option<Value>,
    pub http_method: Option<RpcHttpMethod>,
    pub params_type: Option<ParamsType>,
    pub input_type: Option<InputType>,
}

/// True when query parameters carry the function's arguments
pub fn args_from_query(route: &Route, method: &Method) -> bool {
    route.is_rpc() && *method != Method::Post
}

pub fn resolve_rpc_params(
    route: &Route,
    method: &Method,
    params: &QueryParams,
    body: &Body,
) -> RpcParams {
    if !route.is_rpc() {
        return RpcParams::default();
    }

    if *method == Method::Post {
        let mut rpc = RpcParams {
            http_method: Some(RpcHttpMethod::Post),
            ..Default::default()
        };
        match body {
            Body::Values(values) => {
                rpc.params_type = Some(if values.is_array() {
                    ParamsType::Positional
                } else {
                    ParamsType::Named
                });
                rpc.input_type = Some(InputType::Json);
                rpc.args = Some(values.clone());
            }
            Body::Raw(text) => {
                let mut args = Map::new();
                args.insert(RAW_ARG_KEY.to_string(), Value::String(text.clone()));
                rpc.args = Some(Value::Object(args));
                rpc.input_type = Some(InputType::Text);
            }
            Body::Empty => {}
        }
        return rpc;
    }

    let mut args = Map::new();
    for (key, values) in params.iter() {
        if is_reserved(key) {
            continue;
        }
        if let Some(first) = values.first()
            && !is_filter(first)
        {
            args.insert(key.to_string(), coerce_value(first));
        }
    }

    RpcParams {
        args: (!args.is_empty()).then_some(Value::Object(args)),
        http_method: Some(RpcHttpMethod::Get),
        params_type: Some(ParamsType::Named),
        input_type: Some(InputType::Json),
    }
}

/// The query parameters left for filter resolution on a query-string RPC
/// call: reserved keys unchanged, other keys reduced to their filter-like
/// values.
pub fn rpc_filter_params(params: &QueryParams) -> QueryParams {
    let mut filters = QueryParams::new();
    for (key, values) in params.iter() {
        for value in values {
            if is_reserved(key) || is_filter(value) {
                filters.push(key, value.as_str());
            }
        }
    }
    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::parse_url;
    use serde_json::json;

    fn rpc() -> Route {
        Route::Rpc {
            function: "search".into(),
        }
    }

    fn params(query: &str) -> QueryParams {
        QueryParams::from_url(&parse_url(&format!("/rpc/search?{query}")).unwrap())
    }

    #[test]
    fn non_rpc_routes_resolve_to_nothing() {
        let route = Route::Relation {
            from: Some("t".into()),
        };
        assert_eq!(
            resolve_rpc_params(&route, &Method::Get, &params("a=1"), &Body::Empty),
            RpcParams::default()
        );
    }

    #[test]
    fn post_bodies() {
        let positional =
            resolve_rpc_params(&rpc(), &Method::Post, &QueryParams::new(), &Body::Values(json!([1, 2])));
        assert_eq!(positional.params_type, Some(ParamsType::Positional));
        assert_eq!(positional.input_type, Some(InputType::Json));
        assert_eq!(positional.args, Some(json!([1, 2])));

        let named = resolve_rpc_params(
            &rpc(),
            &Method::Post,
            &QueryParams::new(),
            &Body::Values(json!({"q": "x"})),
        );
        assert_eq!(named.params_type, Some(ParamsType::Named));
        assert_eq!(named.http_method, Some(RpcHttpMethod::Post));

        let raw = resolve_rpc_params(&rpc(), &Method::Post, &QueryParams::new(), &Body::Raw("hi".into()));
        assert_eq!(raw.args, Some(json!({"_raw": "hi"})));
        assert_eq!(raw.input_type, Some(InputType::Text));
        assert_eq!(raw.params_type, None);
    }

    #[test]
    fn query_args_exclude_filters_and_reserved_keys() {
        let rpc_params = resolve_rpc_params(
            &rpc(),
            &Method::Get,
            &params("term=phone&max=10&status=eq.available&select=id&limit=5"),
            &Body::Empty,
        );
        assert_eq!(rpc_params.args, Some(json!({"term": "phone", "max": 10})));
        assert_eq!(rpc_params.http_method, Some(RpcHttpMethod::Get));
        assert_eq!(rpc_params.params_type, Some(ParamsType::Named));
        assert_eq!(rpc_params.input_type, Some(InputType::Json));
    }

    #[test]
    fn no_query_args_means_no_args_key() {
        let rpc_params = resolve_rpc_params(&rpc(), &Method::Get, &params("a=eq.1"), &Body::Empty);
        assert_eq!(rpc_params.args, None);
    }

    #[test]
    fn filter_partition_keeps_reserved_and_filter_values() {
        let filters = rpc_filter_params(&params("term=phone&status=eq.available&select=id&x=gt.1&x=raw"));
        assert_eq!(filters.get("term"), None);
        assert_eq!(filters.first("status"), Some("eq.available"));
        assert_eq!(filters.first("select"), Some("id"));
        assert_eq!(filters.get("x").map(<[String]>::len), Some(1));
    }
}
