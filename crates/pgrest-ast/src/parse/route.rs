//! Resource routing from the URL path

use percent_encoding::percent_decode_str;

use crate::ast::Target;

/// Where a request is routed: a relation or `rpc/<function>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Relation { from: Option<String> },
    Rpc { function: String },
}

impl Route {
    pub fn is_rpc(&self) -> bool {
        matches!(self, Route::Rpc { .. })
    }

    pub fn into_target(self) -> Target {
        match self {
            Route::Relation { from } => Target::Relation { from },
            Route::Rpc { function } => Target::Function { function },
        }
    }
}

/// Route a raw (percent-encoded) URL path.
///
/// The base path is stripped when the path starts with it; an empty
/// remainder routes to no relation.
pub fn parse_route(raw_path: &str, base_path: &str) -> Route {
    let decoded = percent_decode_str(raw_path).decode_utf8_lossy();
    let path = decoded.strip_prefix(base_path).unwrap_or(decoded.as_ref());
    let mut segments = path.trim_matches('/').split('/');

    let first = segments.next().unwrap_or_default();
    if first == "rpc"
        && let Some(function) = segments.next().filter(|s| !s.is_empty())
    {
        return Route::Rpc {
            function: function.to_string(),
        };
    }

    Route::Relation {
        from: (!first.is_empty()).then(|| first.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "/rest/v1";

    fn relation(name: &str) -> Route {
        Route::Relation {
            from: Some(name.into()),
        }
    }

    #[test]
    fn relation_routes() {
        assert_eq!(parse_route("/rest/v1/products", BASE), relation("products"));
        assert_eq!(parse_route("/rest/v1/products/", BASE), relation("products"));
        assert_eq!(parse_route("/products", BASE), relation("products"));
        assert_eq!(parse_route("/rest/v1/", BASE), Route::Relation { from: None });
        assert_eq!(parse_route("", BASE), Route::Relation { from: None });
    }

    #[test]
    fn rpc_routes() {
        let route = parse_route("/rest/v1/rpc/search", BASE);
        assert!(route.is_rpc());
        assert_eq!(
            route,
            Route::Rpc {
                function: "search".into()
            }
        );
        // bare `rpc` is a relation
        assert_eq!(parse_route("/rest/v1/rpc", BASE), relation("rpc"));
    }

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(
            parse_route("/rest/v1/order%20items", BASE),
            relation("order items")
        );
    }

    #[test]
    fn custom_base_path() {
        assert_eq!(parse_route("/api/v2/users", "/api/v2"), relation("users"));
        assert_eq!(parse_route("/rest/v1/users", "/api/v2"), relation("rest"));
    }
}
