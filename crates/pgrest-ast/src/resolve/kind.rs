//! Statement kind from route, method and `Prefer: resolution`

use crate::ast::AstType;
use crate::parse::{Headers, Route};
use crate::request::Method;

pub fn resolve_type(route: &Route, method: &Method, headers: &Headers) -> AstType {
    if route.is_rpc() {
        return AstType::Rpc;
    }

    match method {
        Method::Get | Method::Head => AstType::Query,
        // any resolution value, known or not, marks an upsert
        Method::Post if headers.has_prefer("resolution") => AstType::Upsert,
        Method::Post => AstType::Insert,
        Method::Patch => AstType::Update,
        Method::Delete => AstType::Delete,
        _ => AstType::Query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::headers::tokenize_prefer;

    fn headers(prefer: &str) -> Headers {
        Headers {
            schema: None,
            prefer: tokenize_prefer(prefer),
            accept: "application/json".into(),
        }
    }

    fn table() -> Route {
        Route::Relation {
            from: Some("t".into()),
        }
    }

    #[test]
    fn by_method() {
        let none = headers("");
        assert_eq!(resolve_type(&table(), &Method::Get, &none), AstType::Query);
        assert_eq!(resolve_type(&table(), &Method::Head, &none), AstType::Query);
        assert_eq!(resolve_type(&table(), &Method::Post, &none), AstType::Insert);
        assert_eq!(resolve_type(&table(), &Method::Patch, &none), AstType::Update);
        assert_eq!(resolve_type(&table(), &Method::Delete, &none), AstType::Delete);
        assert_eq!(resolve_type(&table(), &Method::Put, &none), AstType::Query);
        assert_eq!(resolve_type(&table(), &Method::Options, &none), AstType::Query);
    }

    #[test]
    fn resolution_marks_upsert() {
        assert_eq!(
            resolve_type(&table(), &Method::Post, &headers("resolution=merge-duplicates")),
            AstType::Upsert
        );
        assert_eq!(
            resolve_type(&table(), &Method::Post, &headers("resolution=whatever")),
            AstType::Upsert
        );
        // only POST upserts
        assert_eq!(
            resolve_type(&table(), &Method::Patch, &headers("resolution=merge-duplicates")),
            AstType::Update
        );
    }

    #[test]
    fn rpc_wins() {
        let route = Route::Rpc {
            function: "f".into(),
        };
        assert_eq!(resolve_type(&route, &Method::Get, &headers("")), AstType::Rpc);
        assert_eq!(
            resolve_type(&route, &Method::Post, &headers("resolution=merge-duplicates")),
            AstType::Rpc
        );
    }
}
