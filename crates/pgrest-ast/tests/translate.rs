//! Black-box tests for request translation
//!
//! Each test builds an in-memory request, translates it and compares the
//! AST's JSON form.

use pgrest_ast::{Request, SelectError, TranslateError, Translator};
use serde_json::{Value, json};

async fn translate(req: Request) -> Value {
    let ast = Translator::default().translate(req).await.unwrap();
    serde_json::to_value(&ast).unwrap()
}

async fn translate_err(req: Request) -> TranslateError {
    Translator::default().translate(req).await.unwrap_err()
}

// ============ Queries ============

#[tokio::test]
async fn get_with_embed_filter_order_limit() {
    let ast = translate(
        Request::get(
            "/rest/v1/products?select=id,name,categories!inner(id,name)&price=gt.100&order=price.asc.nullsfirst&limit=10",
        )
        .header("Accept-Profile", "public"),
    )
    .await;

    assert_eq!(
        ast,
        json!({
            "type": "query",
            "from": "products",
            "schema": "public",
            "join": {"categories": {"type": "inner"}},
            "select": ["id", "name", {"categories": {"select": ["id", "name"]}}],
            "where": {"price": {"$gt": 100}},
            "order": [{"column": "price", "direction": "asc", "nullsFirst": true}],
            "limit": 10,
        })
    );
}

#[tokio::test]
async fn absolute_urls_are_accepted() {
    let ast = translate(Request::get("https://db.example.com/rest/v1/items?id=eq.7")).await;
    assert_eq!(
        ast,
        json!({"type": "query", "from": "items", "where": {"id": {"$eq": 7}}})
    );
}

#[tokio::test]
async fn head_sets_head_flag() {
    let ast = translate(Request::head("/rest/v1/items").header("Prefer", "count=exact")).await;
    assert_eq!(
        ast,
        json!({
            "type": "query",
            "from": "items",
            "$meta": {"head": true, "count": "exact"},
        })
    );
}

#[tokio::test]
async fn repeated_filters_and_logical_groups() {
    let ast = translate(Request::get(
        "/rest/v1/products?price=gte.100&price=lte.500&or=(status.eq.active,and(stock.gt.0,stock.lt.5))&id=not.in.(1,2,3)",
    ))
    .await;

    assert_eq!(
        ast["where"],
        json!({
            "price": {"$gte": 100, "$lte": 500},
            "$or": [
                {"status": {"$eq": "active"}},
                {"$and": [{"stock": {"$gt": 0}}, {"stock": {"$lt": 5}}]},
            ],
            "id": {"$notIn": [1, 2, 3]},
        })
    );
}

#[tokio::test]
async fn transforms_use_first_value_while_filters_merge_all() {
    let ast = translate(Request::get(
        "/rest/v1/t?limit=5&limit=50&offset=10&a=gt.1&a=lt.9",
    ))
    .await;
    assert_eq!(ast["limit"], json!(5));
    assert_eq!(ast["offset"], json!(10));
    assert_eq!(ast["where"], json!({"a": {"$gt": 1, "$lt": 9}}));
}

#[tokio::test]
async fn embedded_filters_follow_nesting() {
    let ast = translate(Request::get(
        "/rest/v1/companies?select=name,departments(name,employees(name,projects(title)))\
         &departments.employees.active=is.true\
         &departments.employees.order=name.desc\
         &departments.limit=2\
         &departments.employees.projects.or=(status.eq.open,status.eq.review)",
    ))
    .await;

    assert_eq!(
        ast["select"],
        json!([
            "name",
            {"departments": {
                "select": [
                    "name",
                    {"employees": {
                        "select": [
                            "name",
                            {"projects": {
                                "select": ["title"],
                                "where": {"$or": [
                                    {"status": {"$eq": "open"}},
                                    {"status": {"$eq": "review"}},
                                ]},
                            }},
                        ],
                        "where": {"active": {"$is": true}},
                        "order": [{"column": "name", "direction": "desc"}],
                        "join": {"projects": {}},
                    }},
                ],
                "limit": 2,
                "join": {"employees": {}},
            }},
        ])
    );
    assert_eq!(ast["join"], json!({"departments": {}}));
    assert!(ast.get("where").is_none());
}

#[tokio::test]
async fn aliased_and_spread_embeds() {
    let ast = translate(Request::get(
        "/rest/v1/films?select=title,director:people!director_fk(name),...studios(name)&director.name=like.A*",
    ))
    .await;
    assert_eq!(
        ast["join"],
        json!({
            "director": {"from": "people", "hint": "director_fk"},
            "studios": {},
        })
    );
    assert_eq!(
        ast["select"],
        json!([
            "title",
            {"director": {"select": ["name"], "where": {"name": {"$like": "A*"}}}},
            {"studios": {"select": ["name"], "spread": true}},
        ])
    );
}

#[tokio::test]
async fn aggregates_and_json_paths() {
    let ast = translate(Request::get(
        "/rest/v1/orders?select=customer_id,total:amount.sum(),count(),city:address->>city",
    ))
    .await;
    assert_eq!(
        ast["select"],
        json!([
            "customer_id",
            {"total": {"column": "amount", "aggregate": "sum"}},
            {"count": {"aggregate": "count"}},
            {"city": {"column": "address", "path": "$.city"}},
        ])
    );
}

#[tokio::test]
async fn singular_object_and_explain() {
    let ast = translate(
        Request::get("/rest/v1/items?id=eq.1&columns=id,name")
            .header("Accept", "application/vnd.pgrst.object+json"),
    )
    .await;
    assert_eq!(
        ast["$meta"],
        json!({"cardinality": "one", "columns": ["id", "name"]})
    );

    let ast = translate(
        Request::get("/rest/v1/items")
            .header("Accept", "application/vnd.pgrst.plan+json; options=verbose|wal"),
    )
    .await;
    assert_eq!(
        ast["$meta"]["explain"],
        json!({"analyze": false, "verbose": true, "settings": false, "buffers": false, "wal": true})
    );
}

// ============ Mutations ============

#[tokio::test]
async fn upsert_with_conflict_target() {
    let ast = translate(
        Request::post("/rest/v1/inventory?on_conflict=id")
            .header("Prefer", "resolution=merge-duplicates")
            .json(&json!([{"id": 1, "qty": 5}])),
    )
    .await;

    assert_eq!(
        ast,
        json!({
            "type": "upsert",
            "from": "inventory",
            "values": [{"id": 1, "qty": 5}],
            "onConflict": "id",
            "ignoreDuplicates": false,
        })
    );
}

#[tokio::test]
async fn insert_with_schema_and_return() {
    let ast = translate(
        Request::post("/rest/v1/items?select=id")
            .header("Content-Profile", "sales")
            .header("Prefer", "return=representation, tx=rollback")
            .json(&json!({"name": "widget"})),
    )
    .await;

    assert_eq!(
        ast,
        json!({
            "type": "insert",
            "from": "items",
            "schema": "sales",
            "select": ["id"],
            "values": {"name": "widget"},
            "$meta": {"rollback": true},
        })
    );
}

#[tokio::test]
async fn update_and_delete() {
    let ast = translate(
        Request::patch("/rest/v1/items?id=eq.3")
            .header("Prefer", "max-affected=1")
            .json(&json!({"qty": 0})),
    )
    .await;
    assert_eq!(
        ast,
        json!({
            "type": "update",
            "from": "items",
            "where": {"id": {"$eq": 3}},
            "values": {"qty": 0},
            "$meta": {"maxAffected": 1},
        })
    );

    let ast = translate(Request::delete("/rest/v1/items?id=in.(1,2)")).await;
    assert_eq!(
        ast,
        json!({"type": "delete", "from": "items", "where": {"id": {"$in": [1, 2]}}})
    );
}

#[tokio::test]
async fn raw_body_is_not_a_value_for_tables() {
    let ast = translate(
        Request::post("/rest/v1/items")
            .header("Content-Type", "text/csv")
            .body("id,name\n1,a"),
    )
    .await;
    assert_eq!(ast, json!({"type": "insert", "from": "items"}));
}

// ============ RPC ============

#[tokio::test]
async fn rpc_get_splits_args_from_filters() {
    let ast = translate(Request::get(
        "/rest/v1/rpc/search?term=phone&status=eq.available&select=id",
    ))
    .await;

    assert_eq!(
        ast,
        json!({
            "type": "rpc",
            "function": "search",
            "select": ["id"],
            "where": {"status": {"$eq": "available"}},
            "args": {"term": "phone"},
            "httpMethod": "GET",
            "paramsType": "named",
            "inputType": "json",
        })
    );
}

#[tokio::test]
async fn rpc_post_bodies() {
    let ast = translate(
        Request::post("/rest/v1/rpc/add").json(&json!({"a": 1, "b": 2})),
    )
    .await;
    assert_eq!(
        ast,
        json!({
            "type": "rpc",
            "function": "add",
            "args": {"a": 1, "b": 2},
            "httpMethod": "POST",
            "paramsType": "named",
            "inputType": "json",
        })
    );

    let ast = translate(Request::post("/rest/v1/rpc/sum").json(&json!([1, 2, 3]))).await;
    assert_eq!(ast["paramsType"], json!("positional"));
    assert_eq!(ast["args"], json!([1, 2, 3]));

    let ast = translate(
        Request::post("/rest/v1/rpc/echo")
            .header("Content-Type", "text/plain")
            .body("hello"),
    )
    .await;
    assert_eq!(ast["args"], json!({"_raw": "hello"}));
    assert_eq!(ast["inputType"], json!("text"));
    assert!(ast.get("paramsType").is_none());
}

// ============ Configuration ============

#[tokio::test]
async fn custom_base_path() {
    let translator = Translator::with_base_path("/api/v2");
    let ast = translator
        .translate(Request::get("/api/v2/users?select=id"))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&ast).unwrap(),
        json!({"type": "query", "from": "users", "select": ["id"]})
    );

    let ast = translator
        .translate(Request::get("/api/v2/rpc/now"))
        .await
        .unwrap();
    assert_eq!(ast.target.function(), Some("now"));
}

// ============ Errors ============

#[tokio::test]
async fn malformed_select_is_a_positioned_error() {
    let err = translate_err(Request::get("/rest/v1/products?select=categories(id,name")).await;
    match err {
        TranslateError::Select(SelectError::ExpectedToken { expected, position }) => {
            assert_eq!(expected, ")");
            assert_eq!(position, 18);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unknown_operator_is_rejected() {
    let err = translate_err(Request::get("/rest/v1/items?price=between.1")).await;
    assert!(matches!(err, TranslateError::Filter(_)));
    assert_eq!(err.to_string(), "Filter error: Unknown operator: \"between\"");
}

#[tokio::test]
async fn invalid_json_body_is_rejected() {
    let err = translate_err(
        Request::post("/rest/v1/items")
            .header("Content-Type", "application/json")
            .body("{\"id\": 1,"),
    )
    .await;
    assert!(matches!(err, TranslateError::Body(_)));
}

#[tokio::test]
async fn bad_limit_is_rejected() {
    let err = translate_err(Request::get("/rest/v1/items?limit=all")).await;
    assert!(matches!(err, TranslateError::Transform(_)));
}
