use pgrest_ast::parse::parse_select;
use pgrest_ast::render_select;
use pgrest_ast::values::{coerce_value, parse_in_list};
use proptest::prelude::*;
use serde_json::json;

fn arb_name() -> impl Strategy<Value = String> {
    // `count` is excluded: bare, it parses as the count() aggregate
    "[a-z][a-z0-9_]{0,7}".prop_filter("reserved name", |name| {
        !matches!(name.as_str(), "count" | "inner" | "left")
    })
}

fn arb_leaf() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_name(),
        (arb_name(), arb_name()).prop_map(|(alias, col)| format!("{alias}:{col}")),
        (arb_name(), arb_name()).prop_map(|(col, cast)| format!("{col}::{cast}")),
        (
            arb_name(),
            prop_oneof![Just("sum"), Just("avg"), Just("min"), Just("max"), Just("count")]
        )
            .prop_map(|(col, agg)| format!("{col}.{agg}()")),
        (arb_name(), arb_name(), arb_name()).prop_map(|(col, a, b)| format!("{col}->{a}->>{b}")),
        Just("count()".to_string()),
        Just("*".to_string()),
    ]
}

fn arb_select(depth: u32) -> BoxedStrategy<String> {
    let leaves = prop::collection::vec(arb_leaf(), 1..5).prop_map(|items| items.join(","));
    if depth == 0 {
        return leaves.boxed();
    }

    let embed = (
        arb_name(),
        prop_oneof![Just(""), Just("!inner"), Just("!fk_hint"), Just("!fk_hint!inner")],
        prop::bool::ANY,
        arb_select(depth - 1),
    )
        .prop_map(|(name, modifier, spread, inner)| {
            let prefix = if spread { "..." } else { "" };
            format!("{prefix}{name}{modifier}({inner})")
        });
    prop::collection::vec(prop_oneof![arb_leaf(), embed], 1..5)
        .prop_map(|items| items.join(","))
        .boxed()
}

proptest! {
    #[test]
    fn plain_columns_keep_source_order(names in prop::collection::vec(arb_name(), 1..12)) {
        let raw = names.join(",");
        let parsed = parse_select(Some(&raw)).expect("column list should parse");
        let rendered: Vec<String> = parsed.select.iter().map(|e| e.name().to_string()).collect();
        prop_assert_eq!(rendered, names);
    }

    #[test]
    fn render_reparse_roundtrip(raw in arb_select(2)) {
        let parsed = parse_select(Some(&raw)).expect("generated select should parse");
        let rendered = render_select(&parsed.select, &parsed.join);
        let reparsed = parse_select(Some(&rendered)).expect("rendered select should reparse");
        prop_assert_eq!(&parsed.select, &reparsed.select);
        prop_assert_eq!(&parsed.join, &reparsed.join);
    }

    #[test]
    fn integers_coerce_to_numbers(n in any::<i64>()) {
        prop_assert_eq!(coerce_value(&n.to_string()), json!(n));
    }

    #[test]
    fn in_lists_of_integers(items in prop::collection::vec(-1000i64..1000, 0..10)) {
        let raw = format!(
            "({})",
            items.iter().map(i64::to_string).collect::<Vec<_>>().join(",")
        );
        let expected: Vec<serde_json::Value> = items.iter().map(|n| json!(n)).collect();
        prop_assert_eq!(parse_in_list(&raw), expected);
    }
}
