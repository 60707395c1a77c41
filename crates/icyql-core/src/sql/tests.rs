use crate::{
    model::{Cardinality, ColumnType},
    query::SortDirection,
    sql::{CompareOp, Condition, Expr, OrderTerm, Quantifier, render, render_ordering},
    value::Value,
};

fn price_gte(n: i64) -> Condition {
    Expr::column("price").compare(CompareOp::Gte, Expr::literal(n))
}

#[test]
fn display_inlines_literals() {
    let condition = Expr::column("name").is_distinct_from(Expr::literal("it's"));

    assert_eq!(condition.to_string(), "name IS DISTINCT FROM 'it''s'");
}

#[test]
fn render_collects_bind_parameters_in_order() {
    let condition = Condition::And(vec![
        price_gte(100),
        Expr::column("name").eq(Expr::literal("x")),
    ]);

    let sql = render(&condition);
    assert_eq!(sql.text, "price >= $1 AND name = $2");
    assert_eq!(sql.params, vec![Value::Int(100), Value::text("x")]);
}

#[test]
fn null_literals_are_never_bound() {
    let sql = render(&Expr::column("name").eq(Expr::literal(Value::Null)));

    assert_eq!(sql.text, "name = NULL");
    assert!(sql.params.is_empty());
}

#[test]
fn identifiers_are_quoted_only_when_needed() {
    assert_eq!(Expr::column("price").to_string(), "price");
    assert_eq!(Expr::column("createdAt").to_string(), "\"createdAt\"");
    assert_eq!(Expr::column("a\"b").to_string(), "\"a\"\"b\"");
}

#[test]
fn related_conditions_render_as_exists_subqueries() {
    let condition = price_gte(3).through("reviews", "review", Cardinality::Many);

    let sql = render(&condition);
    assert_eq!(
        sql.text,
        "EXISTS (SELECT 1 FROM review AS reviews WHERE price >= $1)"
    );
    assert_eq!(sql.params, vec![Value::Int(3)]);

    let nested = condition.through("owner", "user", Cardinality::One).not();
    assert_eq!(
        nested.to_string(),
        "NOT (EXISTS (SELECT 1 FROM user AS owner WHERE EXISTS (SELECT 1 FROM review AS reviews WHERE price >= 3)))"
    );
}

#[test]
fn empty_connectives_render_their_identity() {
    assert_eq!(Condition::And(vec![]).to_string(), "TRUE");
    assert_eq!(Condition::Or(vec![]).to_string(), "FALSE");
    assert_eq!(Condition::Const(false).to_string(), "FALSE");
}

#[test]
fn groups_keep_precedence_under_outer_connectives() {
    let inner = Condition::Or(vec![price_gte(1), price_gte(2)]).group();
    let outer = Condition::And(vec![inner, price_gte(3)]);

    assert_eq!(outer.to_string(), "(price >= 1 OR price >= 2) AND price >= 3");
}

#[test]
fn nested_connectives_without_group_are_still_parenthesised() {
    let outer = Condition::Or(vec![
        Condition::And(vec![price_gte(1), price_gte(2)]),
        price_gte(3),
    ]);

    assert_eq!(outer.to_string(), "(price >= 1 AND price >= 2) OR price >= 3");
}

#[test]
fn not_parenthesises_its_operand_once() {
    let grouped = Condition::And(vec![price_gte(1), price_gte(2)])
        .group()
        .not();
    assert_eq!(grouped.to_string(), "NOT (price >= 1 AND price >= 2)");

    let leaf = price_gte(1).not();
    assert_eq!(leaf.to_string(), "NOT (price >= 1)");
}

#[test]
fn quantified_and_array_expressions() {
    let array = Expr::Array(vec![Value::text("a"), Value::text("b")])
        .cast(ColumnType::array_of(ColumnType::Text));
    let overlaps = Expr::column("tags").compare(CompareOp::Overlaps, array);
    assert_eq!(
        overlaps.to_string(),
        "tags && CAST(ARRAY['a', 'b'] AS TEXT[])"
    );

    let any = Expr::literal("a").quantified(CompareOp::Eq, Quantifier::Any, Expr::column("tags"));
    let sql = render(&any);
    assert_eq!(sql.text, "$1 = ANY(tags)");
    assert_eq!(sql.params, vec![Value::text("a")]);
}

#[test]
fn empty_in_list_renders_constant() {
    let empty_in = Expr::column("price").in_list(vec![], false);
    let empty_not_in = Expr::column("price").in_list(vec![], true);

    assert_eq!(empty_in.to_string(), "FALSE");
    assert_eq!(empty_not_in.to_string(), "TRUE");

    let list = Expr::column("price").in_list(vec![Expr::literal(1), Expr::literal(2)], true);
    assert_eq!(list.to_string(), "price NOT IN (1, 2)");
}

#[test]
fn json_path_inline_and_bound() {
    let path = Expr::column("meta").json_path(vec!["color".into(), "name".into()]);

    assert_eq!(path.to_string(), "(meta #>> '{\"color\",\"name\"}')");

    let sql = render(&path.is_null());
    assert_eq!(sql.text, "(meta #>> $1) IS NULL");
    assert_eq!(sql.params, vec![Value::list(["color", "name"])]);
}

#[test]
fn array_length_and_functions() {
    let size = Expr::column("tags").array_length().eq(Expr::literal(2));
    assert_eq!(size.to_string(), "array_length(tags, 1) = 2");

    let lower = Expr::func("lower", vec![Expr::column("name")]);
    assert_eq!(lower.to_string(), "lower(name)");
}

#[test]
fn ordering_renders_directions_in_declaration_order() {
    let ordering = vec![
        OrderTerm {
            expr: Expr::column("price"),
            direction: SortDirection::Desc,
        },
        OrderTerm {
            expr: Expr::column("name"),
            direction: SortDirection::Asc,
        },
    ];

    assert_eq!(render_ordering(&ordering).text, "price DESC, name ASC");
}
