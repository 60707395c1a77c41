use super::{compile_with, sql};
use crate::{
    compile::{ARRAY_ARGUMENT_OPERATORS, OperatorRegistry, OperatorTable, PRESENCE_OPERATORS},
    error::QueryError,
    model::ValueShape,
    query::builder::{cond, eq},
    sql::{CompareOp, Expr},
};

fn ilike(registry: &mut OperatorRegistry) {
    registry.register_scalar("$ilike", |col, val, _| {
        Ok(col.compare(CompareOp::Custom("ILIKE".into()), val))
    });
}

#[test]
fn default_tables_hold_the_builtin_operators() {
    let registry = OperatorRegistry::default();

    assert_eq!(
        registry.symbols(ValueShape::Scalar).collect::<Vec<_>>(),
        vec!["$eq", "$exists", "$gt", "$gte", "$in", "$lt", "$lte", "$ne", "$nin", "$prefix"]
    );
    assert_eq!(
        registry.symbols(ValueShape::Array).collect::<Vec<_>>(),
        vec!["$all", "$eq", "$exists", "$in", "$ne", "$nin", "$size"]
    );

    for symbol in ARRAY_ARGUMENT_OPERATORS {
        assert!(registry.requires_array_argument(symbol));
    }
    assert!(!registry.requires_array_argument("$eq"));

    for symbol in PRESENCE_OPERATORS {
        assert!(registry.is_presence_only(symbol));
    }
    assert!(!registry.is_presence_only("$eq"));
}

#[test]
fn structured_columns_use_the_scalar_table() {
    let registry = OperatorRegistry::default();

    assert_eq!(OperatorTable::for_shape(ValueShape::Structured), OperatorTable::Scalar);
    assert!(registry.contains(ValueShape::Structured, "$prefix"));
    assert!(!registry.contains(ValueShape::Structured, "$size"));
}

#[test]
fn empty_registry_rejects_everything() {
    let err = compile_with(&OperatorRegistry::empty(), &eq("price", 1)).unwrap_err();

    assert_eq!(err, QueryError::operator("$eq", ValueShape::Scalar));
}

#[test]
fn custom_operator_is_compiled_through_its_table() {
    let mut registry = OperatorRegistry::default();
    ilike(&mut registry);

    let condition = compile_with(&registry, &cond("name", "$ilike", "sh%")).unwrap();
    assert_eq!(condition.to_string(), "name ILIKE 'sh%'");

    // scalar registration does not leak into the array table
    let err = compile_with(&registry, &cond("tags", "$ilike", "a")).unwrap_err();
    assert_eq!(err, QueryError::operator("$ilike", ValueShape::Array));
}

#[test]
fn registration_replaces_an_existing_symbol() {
    let mut registry = OperatorRegistry::default();
    registry.register_scalar("$eq", |col, val, _| {
        Ok(col.compare(CompareOp::IsNotDistinctFrom, val))
    });

    let condition = compile_with(&registry, &eq("price", 1)).unwrap();
    assert_eq!(condition.to_string(), "price IS NOT DISTINCT FROM 1");
}

#[test]
fn clones_are_independent() {
    let base = OperatorRegistry::default();
    let mut extended = base.clone();
    ilike(&mut extended);

    assert!(extended.contains(ValueShape::Scalar, "$ilike"));
    assert!(!base.contains(ValueShape::Scalar, "$ilike"));
    assert!(compile_with(&base, &cond("name", "$ilike", "x")).is_err());

    // the default filter path is untouched
    assert_eq!(sql(&cond("name", "$eq", "x")), "name = 'x'");
}

#[test]
fn alias_shares_the_target_operator() {
    let mut registry = OperatorRegistry::default();
    registry
        .alias(ValueShape::Scalar, "$equals", "$eq")
        .unwrap()
        .alias(ValueShape::Array, "$any", "$in")
        .unwrap();

    let condition = compile_with(&registry, &cond("price", "$equals", 3)).unwrap();
    assert_eq!(condition.to_string(), "price = 3");

    let condition = compile_with(&registry, &cond("tags", "$any", vec!["a"])).unwrap();
    assert_eq!(condition.to_string(), "tags && CAST(ARRAY['a'] AS TEXT[])");
}

#[test]
fn alias_inherits_the_array_argument_rule() {
    let mut registry = OperatorRegistry::default();
    registry.alias(ValueShape::Array, "$any", "$in").unwrap();

    assert!(registry.requires_array_argument("$any"));
    assert!(matches!(
        compile_with(&registry, &cond("tags", "$any", "a")).unwrap_err(),
        QueryError::ValueShape { .. }
    ));
}

#[test]
fn alias_inherits_the_presence_rule() {
    let mut registry = OperatorRegistry::default();
    registry.alias(ValueShape::Scalar, "$present", "$exists").unwrap();

    assert!(registry.is_presence_only("$present"));
    assert_eq!(
        compile_with(&registry, &cond("meta.color", "$present", true))
            .unwrap()
            .to_string(),
        "(meta #>> '{\"color\"}') IS NOT NULL"
    );
}

#[test]
fn presence_only_applies_to_custom_operators() {
    let mut registry = OperatorRegistry::default();
    registry
        .register_scalar("$missing", |col, _, _| Ok(col.is_null()))
        .presence_only("$missing");

    assert_eq!(
        compile_with(&registry, &cond("meta.size", "$missing", 1))
            .unwrap()
            .to_string(),
        "(meta #>> '{\"size\"}') IS NULL"
    );
}

#[test]
fn alias_of_an_unknown_operator_fails() {
    let mut registry = OperatorRegistry::default();

    let err = registry
        .alias(ValueShape::Scalar, "$starts", "$size")
        .unwrap_err();
    assert_eq!(err, QueryError::operator("$size", ValueShape::Scalar));
    assert!(!registry.contains(ValueShape::Scalar, "$starts"));
}

#[test]
fn require_array_argument_applies_to_custom_operators() {
    let mut registry = OperatorRegistry::default();
    registry
        .register_scalar("$between", |col, val, _| {
            Ok(col.compare(CompareOp::Custom("BETWEEN".into()), val))
        })
        .require_array_argument("$between");

    let err = compile_with(&registry, &cond("price", "$between", 5)).unwrap_err();
    assert_eq!(err, QueryError::value_shape("$between", "price", "an array"));
}

#[test]
fn operator_receives_the_original_literal() {
    let mut registry = OperatorRegistry::default();
    registry.register_scalar("$len", |col, _, original| {
        let len = original.as_text().map_or(0, str::len);
        Ok(Expr::func("length", vec![col]).eq(Expr::literal(i64::try_from(len).unwrap_or(0))))
    });

    let condition = compile_with(&registry, &cond("name", "$len", "abcd")).unwrap();
    assert_eq!(condition.to_string(), "length(name) = 4");
}

#[test]
fn debug_lists_symbols() {
    let mut registry = OperatorRegistry::empty();
    ilike(&mut registry);
    registry.require_array_argument("$in");

    let debug = format!("{registry:?}");
    assert!(debug.contains("$ilike"));
    assert!(debug.contains("array_argument"));
    assert!(debug.contains("presence"));
}
