use crate::{
    error::{FieldContext, QueryError, ResolutionFailure},
    model::{Cardinality, ColumnType, EntityModel, Schema},
    query::{
        BooleanOp, ExpressionResolver, FieldCondition, FieldsMap, FilterExpression, KeepNames,
        QueryObject, Rename, Rewriter, SortDirection, SortingField,
        builder::{and, eq, gte, in_list, lt, nor, not, or},
    },
    value::Value,
};
use serde_json::{Value as Json, json};
use std::collections::BTreeMap;

fn schema() -> Schema {
    Schema::new()
        .with_entity(
            EntityModel::new("product")
                .column("id", ColumnType::Int)
                .column("name", ColumnType::Text)
                .column("price", ColumnType::Int)
                .column("tags", ColumnType::array_of(ColumnType::Text))
                .column("meta", ColumnType::Json)
                .relation("reviews", "review", Some(Cardinality::Many))
                .relation("warehouse", "warehouse", None),
        )
        .with_entity(EntityModel::new("review").column("stars", ColumnType::Int))
}

fn parse(json: Json) -> Result<QueryObject, QueryError> {
    QueryObject::from_json(&json)
}

fn parse_filter(json: Json) -> FilterExpression {
    FilterExpression::from_json(&json)
        .expect("filter parses")
        .expect("filter is not empty")
}

fn resolve_err(json: Json) -> QueryError {
    parse(json)
        .expect("query parses")
        .resolve(&schema(), "product")
        .expect_err("resolution fails")
}

// ---- parse ------------------------------------------------------------------

#[test]
fn null_and_empty_objects_are_the_empty_query() {
    assert_eq!(parse(Json::Null).unwrap(), QueryObject::new());
    assert_eq!(parse(json!({})).unwrap(), QueryObject::new());
    assert_eq!(
        parse(json!({ "select": null, "sort": null, "filter": null })).unwrap(),
        QueryObject::new()
    );
    assert_eq!(parse(json!({ "filter": {} })).unwrap().filter, None);
}

#[test]
fn select_fields_and_relations() {
    let query = parse(json!({
        "select": ["id", "name", { "reviews": { "select": ["stars"] } }]
    }))
    .unwrap();

    let expected = QueryObject::new()
        .select_field("id")
        .select_field("name")
        .select_relation("reviews", QueryObject::new().select_field("stars"));
    assert_eq!(query, expected);
    assert!(query.select.contains("reviews"));
    assert!(!query.select.contains("price"));
}

#[test]
fn sort_strings_and_objects() {
    let query = parse(json!({
        "sort": [
            "price-",
            "name+",
            "id",
            { "field": "meta.weight", "direction": "DESC" },
            { "field": "tags" }
        ]
    }))
    .unwrap();

    assert_eq!(
        query.sort,
        vec![
            SortingField::new("price", SortDirection::Desc),
            SortingField::new("name", SortDirection::Asc),
            SortingField::new("id", SortDirection::Asc),
            SortingField::new("meta.weight", SortDirection::Desc),
            SortingField::new("tags", SortDirection::Asc),
        ]
    );
    assert_eq!(query.sort[3].sub_path, vec!["weight".to_string()]);
}

#[test]
fn filter_shorthand_is_eq() {
    assert_eq!(parse_filter(json!({ "name": "shoe" })), eq("name", "shoe"));
    assert_eq!(
        parse_filter(json!({ "tags": ["a", "b"] })),
        eq("tags", vec!["a", "b"])
    );
    assert_eq!(parse_filter(json!({ "name": null })), eq("name", Value::Null));
}

#[test]
fn filter_operator_objects() {
    assert_eq!(
        parse_filter(json!({ "price": { "$gte": 10 } })),
        gte("price", 10)
    );

    // several operators on one field are an implicit AND
    let filter = parse_filter(json!({ "price": { "$gte": 10, "$in": [10, 20] } }));
    assert_eq!(
        filter,
        and(vec![gte("price", 10), in_list("price", vec![10, 20])])
    );
}

#[test]
fn multi_key_filters_are_an_implicit_and() {
    let filter = parse_filter(json!({ "price": 1, "name": "x" }));

    assert_eq!(filter, and(vec![eq("name", "x"), eq("price", 1)]));
}

#[test]
fn boolean_groups_nest() {
    let filter = parse_filter(json!({
        "$or": [
            { "price": { "$gte": 100 } },
            { "$and": [{ "name": "x" }, { "price": 1 }] }
        ]
    }));

    assert_eq!(
        filter,
        or(vec![
            gte("price", 100),
            and(vec![eq("name", "x"), eq("price", 1)]),
        ])
    );
    assert_eq!(filter.leaf_count(), 3);
    assert_eq!(filter.group_count(), 2);
}

#[test]
fn group_clause_entries_belong_to_the_group() {
    let or_group = parse_filter(json!({ "$or": [{ "price": 1, "name": "x" }] }));
    assert_eq!(or_group, or(vec![eq("name", "x"), eq("price", 1)]));

    let nor_group = parse_filter(json!({
        "$nor": [{ "price": { "$gte": 10, "$lt": 20 } }, { "name": "x" }]
    }));
    assert_eq!(
        nor_group,
        nor(vec![gte("price", 10), lt("price", 20), eq("name", "x")])
    );

    // a nested group is still a single clause
    let nested = parse_filter(json!({ "$or": [{ "$and": [{ "price": 1 }, { "name": "x" }] }] }));
    assert_eq!(nested, or(vec![and(vec![eq("price", 1), eq("name", "x")])]));
}

#[test]
fn not_accepts_an_object_or_an_array() {
    let object = parse_filter(json!({ "$not": { "price": 1, "name": "x" } }));
    let array = parse_filter(json!({ "$not": [{ "name": "x" }, { "price": 1 }] }));

    assert_eq!(object, not(vec![eq("name", "x"), eq("price", 1)]));
    assert_eq!(array, object);
}

#[test]
fn dotted_references_carry_a_sub_path() {
    let FilterExpression::Field(condition) = parse_filter(json!({ "meta.color.hex": "fff" }))
    else {
        panic!("expected a field condition");
    };

    assert_eq!(condition.field, "meta");
    assert_eq!(condition.sub_path, vec!["color".to_string(), "hex".to_string()]);
    assert_eq!(condition.reference(), "meta.color.hex");
}

#[test]
fn malformed_documents_are_rejected() {
    let cases = [
        json!([]),
        json!({ "limit": 10 }),
        json!({ "select": "id" }),
        json!({ "select": [1] }),
        json!({ "sort": "id" }),
        json!({ "sort": [""] }),
        json!({ "sort": [{ "direction": "asc" }] }),
        json!({ "sort": [{ "field": "id", "direction": "up" }] }),
        json!({ "filter": [] }),
        json!({ "filter": { "$xor": [] } }),
        json!({ "filter": { "$or": {} } }),
        json!({ "filter": { "$and": [1] } }),
        json!({ "filter": { "$not": 1 } }),
        json!({ "filter": { "price": { "$gt": 1, "plain": 2 } } }),
        json!({ "filter": { "": 1 } }),
    ];

    for case in cases {
        let err = parse(case.clone()).unwrap_err();
        assert!(
            matches!(err, QueryError::UnsupportedExpression { .. }),
            "{case}: {err:?}"
        );
    }
}

#[test]
fn boolean_op_symbols_parse() {
    for op in [BooleanOp::And, BooleanOp::Or, BooleanOp::Nor, BooleanOp::Not] {
        assert_eq!(op.symbol().parse::<BooleanOp>(), Ok(op));
    }
    assert!("$xor".parse::<BooleanOp>().is_err());
}

// ---- export -----------------------------------------------------------------

#[test]
fn export_uses_the_canonical_form() {
    let query = parse(json!({
        "select": ["id", { "reviews": {} }],
        "sort": ["price-"],
        "filter": { "name": "x" }
    }))
    .unwrap();

    assert_eq!(
        query.to_json(),
        json!({
            "select": ["id", { "reviews": {} }],
            "sort": [{ "field": "price", "direction": "desc" }],
            "filter": { "name": { "$eq": "x" } }
        })
    );
}

#[test]
fn exported_queries_parse_back_to_the_same_tree() {
    let query = parse(json!({
        "select": ["name"],
        "sort": [{ "field": "meta.weight", "direction": "desc" }],
        "filter": { "$nor": [{ "price": { "$lt": 5 } }, { "tags": { "$all": ["a"] } }] }
    }))
    .unwrap();

    assert_eq!(parse(query.to_json()).unwrap(), query);
}

#[test]
fn resolved_trees_export_like_their_source() {
    let query = parse(json!({ "select": ["id"], "filter": { "price": 3 } })).unwrap();
    let resolved = query.resolve(&schema(), "product").unwrap();

    assert_eq!(resolved.to_json(), query.to_json());
}

// ---- resolve ----------------------------------------------------------------

#[test]
fn resolution_attaches_descriptors() {
    let query = parse(json!({
        "select": ["id", { "reviews": { "select": ["stars"] } }],
        "sort": ["meta.weight-"],
        "filter": { "tags": "sale" }
    }))
    .unwrap();

    let resolved = query.resolve(&schema(), "product").unwrap();

    assert_eq!(resolved.select.fields[0].descriptor.column_type, ColumnType::Int);
    let relation = &resolved.select.relations[0];
    assert_eq!(relation.descriptor.cardinality(), Some(Cardinality::Many));
    assert_eq!(
        relation.query.select.fields[0].descriptor.column_type,
        ColumnType::Int
    );
    assert_eq!(resolved.sort[0].descriptor.column_type, ColumnType::Json);

    let Some(FilterExpression::Field(condition)) = &resolved.filter else {
        panic!("expected a field condition");
    };
    assert_eq!(
        condition.descriptor.element_type(),
        Some(&ColumnType::Text)
    );
}

#[test]
fn resolution_is_repeatable_and_pure() {
    let query = parse(json!({ "filter": { "price": 1 } })).unwrap();
    let before = query.clone();

    let first = query.resolve(&schema(), "product").unwrap();
    let second = ExpressionResolver::new(&schema())
        .resolve("product", &query)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(query, before);
}

#[test]
fn unknown_fields_report_their_context() {
    let cases = [
        (json!({ "select": ["doesNotExist"] }), FieldContext::Select),
        (json!({ "select": [{ "doesNotExist": {} }] }), FieldContext::Select),
        (json!({ "sort": ["doesNotExist-"] }), FieldContext::Sort),
        (json!({ "filter": { "doesNotExist": 1 } }), FieldContext::Filter),
        (
            json!({ "filter": { "$or": [{ "price": 1 }, { "doesNotExist": 1 }] } }),
            FieldContext::Filter,
        ),
    ];

    for (case, context) in cases {
        let err = resolve_err(case);
        assert_eq!(err.context(), Some(context));
        assert!(err.to_string().contains("doesNotExist"), "{err}");
    }
}

#[test]
fn select_error_message() {
    let err = resolve_err(json!({ "select": ["doesNotExist"] }));

    assert_eq!(
        err.to_string(),
        "invalid field 'doesNotExist' for 'product' specified in select: unknown column"
    );
}

#[test]
fn relation_columns_are_not_columns() {
    let err = resolve_err(json!({ "filter": { "reviews": 1 } }));

    assert!(matches!(
        err,
        QueryError::SchemaResolution {
            reason: ResolutionFailure::UnknownColumn,
            ..
        }
    ));
}

#[test]
fn sub_paths_require_a_structured_column() {
    let err = resolve_err(json!({ "filter": { "price.amount": 1 } }));

    assert_eq!(
        err,
        QueryError::SchemaResolution {
            entity: "product".into(),
            field: "price.amount".into(),
            context: FieldContext::Filter,
            reason: ResolutionFailure::SubPathNotStructured,
        }
    );

    let err = resolve_err(json!({ "sort": ["tags.first"] }));
    assert_eq!(err.context(), Some(FieldContext::Sort));
}

#[test]
fn relations_need_a_known_cardinality() {
    let err = resolve_err(json!({ "select": [{ "warehouse": {} }] }));

    assert_eq!(
        err,
        QueryError::SchemaResolution {
            entity: "product".into(),
            field: "warehouse".into(),
            context: FieldContext::Select,
            reason: ResolutionFailure::UnknownCardinality,
        }
    );
}

#[test]
fn field_condition_constructor_splits_references() {
    let condition = FieldCondition::new("meta.a", "$eq", 1);

    assert_eq!(condition.field, "meta");
    assert_eq!(condition.sub_path, vec!["a".to_string()]);
    assert_eq!(condition.value, Value::Int(1));
}

// ---- related references -----------------------------------------------------

#[test]
fn filter_references_walk_through_relations() {
    let query = parse(json!({ "filter": { "reviews.stars": { "$gte": 4 } } })).unwrap();
    let resolved = query.resolve(&schema(), "product").unwrap();

    let Some(FilterExpression::Field(condition)) = &resolved.filter else {
        panic!("expected a field condition");
    };
    assert_eq!(condition.reference(), "reviews.stars");
    assert_eq!(condition.relations.len(), 1);
    assert_eq!(condition.relations[0].name, "reviews");
    assert_eq!(condition.relations[0].cardinality(), Some(Cardinality::Many));
    assert_eq!(condition.descriptor.name, "stars");
    assert_eq!(condition.descriptor.column_type, ColumnType::Int);
    assert!(condition.column_path().is_empty());

    // the resolved tree still exports as written
    assert_eq!(resolved.to_json(), query.to_json());
}

#[test]
fn structured_columns_win_over_relation_walks() {
    let query = parse(json!({ "filter": { "meta.reviews": 1 } })).unwrap();
    let resolved = query.resolve(&schema(), "product").unwrap();

    let Some(FilterExpression::Field(condition)) = &resolved.filter else {
        panic!("expected a field condition");
    };
    assert!(condition.relations.is_empty());
    assert_eq!(condition.column_path().to_vec(), vec!["reviews".to_string()]);
}

#[test]
fn related_reference_errors_name_the_related_entity() {
    assert_eq!(
        resolve_err(json!({ "filter": { "reviews.doesNotExist": 1 } })),
        QueryError::SchemaResolution {
            entity: "review".into(),
            field: "doesNotExist".into(),
            context: FieldContext::Filter,
            reason: ResolutionFailure::UnknownColumn,
        }
    );
    assert_eq!(
        resolve_err(json!({ "filter": { "reviews.stars.value": 1 } })),
        QueryError::SchemaResolution {
            entity: "review".into(),
            field: "stars.value".into(),
            context: FieldContext::Filter,
            reason: ResolutionFailure::SubPathNotStructured,
        }
    );
    assert_eq!(
        resolve_err(json!({ "filter": { "warehouse.city": "x" } })),
        QueryError::SchemaResolution {
            entity: "product".into(),
            field: "warehouse".into(),
            context: FieldContext::Filter,
            reason: ResolutionFailure::UnknownCardinality,
        }
    );
}

#[test]
fn sorting_does_not_walk_relations() {
    let err = resolve_err(json!({ "sort": ["reviews.stars"] }));

    assert_eq!(
        err,
        QueryError::SchemaResolution {
            entity: "product".into(),
            field: "reviews".into(),
            context: FieldContext::Sort,
            reason: ResolutionFailure::UnknownColumn,
        }
    );
}

// ---- rewrite ----------------------------------------------------------------

fn product_rewriter() -> Rewriter {
    let reviews = Rewriter::new(FieldsMap::from_db_names([("stars", "starCount")]));

    Rewriter::new(FieldsMap::from_db_names([
        ("id", "id"),
        ("price", "cost"),
        ("meta", "details"),
        ("reviews", "feedback"),
    ]))
    .with_relation("reviews", reviews)
}

#[test]
fn rewrite_translates_every_reference_to_db_names() {
    let query = parse(json!({
        "select": ["id", "cost", { "feedback": { "select": ["starCount"] } }],
        "sort": ["cost-"],
        "filter": {
            "details.colourCode": "red",
            "feedback.starCount": { "$gte": 4 }
        }
    }))
    .unwrap();

    let rewritten = product_rewriter().rewrite(&query).unwrap();

    let expected = parse(json!({
        "select": ["id", "price", { "reviews": { "select": ["stars"] } }],
        "sort": ["price-"],
        "filter": {
            "meta.colourCode": "red",
            "reviews.stars": { "$gte": 4 }
        }
    }))
    .unwrap();
    assert_eq!(rewritten, expected);

    // the rewritten tree binds to the catalog
    assert!(rewritten.resolve(&schema(), "product").is_ok());
}

#[test]
fn rewrite_rejects_names_missing_from_the_map() {
    let rewriter = product_rewriter();

    assert_eq!(
        rewriter.rewrite(&parse(json!({ "select": ["price"] })).unwrap()),
        Err(QueryError::unknown_field("price"))
    );
    assert_eq!(
        rewriter.rewrite(&parse(json!({ "filter": { "feedback.stars": 1 } })).unwrap()),
        Err(QueryError::unknown_field("stars"))
    );

    let failing = Rewriter::new(FieldsMap::from_db_names([("id", "id")]).fail(["id"]));
    let err = failing
        .rewrite(&parse(json!({ "sort": ["id"] })).unwrap())
        .unwrap_err();
    assert_eq!(err.kind().as_str(), "unknown_field");
    assert_eq!(err.to_string(), "unknown field 'id'");
}

#[test]
fn skipped_names_drop_their_references() {
    let rewriter = Rewriter::new(
        FieldsMap::from_db_names([("id", "id"), ("price", "cost")]).skip(["legacy"]),
    );

    let query = parse(json!({
        "select": ["id", "legacy"],
        "filter": { "$or": [{ "legacy": 1 }, { "cost": 2 }] }
    }))
    .unwrap();
    let rewritten = rewriter.rewrite(&query).unwrap();

    assert_eq!(rewritten.select.fields.len(), 1);
    assert_eq!(rewritten.filter, Some(or(vec![eq("price", 2)])));

    let only_skipped = parse(json!({ "filter": { "legacy": 1 } })).unwrap();
    assert_eq!(rewriter.rewrite(&only_skipped).unwrap().filter, None);
}

#[test]
fn relations_without_a_rewriter_keep_their_query() {
    let rewriter = Rewriter::new(KeepNames::new(["id", "reviews"]));
    let query = parse(json!({
        "select": ["id", "price", { "reviews": { "select": ["stars"] } }],
        "filter": { "reviews.stars": 5 }
    }))
    .unwrap();

    let rewritten = rewriter.rewrite(&query).unwrap();

    let expected = parse(json!({
        "select": ["id", { "reviews": { "select": ["stars"] } }],
        "filter": { "reviews.stars": 5 }
    }))
    .unwrap();
    assert_eq!(rewritten, expected);
}

#[test]
fn deferred_relation_rewriters_allow_cycles() {
    fn user() -> Rewriter {
        Rewriter::new(Rename::new([("friends", "friend_list"), ("fullName", "name")]))
            .with_relation_fn("friend_list", user)
    }

    let query = parse(json!({
        "filter": { "friends.friends.fullName": "ada" }
    }))
    .unwrap();

    assert_eq!(
        user().rewrite(&query).unwrap().filter,
        Some(eq("friend_list.friend_list.name", "ada"))
    );
    assert!(user().relation("friend_list").is_some());
    assert!(user().relation("friends").is_none());
}

#[test]
fn field_maps_build_from_either_side() {
    let from_api = FieldsMap::from_api_fields(["ID", "Price"], str::to_lowercase);
    let from_db = FieldsMap::from_db_fields(["id", "price"], str::to_uppercase);

    let rewriter = Rewriter::new(from_api);
    assert_eq!(
        rewriter.api_to_db("Price", FieldContext::Filter),
        Ok(Some("price".to_string()))
    );
    assert_eq!(rewriter.db_to_api("id"), Ok(Some("ID".to_string())));

    let mut merged = from_db;
    merged.update(FieldsMap::from_db_names([("price", "cost")]));
    let rewriter = Rewriter::new(merged);
    assert_eq!(rewriter.db_to_api("price"), Ok(Some("cost".to_string())));
    assert_eq!(rewriter.db_to_api("id"), Ok(Some("ID".to_string())));
}

#[test]
fn export_record_restores_api_names() {
    let rewriter = Rewriter::new(
        FieldsMap::from_db_names([("id", "id"), ("price", "cost"), ("reviews", "feedback")])
            .skip(["internal"]),
    )
    .with_relation(
        "reviews",
        Rewriter::new(FieldsMap::from_db_names([("stars", "starCount")])),
    );

    let review = BTreeMap::from([("stars".to_string(), Value::Int(4))]);
    let record = BTreeMap::from([
        ("id".to_string(), Value::Int(1)),
        ("price".to_string(), Value::Int(10)),
        ("internal".to_string(), Value::Bool(true)),
        ("reviews".to_string(), Value::List(vec![Value::Map(review)])),
    ]);

    let exported = rewriter.export_record(&record).unwrap();

    let expected_review = BTreeMap::from([("starCount".to_string(), Value::Int(4))]);
    let expected = BTreeMap::from([
        ("id".to_string(), Value::Int(1)),
        ("cost".to_string(), Value::Int(10)),
        (
            "feedback".to_string(),
            Value::List(vec![Value::Map(expected_review)]),
        ),
    ]);
    assert_eq!(exported, expected);

    let unknown = BTreeMap::from([("colour".to_string(), Value::Null)]);
    assert_eq!(
        rewriter.export_record(&unknown),
        Err(QueryError::unknown_field("colour"))
    );
}
