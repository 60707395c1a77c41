mod registry;

use crate::{
    backend::Postgres,
    compile::{FilterCompiler, OperatorRegistry},
    error::QueryError,
    eval::{Record, matches},
    model::{Cardinality, ColumnType, EntityModel, Schema},
    query::{ExpressionResolver, FilterExpression},
    sql::Condition,
    value::Value,
};

const ENTITY: &str = "product";

fn schema() -> Schema {
    Schema::new()
        .with_entity(
            EntityModel::new(ENTITY)
                .column("id", ColumnType::Int)
                .column("name", ColumnType::Text)
                .column("price", ColumnType::Int)
                .column("tags", ColumnType::array_of(ColumnType::Text))
                .column("meta", ColumnType::Json)
                .relation("owner", "user", Some(Cardinality::One))
                .relation("reviews", "review", Some(Cardinality::Many))
                .relation("warehouse", "warehouse", None),
        )
        .with_entity(
            EntityModel::new("user")
                .column("id", ColumnType::Int)
                .column("name", ColumnType::Text)
                .column("roles", ColumnType::array_of(ColumnType::Text))
                .relation("reviews", "review", Some(Cardinality::Many)),
        )
        .with_entity(
            EntityModel::new("review")
                .column("id", ColumnType::Int)
                .column("stars", ColumnType::Int)
                .relation("author", "user", Some(Cardinality::One)),
        )
}

fn compile_with(
    registry: &OperatorRegistry,
    filter: &FilterExpression,
) -> Result<Condition, QueryError> {
    let resolved = ExpressionResolver::new(&schema()).resolve_filter(ENTITY, filter)?;

    FilterCompiler::new(registry, &Postgres).compile(&resolved)
}

fn compile(filter: &FilterExpression) -> Result<Condition, QueryError> {
    compile_with(&OperatorRegistry::default(), filter)
}

fn sql(filter: &FilterExpression) -> String {
    compile(filter).expect("filter compiles").to_string()
}

fn row(entries: &[(&str, Value)]) -> Record {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

// Ids of the rows the compiled filter selects, in input order.
fn selected(rows: &[Record], condition: &Condition) -> Vec<i64> {
    rows.iter()
        .filter(|row| matches(*row, condition).expect("condition evaluates"))
        .filter_map(|row| row.get("id").and_then(Value::as_int))
        .collect()
}
