use crate::{
    compile::{CompiledQuery, Executor, Projection, RelationProjection},
    error::QueryError,
    eval::{eval_expr, matches},
    model::Cardinality,
    query::SortDirection,
    value::{Value, sql_cmp},
};
use std::{cmp::Ordering, collections::BTreeMap};

/// Row shape used by `MemoryExecutor`: column name → value.
pub type Record = BTreeMap<String, Value>;

///
/// MemoryExecutor
///
/// Runs compiled queries over an in-memory row set: filter, stable sort,
/// then projection. Related rows are stored inline (a map for `one`, a list
/// of maps for `many`) and go through the relation's own compiled query.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryExecutor {
    rows: Vec<Record>,
}

impl MemoryExecutor {
    #[must_use]
    pub const fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }
}

impl Executor for MemoryExecutor {
    type Rows = Vec<Record>;
    type Error = QueryError;

    fn run(&self, query: &CompiledQuery) -> Result<Self::Rows, Self::Error> {
        run(&self.rows, query)
    }
}

fn run(rows: &[Record], query: &CompiledQuery) -> Result<Vec<Record>, QueryError> {
    let mut keyed = Vec::new();
    for row in rows {
        if !matches(row, &query.filter)? {
            continue;
        }
        let keys = query
            .ordering
            .iter()
            .map(|term| eval_expr(row, &term.expr))
            .collect::<Result<Vec<_>, _>>()?;

        keyed.push((keys, row));
    }

    keyed.sort_by(|(a, _), (b, _)| {
        query
            .ordering
            .iter()
            .zip(a.iter().zip(b))
            .map(|(term, (x, y))| match term.direction {
                SortDirection::Asc => order_values(x, y),
                SortDirection::Desc => order_values(x, y).reverse(),
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    keyed
        .into_iter()
        .map(|(_, row)| project(row, &query.projection))
        .collect()
}

// Ascending order with NULLs last; unordered pairs compare equal.
fn order_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => sql_cmp(left, right).unwrap_or(Ordering::Equal),
    }
}

fn project(row: &Record, projection: &Projection) -> Result<Record, QueryError> {
    let mut out = if projection.columns.is_empty() {
        row.clone()
    } else {
        let mut out = Record::new();
        for column in &projection.columns {
            let name = column
                .column_name()
                .map_or_else(|| column.to_string(), str::to_string);
            out.insert(name, eval_expr(row, column)?);
        }
        out
    };

    for relation in &projection.relations {
        let related = row.get(&relation.name).unwrap_or(&Value::Null);
        out.insert(relation.name.clone(), project_relation(related, relation)?);
    }

    Ok(out)
}

fn project_relation(related: &Value, relation: &RelationProjection) -> Result<Value, QueryError> {
    let rows = match related {
        Value::Null => Vec::new(),
        Value::Map(row) => vec![row.clone()],
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::Map(row) => Ok(row.clone()),
                other => Err(QueryError::unsupported(format!(
                    "relation '{}' holds a {} instead of a row",
                    relation.name,
                    other.type_label()
                ))),
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(QueryError::unsupported(format!(
                "relation '{}' holds a {} instead of a row",
                relation.name,
                other.type_label()
            )));
        }
    };

    let mut matched = run(&rows, &relation.query)?.into_iter().map(Value::Map);

    Ok(match relation.cardinality {
        Cardinality::One => matched.next().unwrap_or(Value::Null),
        Cardinality::Many => Value::List(matched.collect()),
    })
}
