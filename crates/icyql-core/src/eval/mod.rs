//! Module: eval
//! Responsibility: in-memory reference semantics for compiled conditions.
//! Does not own: compilation or any backend I/O.
//! Boundary: evaluates `sql::Condition` over `Row`s with SQL three-valued
//! logic (`None` is UNKNOWN). Used to check compiled output against data.

mod executor;
mod like;


use crate::{
    error::QueryError,
    model::{Cardinality, ColumnType},
    sql::{CompareOp, Condition, Expr, Quantifier},
    value::{Value, sql_cmp, sql_eq},
};
use std::{cmp::Ordering, collections::BTreeMap};

// re-exports
pub use executor::{MemoryExecutor, Record};
pub use like::like_match;

///
/// FieldPresence
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldPresence<'a> {
    Present(&'a Value),
    Missing,
}

///
/// Row
///
/// A missing field reads as NULL.
///

pub trait Row {
    fn field(&self, name: &str) -> FieldPresence<'_>;
}

impl Row for BTreeMap<String, Value> {
    fn field(&self, name: &str) -> FieldPresence<'_> {
        self.get(name)
            .map_or(FieldPresence::Missing, FieldPresence::Present)
    }
}

/// Whether `condition` holds for `row` (WHERE semantics: UNKNOWN rejects).
pub fn matches<R: Row + ?Sized>(row: &R, condition: &Condition) -> Result<bool, QueryError> {
    Ok(eval(row, condition)? == Some(true))
}

/// Three-valued evaluation of `condition` against `row`.
pub fn eval<R: Row + ?Sized>(row: &R, condition: &Condition) -> Result<Option<bool>, QueryError> {
    match condition {
        Condition::Const(value) => Ok(Some(*value)),
        Condition::Compare { lhs, op, rhs } => {
            compare(op, &eval_expr(row, lhs)?, &eval_expr(row, rhs)?)
        }
        Condition::Quantified {
            lhs,
            op,
            quantifier,
            array,
        } => {
            let left = eval_expr(row, lhs)?;
            match eval_expr(row, array)? {
                Value::Null => Ok(None),
                Value::List(items) => quantified(op, *quantifier, &left, &items),
                other => Err(QueryError::unsupported(format!(
                    "{} over a non-array {}",
                    quantifier_name(*quantifier),
                    other.type_label()
                ))),
            }
        }
        Condition::InList {
            expr,
            list,
            negated,
        } => {
            let left = eval_expr(row, expr)?;
            let items = list
                .iter()
                .map(|item| eval_expr(row, item))
                .collect::<Result<Vec<_>, _>>()?;
            let found = quantified(&CompareOp::Eq, Quantifier::Any, &left, &items)?;

            Ok(if *negated { found.map(|b| !b) } else { found })
        }
        Condition::IsNull { expr, negated } => {
            let is_null = eval_expr(row, expr)?.is_null();
            Ok(Some(is_null != *negated))
        }
        Condition::And(children) => {
            let mut result = Some(true);
            for child in children {
                match eval(row, child)? {
                    Some(false) => return Ok(Some(false)),
                    None => result = None,
                    Some(true) => {}
                }
            }

            Ok(result)
        }
        Condition::Or(children) => {
            let mut result = Some(false);
            for child in children {
                match eval(row, child)? {
                    Some(true) => return Ok(Some(true)),
                    None => result = None,
                    Some(false) => {}
                }
            }

            Ok(result)
        }
        Condition::Exists {
            relation,
            cardinality,
            condition,
            target: _,
        } => exists(row, relation, *cardinality, condition).map(Some),
        Condition::Not(inner) => Ok(eval(row, inner)?.map(|b| !b)),
        Condition::Group(inner) => eval(row, inner),
    }
}

// Related rows are embedded in the row: a list of records for `Many`, one
// record for `One`. A NULL or missing relation has no rows.
fn exists<R: Row + ?Sized>(
    row: &R,
    relation: &str,
    cardinality: Cardinality,
    condition: &Condition,
) -> Result<bool, QueryError> {
    let FieldPresence::Present(related) = row.field(relation) else {
        return Ok(false);
    };

    match (cardinality, related) {
        (_, Value::Null) => Ok(false),
        (Cardinality::One, Value::Map(record)) => matches(record, condition),
        (Cardinality::Many, Value::List(items)) => {
            for item in items {
                let Value::Map(record) = item else {
                    return Err(QueryError::unsupported(format!(
                        "relation '{relation}' holds a {} instead of a record",
                        item.type_label()
                    )));
                };
                if matches(record, condition)? {
                    return Ok(true);
                }
            }

            Ok(false)
        }
        (_, other) => Err(QueryError::unsupported(format!(
            "relation '{relation}' holds a {}",
            other.type_label()
        ))),
    }
}

/// Evaluate a value expression against `row`.
pub fn eval_expr<R: Row + ?Sized>(row: &R, expr: &Expr) -> Result<Value, QueryError> {
    match expr {
        Expr::Column(name) => Ok(match row.field(name) {
            FieldPresence::Present(value) => value.clone(),
            FieldPresence::Missing => Value::Null,
        }),
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Array(items) => Ok(Value::List(items.clone())),
        Expr::Cast { expr, ty } => cast(eval_expr(row, expr)?, ty),
        Expr::JsonPath { column, path } => Ok(json_text(&eval_expr(row, column)?, path)),
        Expr::ArrayLength(inner) => match eval_expr(row, inner)? {
            Value::List(items) if items.is_empty() => Ok(Value::Null),
            Value::List(items) => Ok(Value::Int(i64::try_from(items.len()).unwrap_or(i64::MAX))),
            Value::Null => Ok(Value::Null),
            other => Err(QueryError::unsupported(format!(
                "array_length over a non-array {}",
                other.type_label()
            ))),
        },
        Expr::Func { name, .. } => Err(QueryError::unsupported(format!(
            "function {name} has no in-memory evaluation"
        ))),
    }
}

// ---- comparisons ----------------------------------------------------------

fn compare(op: &CompareOp, left: &Value, right: &Value) -> Result<Option<bool>, QueryError> {
    match op {
        CompareOp::IsDistinctFrom => return Ok(Some(!not_distinct(left, right))),
        CompareOp::IsNotDistinctFrom => return Ok(Some(not_distinct(left, right))),
        _ => {}
    }
    if left.is_null() || right.is_null() {
        return Ok(None);
    }

    let result = match op {
        CompareOp::Eq => sql_eq(left, right),
        CompareOp::Ne => sql_eq(left, right).map(|b| !b),
        CompareOp::Lt => sql_cmp(left, right).map(Ordering::is_lt),
        CompareOp::Lte => sql_cmp(left, right).map(Ordering::is_le),
        CompareOp::Gt => sql_cmp(left, right).map(Ordering::is_gt),
        CompareOp::Gte => sql_cmp(left, right).map(Ordering::is_ge),
        CompareOp::Like => match (left, right) {
            (Value::Text(text), Value::Text(pattern)) => Some(like_match(text, pattern)),
            _ => return Err(unsupported_operands(op, left, right)),
        },
        CompareOp::Overlaps => {
            let (a, b) = lists(op, left, right)?;
            Some(a.iter().any(|x| contains_value(b, x)))
        }
        CompareOp::Contains => {
            let (a, b) = lists(op, left, right)?;
            Some(b.iter().all(|x| contains_value(a, x)))
        }
        CompareOp::ContainedBy => {
            let (a, b) = lists(op, left, right)?;
            Some(a.iter().all(|x| contains_value(b, x)))
        }
        CompareOp::IsDistinctFrom | CompareOp::IsNotDistinctFrom => None,
        CompareOp::Custom(symbol) => {
            return Err(QueryError::unsupported(format!(
                "operator {symbol} has no in-memory evaluation"
            )));
        }
    };

    Ok(result)
}

// `x op ANY(items)` / `x op ALL(items)` with SQL null rules.
fn quantified(
    op: &CompareOp,
    quantifier: Quantifier,
    left: &Value,
    items: &[Value],
) -> Result<Option<bool>, QueryError> {
    let (short_circuit, identity) = match quantifier {
        Quantifier::Any => (true, false),
        Quantifier::All => (false, true),
    };

    let mut result = Some(identity);
    for item in items {
        match compare(op, left, item)? {
            Some(b) if b == short_circuit => return Ok(Some(short_circuit)),
            None => result = None,
            Some(_) => {}
        }
    }

    Ok(result)
}

// NULL-safe equality: NULLs are equal to each other and to nothing else.
fn not_distinct(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| not_distinct(x, y))
        }
        _ => sql_eq(left, right) == Some(true),
    }
}

fn contains_value(items: &[Value], value: &Value) -> bool {
    items.iter().any(|item| sql_eq(item, value) == Some(true))
}

fn lists<'a>(
    op: &CompareOp,
    left: &'a Value,
    right: &'a Value,
) -> Result<(&'a [Value], &'a [Value]), QueryError> {
    match (left.as_list(), right.as_list()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported_operands(op, left, right)),
    }
}

fn unsupported_operands(op: &CompareOp, left: &Value, right: &Value) -> QueryError {
    QueryError::unsupported(format!(
        "operator {} between {} and {}",
        op.symbol(),
        left.type_label(),
        right.type_label()
    ))
}

const fn quantifier_name(quantifier: Quantifier) -> &'static str {
    match quantifier {
        Quantifier::Any => "ANY",
        Quantifier::All => "ALL",
    }
}

// ---- structured values and casts ----------------------------------------

// `value #>> path`: walk maps by key and lists by index, then read as text.
fn json_text(value: &Value, path: &[String]) -> Value {
    let mut current = value;
    for key in path {
        let next = match current {
            Value::Map(entries) => entries.get(key),
            Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Value::Null,
        }
    }

    match current {
        Value::Null => Value::Null,
        Value::Text(text) => Value::Text(text.clone()),
        Value::Bool(b) => Value::text(b.to_string()),
        Value::Int(n) => Value::text(n.to_string()),
        Value::Float(x) => Value::text(x.to_string()),
        other => Value::text(serde_json::Value::from(other.clone()).to_string()),
    }
}

fn cast(value: Value, ty: &ColumnType) -> Result<Value, QueryError> {
    let fail = |value: &Value| {
        QueryError::unsupported(format!("cannot cast {} to {}", value.type_label(), ty))
    };

    let out = match (ty, value) {
        (_, Value::Null) => Value::Null,
        (ColumnType::Array(element), Value::List(items)) => Value::List(
            items
                .into_iter()
                .map(|item| cast(item, element))
                .collect::<Result<_, _>>()?,
        ),
        (ColumnType::Numeric | ColumnType::Float, value @ (Value::Int(_) | Value::Float(_))) => {
            value
        }
        (ColumnType::Numeric | ColumnType::Float, Value::Text(text)) => parse_number(&text)
            .ok_or_else(|| fail(&Value::Text(text)))?,
        (ColumnType::Int | ColumnType::BigInt, Value::Int(n)) => Value::Int(n),
        (ColumnType::Int | ColumnType::BigInt, Value::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| fail(&Value::Text(text.clone())))?,
        (ColumnType::Bool, Value::Bool(b)) => Value::Bool(b),
        (ColumnType::Bool, Value::Text(text)) => {
            parse_bool(&text).map(Value::Bool).ok_or_else(|| fail(&Value::Text(text)))?
        }
        (ColumnType::Text, Value::Text(text)) => Value::Text(text),
        (ColumnType::Text, Value::Bool(b)) => Value::text(b.to_string()),
        (ColumnType::Text, Value::Int(n)) => Value::text(n.to_string()),
        (ColumnType::Text, Value::Float(x)) => Value::text(x.to_string()),
        (ColumnType::Json, value) => value,
        (ColumnType::Date | ColumnType::Timestamp | ColumnType::Uuid, Value::Text(text)) => {
            Value::Text(text)
        }
        (_, value) => return Err(fail(&value)),
    };

    Ok(out)
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();

    text.parse::<i64>()
        .map(Value::Int)
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(Value::Float))
}

// Postgres boolean input forms.
fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Some(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
