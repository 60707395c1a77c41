//! Built-in operator tables.
//!
//! Every operator receives `(column, value, original)`: `value` may already be
//! a typed array or the column a coerced read expression; `original` is the
//! literal exactly as the caller supplied it.

use crate::{
    compile::OperatorRegistry,
    error::QueryError,
    sql::{CompareOp, Condition, Expr, Quantifier},
    value::Value,
};

/// Operators that only accept an array literal, whatever the column shape.
pub const ARRAY_ARGUMENT_OPERATORS: [&str; 3] = ["$all", "$in", "$nin"];

/// Operators that test presence only and never compare the stored value.
pub const PRESENCE_OPERATORS: [&str; 1] = ["$exists"];

pub(super) fn install(registry: &mut OperatorRegistry) {
    registry
        .register_scalar("$eq", eq)
        .register_scalar("$ne", ne)
        .register_scalar("$lt", |col, val, _| Ok(col.compare(CompareOp::Lt, val)))
        .register_scalar("$lte", |col, val, _| Ok(col.compare(CompareOp::Lte, val)))
        .register_scalar("$gt", |col, val, _| Ok(col.compare(CompareOp::Gt, val)))
        .register_scalar("$gte", |col, val, _| Ok(col.compare(CompareOp::Gte, val)))
        .register_scalar("$prefix", prefix)
        .register_scalar("$in", |col, _, original| in_list(col, original, false))
        .register_scalar("$nin", |col, _, original| in_list(col, original, true))
        .register_scalar("$exists", exists);

    registry
        .register_array("$eq", array_eq)
        .register_array("$ne", array_ne)
        .register_array("$in", |col, val, _| {
            Ok(col.compare(CompareOp::Overlaps, val))
        })
        .register_array("$nin", |col, val, _| {
            Ok(col.compare(CompareOp::Overlaps, val).not())
        })
        .register_array("$exists", exists)
        .register_array("$all", |col, val, _| {
            Ok(col.compare(CompareOp::Contains, val))
        })
        .register_array("$size", size);

    for symbol in ARRAY_ARGUMENT_OPERATORS {
        registry.require_array_argument(symbol);
    }
    for symbol in PRESENCE_OPERATORS {
        registry.presence_only(symbol);
    }
}

// ---- scalar -------------------------------------------------------------

fn eq(col: Expr, val: Expr, original: &Value) -> Result<Condition, QueryError> {
    if original.is_null() {
        return Ok(col.is_null());
    }

    Ok(col.eq(val))
}

// Distinct-from keeps NULL rows: `NULL != 'x'` would drop them.
fn ne(col: Expr, val: Expr, _: &Value) -> Result<Condition, QueryError> {
    Ok(col.is_distinct_from(val))
}

fn prefix(col: Expr, _: Expr, original: &Value) -> Result<Condition, QueryError> {
    let Some(text) = original.as_text() else {
        return Err(QueryError::unsupported(format!(
            "$prefix argument must be text, got {}",
            original.type_label()
        )));
    };

    let pattern = format!("{}%", escape_like(text));

    Ok(col.compare(CompareOp::Like, Expr::literal(pattern)))
}

fn in_list(col: Expr, original: &Value, negated: bool) -> Result<Condition, QueryError> {
    let items = original.as_list().unwrap_or_default();
    if items.is_empty() {
        return Ok(Condition::Const(negated));
    }

    let list = items.iter().cloned().map(Expr::Literal).collect();

    Ok(col.in_list(list, negated))
}

fn exists(col: Expr, _: Expr, original: &Value) -> Result<Condition, QueryError> {
    Ok(if original.is_truthy() {
        col.is_not_null()
    } else {
        col.is_null()
    })
}

// ---- array --------------------------------------------------------------

// Array literal: whole-array equality. Scalar literal: any element equals.
fn array_eq(col: Expr, val: Expr, original: &Value) -> Result<Condition, QueryError> {
    if original.is_array() {
        return Ok(col.eq(val));
    }

    Ok(val.quantified(CompareOp::Eq, Quantifier::Any, col))
}

// Array literal: whole-array inequality. Scalar literal: every element differs.
fn array_ne(col: Expr, val: Expr, original: &Value) -> Result<Condition, QueryError> {
    if original.is_array() {
        return Ok(col.ne(val));
    }

    Ok(val.quantified(CompareOp::Ne, Quantifier::All, col))
}

// `array_length` is NULL for both a NULL and an empty array, so size 0 is
// an IS NULL test.
fn size(col: Expr, _: Expr, original: &Value) -> Result<Condition, QueryError> {
    let Some(size) = original.as_int() else {
        let field = col
            .column_name()
            .map_or_else(|| col.to_string(), str::to_string);

        return Err(QueryError::value_shape("$size", &field, "an integer"));
    };

    let length = col.array_length();
    if size == 0 {
        return Ok(length.is_null());
    }

    Ok(length.eq(Expr::literal(size)))
}

/// Escape LIKE metacharacters so the text matches literally.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }

    out
}
