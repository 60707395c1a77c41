//! Module: backend
//! Responsibility: backend-specific coercion primitives used by the filter
//! and sort compilers.
//! Does not own: operator semantics or boolean composition.
//! Boundary: the compiler core only ever talks to `dyn Backend`.


use crate::{model::ColumnType, sql::Expr, value::Value};
use std::sync::Arc;

///
/// Backend
///
/// Capability interface for the parts of compilation that depend on how a
/// backend represents arrays and untyped containers.
///

pub trait Backend: Send + Sync {
    /// Stable backend name, as used in configuration.
    fn name(&self) -> &'static str;

    /// Array literal typed to match an array column's element type.
    fn array_literal(&self, items: &[Value], element_type: &ColumnType) -> Expr;

    /// Coerce a structured column's read expression to the runtime type of
    /// the literal it is compared against. Presence-only operators skip it:
    /// a cast would fail on stored values of another type.
    fn structured_column(&self, column: Expr, literal: &Value) -> Expr;

    /// Read expression for a sub-path of a structured column.
    fn structured_path(&self, column: Expr, path: &[String]) -> Expr;
}

/// Backend by configuration name.
#[must_use]
pub fn by_name(name: &str) -> Option<Arc<dyn Backend>> {
    match name.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Some(Arc::new(Postgres)),
        "generic" => Some(Arc::new(Generic)),
        _ => None,
    }
}

/// Type implied by a literal for structured-column comparisons.
///
/// Lists use their first element; null and map literals imply nothing.
#[must_use]
pub fn coercion_type(literal: &Value) -> Option<ColumnType> {
    match literal {
        Value::Bool(_) => Some(ColumnType::Bool),
        Value::Int(_) | Value::Float(_) => Some(ColumnType::Numeric),
        Value::Text(_) => Some(ColumnType::Text),
        Value::List(items) => items.first().and_then(coercion_type),
        Value::Null | Value::Map(_) => None,
    }
}

///
/// Postgres
///
/// Typed `ARRAY[..]` casts and `#>>` text extraction from `jsonb`.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Postgres;

impl Backend for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn array_literal(&self, items: &[Value], element_type: &ColumnType) -> Expr {
        Expr::Array(items.to_vec()).cast(ColumnType::array_of(element_type.clone()))
    }

    fn structured_column(&self, column: Expr, literal: &Value) -> Expr {
        let Some(ty) = coercion_type(literal) else {
            return column;
        };

        // Whole-column reads go through `#>> '{}'` so the cast sees text.
        match column {
            Expr::Column(_) => column.json_path(Vec::new()).cast(ty),
            other => other.cast(ty),
        }
    }

    fn structured_path(&self, column: Expr, path: &[String]) -> Expr {
        column.json_path(path.to_vec())
    }
}

///
/// Generic
///
/// Backends without native arrays or JSON operators: untyped array
/// literals, plain casts, `json_extract` for sub-paths.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Generic;

impl Backend for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn array_literal(&self, items: &[Value], _element_type: &ColumnType) -> Expr {
        Expr::Array(items.to_vec())
    }

    fn structured_column(&self, column: Expr, literal: &Value) -> Expr {
        match coercion_type(literal) {
            Some(ty) => column.cast(ty),
            None => column,
        }
    }

    fn structured_path(&self, column: Expr, path: &[String]) -> Expr {
        if path.is_empty() {
            return column;
        }

        Expr::func(
            "json_extract",
            vec![column, Expr::literal(format!("$.{}", path.join(".")))],
        )
    }
}
