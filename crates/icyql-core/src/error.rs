use crate::model::ValueShape;
use std::fmt;
use thiserror::Error as ThisError;

///
/// FieldContext
///
/// Part of the query object in which a field reference appeared.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldContext {
    Select,
    Sort,
    Filter,
}

impl FieldContext {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Sort => "sort",
            Self::Filter => "filter",
        }
    }
}

impl fmt::Display for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ResolutionFailure
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolutionFailure {
    UnknownColumn,
    UnknownRelation,
    UnknownCardinality,
    SubPathNotStructured,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UnknownColumn => "unknown column",
            Self::UnknownRelation => "unknown relation",
            Self::UnknownCardinality => "relation cardinality is not known",
            Self::SubPathNotStructured => "sub-path on a non-structured column",
        };

        f.write_str(label)
    }
}

///
/// ErrorKind
///
/// Stable classification of a `QueryError` for callers that map errors
/// onto protocol responses.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    SchemaResolution,
    Operator,
    ValueShape,
    UnsupportedExpression,
    UnknownField,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SchemaResolution => "schema_resolution",
            Self::Operator => "operator",
            Self::ValueShape => "value_shape",
            Self::UnsupportedExpression => "unsupported_expression",
            Self::UnknownField => "unknown_field",
        }
    }
}

///
/// QueryError
///
/// Every failure of the resolve/compile pipeline. Compilation is
/// all-or-nothing: the first error aborts the whole query.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryError {
    #[error("invalid field '{field}' for '{entity}' specified in {context}: {reason}")]
    SchemaResolution {
        entity: String,
        field: String,
        context: FieldContext,
        reason: ResolutionFailure,
    },

    #[error("unsupported operator {operator} for {shape} column")]
    Operator { operator: String, shape: ValueShape },

    #[error("filter: {operator} argument for field '{field}' must be {expected}")]
    ValueShape {
        operator: String,
        field: String,
        expected: &'static str,
    },

    #[error("unsupported expression: {message}")]
    UnsupportedExpression { message: String },

    /// A field name the rewriter refuses to translate.
    #[error("unknown field '{field}'")]
    UnknownField { field: String },
}

impl QueryError {
    pub(crate) fn schema_resolution(
        entity: &str,
        field: &str,
        context: FieldContext,
        reason: ResolutionFailure,
    ) -> Self {
        Self::SchemaResolution {
            entity: entity.to_string(),
            field: field.to_string(),
            context,
            reason,
        }
    }

    #[must_use]
    pub fn operator(operator: &str, shape: ValueShape) -> Self {
        Self::Operator {
            operator: operator.to_string(),
            shape,
        }
    }

    #[must_use]
    pub fn value_shape(operator: &str, field: &str, expected: &'static str) -> Self {
        Self::ValueShape {
            operator: operator.to_string(),
            field: field.to_string(),
            expected,
        }
    }

    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedExpression {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unknown_field(field: &str) -> Self {
        Self::UnknownField {
            field: field.to_string(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SchemaResolution { .. } => ErrorKind::SchemaResolution,
            Self::Operator { .. } => ErrorKind::Operator,
            Self::ValueShape { .. } => ErrorKind::ValueShape,
            Self::UnsupportedExpression { .. } => ErrorKind::UnsupportedExpression,
            Self::UnknownField { .. } => ErrorKind::UnknownField,
        }
    }

    /// Context tag for schema resolution failures.
    #[must_use]
    pub const fn context(&self) -> Option<FieldContext> {
        match self {
            Self::SchemaResolution { context, .. } => Some(*context),
            _ => None,
        }
    }
}
