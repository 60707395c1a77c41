//! Module: model
//! Responsibility: read-only schema metadata consumed by resolution.
//! Does not own: query object structure or compilation.
//! Boundary: the `FieldCatalog` trait is the only schema surface the
//! resolver depends on.

mod catalog;
mod schema;


use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// re-exports
pub use catalog::FieldCatalog;
pub use schema::{EntityModel, RelationModel, Schema};

///
/// ValueShape
///
/// Classification of a column by how operators address it.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueShape {
    Scalar,
    Array,
    Structured,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Scalar => "scalar",
            Self::Array => "array",
            Self::Structured => "structured",
        };

        f.write_str(label)
    }
}

///
/// ColumnType
///
/// Backend type information for one column. Names follow Postgres.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    Bool,
    Int,
    BigInt,
    Float,
    Numeric,
    Text,
    Date,
    Timestamp,
    Uuid,
    Json,
    Array(Box<Self>),
}

impl ColumnType {
    #[must_use]
    pub fn array_of(element: Self) -> Self {
        Self::Array(Box::new(element))
    }

    #[must_use]
    pub const fn value_shape(&self) -> ValueShape {
        match self {
            Self::Array(_) => ValueShape::Array,
            Self::Json => ValueShape::Structured,
            _ => ValueShape::Scalar,
        }
    }

    #[must_use]
    pub fn element_type(&self) -> Option<&Self> {
        match self {
            Self::Array(inner) => Some(inner),
            _ => None,
        }
    }

    #[must_use]
    pub fn sql_name(&self) -> String {
        match self {
            Self::Bool => "BOOLEAN".to_string(),
            Self::Int => "INTEGER".to_string(),
            Self::BigInt => "BIGINT".to_string(),
            Self::Float => "DOUBLE PRECISION".to_string(),
            Self::Numeric => "NUMERIC".to_string(),
            Self::Text => "TEXT".to_string(),
            Self::Date => "DATE".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
            Self::Uuid => "UUID".to_string(),
            Self::Json => "JSONB".to_string(),
            Self::Array(inner) => format!("{}[]", inner.sql_name()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::BigInt => f.write_str("bigint"),
            Self::Float => f.write_str("float"),
            Self::Numeric => f.write_str("numeric"),
            Self::Text => f.write_str("text"),
            Self::Date => f.write_str("date"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Uuid => f.write_str("uuid"),
            Self::Json => f.write_str("json"),
            Self::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(element) = s.strip_suffix("[]") {
            return Ok(Self::array_of(element.parse()?));
        }

        let ty = match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Self::Bool,
            "int" | "integer" => Self::Int,
            "bigint" => Self::BigInt,
            "float" | "double" => Self::Float,
            "numeric" | "decimal" => Self::Numeric,
            "text" | "varchar" => Self::Text,
            "date" => Self::Date,
            "timestamp" => Self::Timestamp,
            "uuid" => Self::Uuid,
            "json" | "jsonb" => Self::Json,
            other => return Err(format!("unknown column type '{other}'")),
        };

        Ok(ty)
    }
}

impl TryFrom<String> for ColumnType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.to_string()
    }
}

///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

///
/// RelationInfo
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationInfo {
    pub target: String,
    pub cardinality: Option<Cardinality>,
}

///
/// FieldDescriptor
///
/// Catalog-supplied metadata for one column or relation. Descriptors are
/// copied onto resolved nodes and never written back to the catalog.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    pub relation: Option<RelationInfo>,
}

impl FieldDescriptor {
    #[must_use]
    pub fn column(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            relation: None,
        }
    }

    #[must_use]
    pub fn relation(
        name: impl Into<String>,
        target: impl Into<String>,
        cardinality: Option<Cardinality>,
    ) -> Self {
        Self {
            name: name.into(),
            // Relations are addressed as a whole row of the target entity.
            column_type: ColumnType::Json,
            relation: Some(RelationInfo {
                target: target.into(),
                cardinality,
            }),
        }
    }

    #[must_use]
    pub const fn value_shape(&self) -> ValueShape {
        self.column_type.value_shape()
    }

    #[must_use]
    pub fn element_type(&self) -> Option<&ColumnType> {
        self.column_type.element_type()
    }

    #[must_use]
    pub const fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    #[must_use]
    pub fn cardinality(&self) -> Option<Cardinality> {
        self.relation.as_ref().and_then(|relation| relation.cardinality)
    }
}
