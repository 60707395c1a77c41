use crate::{
    compile::builtin,
    error::QueryError,
    model::ValueShape,
    sql::{Condition, Expr},
    value::Value,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};
use tracing::trace;

/// Predicate builder for one operator symbol.
///
/// Receives the (possibly coerced) column expression, the (possibly
/// coerced) value expression and the caller's original literal.
pub type OperatorFn =
    Arc<dyn Fn(Expr, Expr, &Value) -> Result<Condition, QueryError> + Send + Sync>;

///
/// OperatorTable
///
/// Which table a column's value shape selects. Structured columns are
/// compared through their coerced scalar read expression.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OperatorTable {
    Scalar,
    Array,
}

impl OperatorTable {
    #[must_use]
    pub const fn for_shape(shape: ValueShape) -> Self {
        match shape {
            ValueShape::Array => Self::Array,
            ValueShape::Scalar | ValueShape::Structured => Self::Scalar,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Array => "array",
        }
    }
}

///
/// OperatorRegistry
///
/// Operator symbol tables partitioned by column shape, plus the sets of
/// symbols that only accept an array literal and of symbols that only test
/// presence (their column is read without a type cast).
///
/// A registry is a plain value: `default()` carries the built-in operators,
/// clones are independent, and a compiler only ever reads the registry it
/// was built with.
///

#[derive(Clone)]
pub struct OperatorRegistry {
    scalar: BTreeMap<String, OperatorFn>,
    array: BTreeMap<String, OperatorFn>,
    array_argument: BTreeSet<String>,
    presence: BTreeSet<String>,
}

impl OperatorRegistry {
    /// Registry with no operators at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            scalar: BTreeMap::new(),
            array: BTreeMap::new(),
            array_argument: BTreeSet::new(),
            presence: BTreeSet::new(),
        }
    }

    /// Register (or replace) an operator for columns of `shape`.
    pub fn register<F>(&mut self, shape: ValueShape, symbol: impl Into<String>, op: F) -> &mut Self
    where
        F: Fn(Expr, Expr, &Value) -> Result<Condition, QueryError> + Send + Sync + 'static,
    {
        let table = OperatorTable::for_shape(shape);
        let symbol = symbol.into();
        trace!(target: "icyql", table = table.as_str(), %symbol, "operator registered");

        self.table_mut(table).insert(symbol, Arc::new(op));
        self
    }

    pub fn register_scalar<F>(&mut self, symbol: impl Into<String>, op: F) -> &mut Self
    where
        F: Fn(Expr, Expr, &Value) -> Result<Condition, QueryError> + Send + Sync + 'static,
    {
        self.register(ValueShape::Scalar, symbol, op)
    }

    pub fn register_array<F>(&mut self, symbol: impl Into<String>, op: F) -> &mut Self
    where
        F: Fn(Expr, Expr, &Value) -> Result<Condition, QueryError> + Send + Sync + 'static,
    {
        self.register(ValueShape::Array, symbol, op)
    }

    /// Mark `symbol` as accepting array literals only, in every table.
    pub fn require_array_argument(&mut self, symbol: impl Into<String>) -> &mut Self {
        self.array_argument.insert(symbol.into());
        self
    }

    /// Mark `symbol` as a presence test, in every table.
    pub fn presence_only(&mut self, symbol: impl Into<String>) -> &mut Self {
        self.presence.insert(symbol.into());
        self
    }

    /// Make `alias` behave exactly like the already registered `target`.
    pub fn alias(
        &mut self,
        shape: ValueShape,
        alias: impl Into<String>,
        target: &str,
    ) -> Result<&mut Self, QueryError> {
        let table = OperatorTable::for_shape(shape);
        let op = self
            .table(table)
            .get(target)
            .cloned()
            .ok_or_else(|| QueryError::operator(target, shape))?;

        let alias = alias.into();
        trace!(target: "icyql", table = table.as_str(), %alias, %target, "operator alias registered");

        if self.array_argument.contains(target) {
            self.array_argument.insert(alias.clone());
        }
        if self.presence.contains(target) {
            self.presence.insert(alias.clone());
        }
        self.table_mut(table).insert(alias, op);

        Ok(self)
    }

    #[must_use]
    pub fn lookup(&self, shape: ValueShape, symbol: &str) -> Option<&OperatorFn> {
        self.table(OperatorTable::for_shape(shape)).get(symbol)
    }

    #[must_use]
    pub fn contains(&self, shape: ValueShape, symbol: &str) -> bool {
        self.lookup(shape, symbol).is_some()
    }

    #[must_use]
    pub fn requires_array_argument(&self, symbol: &str) -> bool {
        self.array_argument.contains(symbol)
    }

    #[must_use]
    pub fn is_presence_only(&self, symbol: &str) -> bool {
        self.presence.contains(symbol)
    }

    /// Registered symbols for `shape`, in lexical order.
    pub fn symbols(&self, shape: ValueShape) -> impl Iterator<Item = &str> {
        self.table(OperatorTable::for_shape(shape))
            .keys()
            .map(String::as_str)
    }

    const fn table(&self, table: OperatorTable) -> &BTreeMap<String, OperatorFn> {
        match table {
            OperatorTable::Scalar => &self.scalar,
            OperatorTable::Array => &self.array,
        }
    }

    const fn table_mut(&mut self, table: OperatorTable) -> &mut BTreeMap<String, OperatorFn> {
        match table {
            OperatorTable::Scalar => &mut self.scalar,
            OperatorTable::Array => &mut self.array,
        }
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        builtin::install(&mut registry);

        registry
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("scalar", &self.scalar.keys().collect::<Vec<_>>())
            .field("array", &self.array.keys().collect::<Vec<_>>())
            .field("array_argument", &self.array_argument)
            .field("presence", &self.presence)
            .finish()
    }
}
