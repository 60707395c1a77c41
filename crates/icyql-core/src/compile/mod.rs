//! Module: compile
//! Responsibility: turn resolved query objects into backend predicates,
//! orderings and projections.
//! Does not own: name resolution (see `query`) or execution.
//! Boundary: `QueryCompiler` owns its operator registry and backend; the
//! output `CompiledQuery` is handed to an `Executor`.

mod builtin;
mod filter;
mod registry;
mod select;
mod sort;

#[cfg(test)]
mod tests;

use crate::{
    backend::{Backend, Postgres},
    error::QueryError,
    model::FieldCatalog,
    obs::{CompileEvent, CompileTraceSink},
    query::{ExpressionResolver, QueryObject, ResolvedQuery},
    sql::{Condition, OrderTerm, Sql, render_select},
};
use std::{fmt, sync::Arc};

// re-exports
pub use builtin::{ARRAY_ARGUMENT_OPERATORS, PRESENCE_OPERATORS, escape_like};
pub use filter::FilterCompiler;
pub use registry::{OperatorFn, OperatorRegistry, OperatorTable};
pub use select::{Projection, RelationProjection, SelectCompiler};
pub use sort::SortCompiler;

///
/// CompiledQuery
///
/// Backend-ready form of one query object. An absent filter compiles to
/// `TRUE`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    pub entity: String,
    pub projection: Projection,
    pub filter: Condition,
    pub ordering: Vec<OrderTerm>,
}

impl CompiledQuery {
    /// `SELECT .. FROM entity WHERE .. ORDER BY ..` with bind parameters.
    /// Relations are loaded separately and do not appear in the statement.
    #[must_use]
    pub fn to_sql(&self) -> Sql {
        render_select(
            &self.entity,
            &self.projection.columns,
            &self.filter,
            &self.ordering,
        )
    }
}

///
/// Executor
///
/// Query execution collaborator. Implementations own data access; the
/// compiler only produces their input.
///

pub trait Executor {
    type Rows;
    type Error;

    fn run(&self, query: &CompiledQuery) -> Result<Self::Rows, Self::Error>;
}

///
/// QueryCompiler
///
/// Resolved query → `CompiledQuery`. Holds its own registry value, so
/// compilers built from clones of one registry never observe each other's
/// registrations.
///

#[derive(Clone)]
pub struct QueryCompiler {
    registry: OperatorRegistry,
    backend: Arc<dyn Backend>,
    trace: Option<Arc<dyn CompileTraceSink>>,
}

impl QueryCompiler {
    #[must_use]
    pub fn new(registry: OperatorRegistry, backend: Arc<dyn Backend>) -> Self {
        Self {
            registry,
            backend,
            trace: None,
        }
    }

    #[must_use]
    pub fn with_trace(mut self, sink: Arc<dyn CompileTraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    #[must_use]
    pub const fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Compile a query that was resolved against `entity`.
    pub fn compile(
        &self,
        entity: &str,
        query: &ResolvedQuery,
    ) -> Result<CompiledQuery, QueryError> {
        self.compile_inner(entity, query)
            .inspect_err(|err| self.failed(entity, err))
    }

    /// Resolve `query` against `entity` in `catalog`, then compile it.
    pub fn resolve_and_compile<C: FieldCatalog + ?Sized>(
        &self,
        catalog: &C,
        entity: &str,
        query: &QueryObject,
    ) -> Result<CompiledQuery, QueryError> {
        let resolved = ExpressionResolver::new(catalog)
            .resolve(entity, query)
            .inspect_err(|err| self.failed(entity, err))?;

        self.emit(|| CompileEvent::Resolved {
            entity: entity.to_string(),
            fields: resolved.reference_count(),
        });

        self.compile(entity, &resolved)
    }

    fn compile_inner(
        &self,
        entity: &str,
        query: &ResolvedQuery,
    ) -> Result<CompiledQuery, QueryError> {
        let filter = match &query.filter {
            Some(filter) => {
                let condition =
                    FilterCompiler::new(&self.registry, self.backend()).compile(filter)?;
                self.emit(|| CompileEvent::FilterCompiled {
                    entity: entity.to_string(),
                    leaves: filter.leaf_count(),
                    groups: filter.group_count(),
                });

                condition
            }
            None => Condition::Const(true),
        };

        let ordering = SortCompiler::new(self.backend()).compile(&query.sort);
        if !ordering.is_empty() {
            self.emit(|| CompileEvent::SortCompiled {
                entity: entity.to_string(),
                terms: ordering.len(),
            });
        }

        let projection = SelectCompiler::new(self).compile(entity, &query.select)?;

        Ok(CompiledQuery {
            entity: entity.to_string(),
            projection,
            filter,
            ordering,
        })
    }

    fn emit(&self, event: impl FnOnce() -> CompileEvent) {
        if let Some(sink) = &self.trace {
            sink.on_event(event());
        }
    }

    fn failed(&self, entity: &str, err: &QueryError) {
        self.emit(|| CompileEvent::Failed {
            entity: entity.to_string(),
            kind: err.kind(),
        });
    }
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self::new(OperatorRegistry::default(), Arc::new(Postgres))
    }
}

impl fmt::Debug for QueryCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCompiler")
            .field("registry", &self.registry)
            .field("backend", &self.backend.name())
            .field("trace", &self.trace.is_some())
            .finish()
    }
}
