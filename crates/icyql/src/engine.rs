use crate::Error;
use icyql_config::Config;
use icyql_core::{
    compile::{CompiledQuery, Executor, QueryCompiler},
    eval::Record,
    model::Schema,
    obs::TracingSink,
    query::{QueryObject, ResolvedQuery, Rewriter},
};
use serde_json::Value as Json;
use std::{borrow::Cow, collections::BTreeMap, path::Path, sync::Arc};
use tracing::debug;

///
/// Engine
///
/// A schema and the compiler configured for it. Query objects arrive as
/// JSON, are resolved against the schema and compiled in one call.
///
/// Entities with a registered `Rewriter` accept API field names; queries are
/// rewritten to catalog names before resolution.
///

#[derive(Clone, Debug)]
pub struct Engine {
    schema: Schema,
    compiler: QueryCompiler,
    rewriters: BTreeMap<String, Rewriter>,
}

impl Engine {
    #[must_use]
    pub const fn new(schema: Schema, compiler: QueryCompiler) -> Self {
        Self {
            schema,
            compiler,
            rewriters: BTreeMap::new(),
        }
    }

    /// Rewrite field names of queries against `entity` with `rewriter`.
    #[must_use]
    pub fn with_rewriter(mut self, entity: impl Into<String>, rewriter: Rewriter) -> Self {
        self.rewriters.insert(entity.into(), rewriter);
        self
    }

    #[must_use]
    pub fn rewriter(&self, entity: &str) -> Option<&Rewriter> {
        self.rewriters.get(entity)
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let mut compiler = QueryCompiler::new(config.registry()?, config.backend()?);
        if config.compiler.trace {
            compiler = compiler.with_trace(Arc::new(TracingSink));
        }

        let schema = config.schema()?;
        debug!(
            target: "icyql",
            backend = compiler.backend().name(),
            entities = schema.len(),
            "engine ready"
        );

        Ok(Self::new(schema, compiler))
    }

    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        Self::from_config(&Config::from_toml_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_config(&Config::load(path)?)
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub const fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    /// Bind every field reference of `query` against `entity`.
    pub fn resolve(&self, entity: &str, query: &QueryObject) -> Result<ResolvedQuery, Error> {
        self.require_entity(entity)?;
        let query = self.rewrite(entity, query)?;

        Ok(query.resolve(&self.schema, entity)?)
    }

    pub fn compile(&self, entity: &str, query: &QueryObject) -> Result<CompiledQuery, Error> {
        self.require_entity(entity)?;
        let query = self.rewrite(entity, query)?;

        Ok(self
            .compiler
            .resolve_and_compile(&self.schema, entity, &query)?)
    }

    /// Result record of `entity` with catalog names mapped back to API names.
    pub fn export_record(&self, entity: &str, record: &Record) -> Result<Record, Error> {
        match self.rewriters.get(entity) {
            Some(rewriter) => Ok(rewriter.export_record(record)?),
            None => Ok(record.clone()),
        }
    }

    /// Parse, resolve and compile a JSON query object.
    pub fn compile_json(&self, entity: &str, query: &Json) -> Result<CompiledQuery, Error> {
        let query = QueryObject::from_json(query)?;

        self.compile(entity, &query)
    }

    /// Compile a JSON query object and hand it to `executor`.
    pub fn execute<E>(&self, executor: &E, entity: &str, query: &Json) -> Result<E::Rows, Error>
    where
        E: Executor,
        E::Error: Into<Error>,
    {
        let compiled = self.compile_json(entity, query)?;

        executor.run(&compiled).map_err(Into::into)
    }

    fn rewrite<'q>(
        &self,
        entity: &str,
        query: &'q QueryObject,
    ) -> Result<Cow<'q, QueryObject>, Error> {
        match self.rewriters.get(entity) {
            Some(rewriter) => Ok(Cow::Owned(rewriter.rewrite(query)?)),
            None => Ok(Cow::Borrowed(query)),
        }
    }

    fn require_entity(&self, entity: &str) -> Result<(), Error> {
        if self.schema.entity(entity).is_none() {
            return Err(Error::UnknownEntity(entity.to_string()));
        }

        Ok(())
    }
}
