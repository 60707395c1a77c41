//! TOML configuration for IcyQL: compiler backend, operator aliases and
//! the entity catalog.
#![warn(unreachable_pub)]

mod error;


use icyql_core::{
    backend::{self, Backend},
    compile::OperatorRegistry,
    model::{Cardinality, ColumnType, EntityModel, Schema, ValueShape},
};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
    sync::Arc,
};
use tracing::debug;

// re-exports
pub use error::ConfigError;

/// Backend used when `[compiler]` names none.
pub const DEFAULT_BACKEND: &str = "postgres";

///
/// Config
///
/// Root of an `icyql.toml` document. Every section is optional.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub compiler: CompilerConfig,
    pub operators: OperatorConfig,
    pub entities: Vec<EntityConfig>,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&source)?;
        debug!(
            target: "icyql",
            path = %path.display(),
            entities = config.entities.len(),
            backend = %config.compiler.backend,
            "config loaded"
        );

        Ok(config)
    }

    /// Check every cross-reference the deserializer cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backend()?;
        self.registry()?;
        self.schema()?;

        Ok(())
    }

    /// The configured backend.
    pub fn backend(&self) -> Result<Arc<dyn Backend>, ConfigError> {
        backend::by_name(&self.compiler.backend).ok_or_else(|| {
            ConfigError::invalid(format!("unknown backend '{}'", self.compiler.backend))
        })
    }

    /// Built-in operators plus the configured aliases.
    pub fn registry(&self) -> Result<OperatorRegistry, ConfigError> {
        let mut registry = OperatorRegistry::default();

        for (shape, aliases) in [
            (ValueShape::Scalar, &self.operators.scalar_aliases),
            (ValueShape::Array, &self.operators.array_aliases),
        ] {
            for (alias, target) in aliases {
                if !alias.starts_with('$') {
                    return Err(ConfigError::invalid(format!(
                        "operator alias '{alias}' must start with '$'"
                    )));
                }

                registry.alias(shape, alias.as_str(), target).map_err(|_| {
                    ConfigError::invalid(format!(
                        "{shape} alias '{alias}' targets unknown operator '{target}'"
                    ))
                })?;
            }
        }

        Ok(registry)
    }

    /// The declared entities as a field catalog.
    pub fn schema(&self) -> Result<Schema, ConfigError> {
        let declared = self
            .entities
            .iter()
            .map(|entity| entity.name.as_str())
            .collect::<BTreeSet<_>>();
        if declared.len() != self.entities.len() {
            return Err(ConfigError::invalid("entity names must be unique"));
        }

        let mut schema = Schema::new();
        for entity in &self.entities {
            schema.insert(entity.model(&declared)?);
        }

        Ok(schema)
    }
}

///
/// CompilerConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Backend name, see `icyql_core::backend::by_name`.
    pub backend: String,

    /// Install the `tracing` compile sink.
    pub trace: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            trace: false,
        }
    }
}

///
/// OperatorConfig
///
/// Alias symbol → existing operator symbol, per table.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OperatorConfig {
    pub scalar_aliases: BTreeMap<String, String>,
    pub array_aliases: BTreeMap<String, String>,
}

///
/// EntityConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EntityConfig {
    pub name: String,

    /// Column name → type name (`int`, `text[]`, `json`, ...).
    #[serde(default)]
    pub columns: BTreeMap<String, String>,

    #[serde(default)]
    pub relations: BTreeMap<String, RelationConfig>,
}

impl EntityConfig {
    fn model(&self, declared: &BTreeSet<&str>) -> Result<EntityModel, ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::invalid("entity name must not be empty"));
        }

        let mut model = EntityModel::new(&self.name);
        for (column, type_name) in &self.columns {
            let column_type: ColumnType = type_name.parse().map_err(|err| {
                ConfigError::invalid(format!("column '{}.{column}': {err}", self.name))
            })?;
            model = model.column(column, column_type);
        }

        for (relation, config) in &self.relations {
            if self.columns.contains_key(relation) {
                return Err(ConfigError::invalid(format!(
                    "'{}.{relation}' is declared as both a column and a relation",
                    self.name
                )));
            }
            if !declared.contains(config.target.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "relation '{}.{relation}' targets undeclared entity '{}'",
                    self.name, config.target
                )));
            }

            model = model.relation(relation, &config.target, config.cardinality);
        }

        Ok(model)
    }
}

///
/// RelationConfig
///
/// A relation without a cardinality is declared but cannot be selected.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RelationConfig {
    pub target: String,

    #[serde(default)]
    pub cardinality: Option<Cardinality>,
}
