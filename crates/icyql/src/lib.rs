//! ## Crate layout
//! - `core`: value model, field catalog, query objects, resolution, operator
//!   registry, compilers, SQL rendering and the reference evaluator.
//! - `config`: TOML configuration for backends, operator aliases and entities.
//!
//! `Engine` ties a configured schema to a configured compiler.
//! The `prelude` module carries the domain vocabulary only.
#![warn(unreachable_pub)]

mod engine;
mod error;

pub use icyql_config as config;
pub use icyql_core as core;

// re-exports
pub use engine::Engine;
pub use error::{Error, ErrorKind};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Engine,
        core::{
            compile::CompiledQuery,
            model::{Cardinality, ColumnType, EntityModel, FieldCatalog, Schema},
            query::{FilterExpression, QueryObject, SortDirection},
            value::Value,
        },
    };
}
