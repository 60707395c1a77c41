//! Core pipeline for IcyQL: query objects, field resolution, operator tables,
//! filter/sort/select compilation, SQL rendering and the reference evaluator.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod backend;
pub mod compile;
pub mod error;
pub mod eval;
pub mod model;
pub mod obs;
pub mod query;
pub mod sql;
pub mod value;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, executors, backends or trace sinks are re-exported here.
///

pub mod prelude {
    pub use crate::{
        model::{Cardinality, ColumnType, EntityModel, FieldCatalog, Schema},
        query::{FilterExpression, QueryObject, SortDirection},
        value::Value,
    };
}
