//! Module: query
//! Responsibility: query object structure, its JSON grammar, and binding of
//! field references to catalog descriptors.
//! Does not own: backend expression building (see `compile`).
//! Field-name rewriting (`Rewriter`) runs on unresolved trees.
//! Boundary: `ExpressionResolver` turns an unresolved `QueryObject` into a
//! `ResolvedQuery`; only resolved trees can be compiled.

mod ast;
pub mod builder;
mod export;
mod parse;
mod resolve;
mod rewrite;

#[cfg(test)]
mod tests;

pub use ast::{
    BooleanGroup, BooleanOp, FieldCondition, FilterExpression, QueryObject, ResolvedCondition,
    ResolvedFilter, ResolvedQuery, ResolvedRelation, ResolvedSortingField, Select, SelectedField,
    SelectedRelation, SortDirection, SortingField, split_path,
};
pub use resolve::ExpressionResolver;
pub use rewrite::{FieldRenamer, FieldsMap, KeepNames, Rename, Rewriter};
