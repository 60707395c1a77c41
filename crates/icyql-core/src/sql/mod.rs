//! Module: sql
//! Responsibility: backend-neutral predicate/ordering expression trees and
//! their SQL text rendering.
//! Does not own: the rules that decide which expression an operator emits.
//! Boundary: compiler output; consumed by executors and the reference
//! evaluator.

mod expr;
mod render;

#[cfg(test)]
mod tests;

pub use expr::{CompareOp, Condition, Expr, OrderTerm, Quantifier};
pub use render::{Sql, render, render_expr, render_ordering};
pub(crate) use render::render_select;
