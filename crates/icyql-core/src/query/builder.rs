//! Filter construction helpers.
//!
//! Each helper produces the same unresolved node the JSON parser would.

use crate::{
    query::{BooleanGroup, BooleanOp, FieldCondition, FilterExpression},
    value::Value,
};

/// Condition with an arbitrary operator symbol.
#[must_use]
pub fn cond(field: &str, operator: &str, value: impl Into<Value>) -> FilterExpression {
    FilterExpression::Field(FieldCondition::new(field, operator, value))
}

#[must_use]
pub fn eq(field: &str, value: impl Into<Value>) -> FilterExpression {
    cond(field, "$eq", value)
}

#[must_use]
pub fn ne(field: &str, value: impl Into<Value>) -> FilterExpression {
    cond(field, "$ne", value)
}

#[must_use]
pub fn lt(field: &str, value: impl Into<Value>) -> FilterExpression {
    cond(field, "$lt", value)
}

#[must_use]
pub fn lte(field: &str, value: impl Into<Value>) -> FilterExpression {
    cond(field, "$lte", value)
}

#[must_use]
pub fn gt(field: &str, value: impl Into<Value>) -> FilterExpression {
    cond(field, "$gt", value)
}

#[must_use]
pub fn gte(field: &str, value: impl Into<Value>) -> FilterExpression {
    cond(field, "$gte", value)
}

#[must_use]
pub fn prefix(field: &str, value: impl Into<Value>) -> FilterExpression {
    cond(field, "$prefix", value)
}

#[must_use]
pub fn in_list(field: &str, values: impl Into<Value>) -> FilterExpression {
    cond(field, "$in", values)
}

#[must_use]
pub fn not_in(field: &str, values: impl Into<Value>) -> FilterExpression {
    cond(field, "$nin", values)
}

#[must_use]
pub fn exists(field: &str, present: bool) -> FilterExpression {
    cond(field, "$exists", present)
}

#[must_use]
pub fn all(field: &str, values: impl Into<Value>) -> FilterExpression {
    cond(field, "$all", values)
}

#[must_use]
pub fn size(field: &str, len: i64) -> FilterExpression {
    cond(field, "$size", len)
}

#[must_use]
pub const fn and(clauses: Vec<FilterExpression>) -> FilterExpression {
    FilterExpression::Group(BooleanGroup::new(BooleanOp::And, clauses))
}

#[must_use]
pub const fn or(clauses: Vec<FilterExpression>) -> FilterExpression {
    FilterExpression::Group(BooleanGroup::new(BooleanOp::Or, clauses))
}

#[must_use]
pub const fn nor(clauses: Vec<FilterExpression>) -> FilterExpression {
    FilterExpression::Group(BooleanGroup::new(BooleanOp::Nor, clauses))
}

/// `NOT (all of clauses)`.
#[must_use]
pub const fn not(clauses: Vec<FilterExpression>) -> FilterExpression {
    FilterExpression::Group(BooleanGroup::new(BooleanOp::Not, clauses))
}
