use crate::{
    backend::Backend,
    compile::OperatorRegistry,
    error::QueryError,
    model::{FieldDescriptor, ValueShape},
    query::{BooleanGroup, BooleanOp, FilterExpression, ResolvedCondition, ResolvedFilter},
    sql::{Condition, Expr},
    value::Value,
};

///
/// FilterCompiler
///
/// Compiles a resolved filter tree into a backend condition.
///
/// Leaves go through shape-aware coercion and the operator table selected by
/// the column's shape; groups combine their compiled clauses and are
/// parenthesised whenever they hold more than one clause.
///

pub struct FilterCompiler<'a> {
    registry: &'a OperatorRegistry,
    backend: &'a dyn Backend,
}

impl<'a> FilterCompiler<'a> {
    #[must_use]
    pub const fn new(registry: &'a OperatorRegistry, backend: &'a dyn Backend) -> Self {
        Self { registry, backend }
    }

    pub fn compile(&self, filter: &ResolvedFilter) -> Result<Condition, QueryError> {
        match filter {
            FilterExpression::Field(condition) => self.compile_condition(condition),
            FilterExpression::Group(group) => self.compile_group(group),
        }
    }

    /// Compile one field condition.
    ///
    /// Conditions that reach their column through relations are wrapped in
    /// one `Exists` per relation, innermost last.
    pub fn compile_condition(
        &self,
        condition: &ResolvedCondition,
    ) -> Result<Condition, QueryError> {
        let descriptor = &condition.descriptor;
        let literal = &condition.value;
        let shape = descriptor.value_shape();
        let presence = self.registry.is_presence_only(&condition.operator);

        let (column, value) = self.coerce(descriptor, condition.column_path(), literal, presence);

        let Some(operator) = self.registry.lookup(shape, &condition.operator) else {
            return Err(QueryError::operator(&condition.operator, shape));
        };

        if self.registry.requires_array_argument(&condition.operator) && !literal.is_array() {
            return Err(QueryError::value_shape(
                &condition.operator,
                &condition.reference(),
                "an array",
            ));
        }

        let compiled = operator(column, value, literal)?;

        condition
            .relations
            .iter()
            .rev()
            .try_fold(compiled, |inner, relation| {
                let info = relation
                    .relation
                    .as_ref()
                    .and_then(|info| info.cardinality.map(|cardinality| (info, cardinality)));
                let Some((info, cardinality)) = info else {
                    return Err(QueryError::unsupported(format!(
                        "relation '{}' has no known cardinality",
                        relation.name
                    )));
                };

                Ok(inner.through(&relation.name, &info.target, cardinality))
            })
    }

    fn compile_group(
        &self,
        group: &BooleanGroup<FieldDescriptor>,
    ) -> Result<Condition, QueryError> {
        let clauses = group
            .clauses
            .iter()
            .map(|clause| self.compile(clause))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match group.operator {
            BooleanOp::And => combine(clauses, Condition::And),
            BooleanOp::Or => combine(clauses, Condition::Or),
            // NOR negates the whole disjunction, not each clause.
            BooleanOp::Nor => combine(clauses, Condition::Or).not(),
            // NOT negates the whole conjunction: NOT (A AND B).
            BooleanOp::Not => combine(clauses, Condition::And).not(),
        })
    }

    // Column read expression and value expression for one leaf, by the pair
    // (column shape, literal shape). Array-to-array comparisons need a typed
    // array literal; structured columns are read at the literal's type unless
    // the operator only tests presence.
    fn coerce(
        &self,
        descriptor: &FieldDescriptor,
        sub_path: &[String],
        literal: &Value,
        presence: bool,
    ) -> (Expr, Expr) {
        let column = Expr::column(&descriptor.name);
        let value = Expr::Literal(literal.clone());

        match (descriptor.value_shape(), literal) {
            (ValueShape::Array, Value::List(items)) => {
                let value = descriptor
                    .element_type()
                    .map_or(value, |element| self.backend.array_literal(items, element));

                (column, value)
            }
            (ValueShape::Structured, _) => {
                let column = if sub_path.is_empty() {
                    column
                } else {
                    self.backend.structured_path(column, sub_path)
                };

                if presence {
                    (column, value)
                } else {
                    (self.backend.structured_column(column, literal), value)
                }
            }
            _ => (column, value),
        }
    }
}

// Zero clauses reduce to TRUE, one clause stands alone, more are grouped.
fn combine(mut clauses: Vec<Condition>, connective: fn(Vec<Condition>) -> Condition) -> Condition {
    match clauses.len() {
        0 => Condition::Const(true),
        1 => clauses.pop().unwrap_or(Condition::Const(true)),
        _ => connective(clauses).group(),
    }
}
