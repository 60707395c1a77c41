use crate::{
    backend::Backend,
    query::ResolvedSortingField,
    sql::{Expr, OrderTerm},
};

///
/// SortCompiler
///
/// Maps resolved sorting fields to ordering terms in declaration order.
/// Fields are neither reordered nor deduplicated.
///

pub struct SortCompiler<'a> {
    backend: &'a dyn Backend,
}

impl<'a> SortCompiler<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn compile(&self, sort: &[ResolvedSortingField]) -> Vec<OrderTerm> {
        sort.iter()
            .map(|field| {
                let column = Expr::column(&field.descriptor.name);
                let expr = if field.sub_path.is_empty() {
                    column
                } else {
                    self.backend.structured_path(column, &field.sub_path)
                };

                OrderTerm {
                    expr,
                    direction: field.direction,
                }
            })
            .collect()
    }
}
