use crate::{
    error::{FieldContext, QueryError, ResolutionFailure},
    model::{FieldCatalog, FieldDescriptor, ValueShape},
    query::{
        BooleanGroup, FieldCondition, FilterExpression, QueryObject, ResolvedCondition,
        ResolvedFilter, ResolvedQuery, ResolvedRelation, ResolvedSortingField, Select,
        SelectedField, SelectedRelation, SortingField,
    },
};

///
/// ExpressionResolver
///
/// Binds every field reference of a query object to a catalog descriptor.
///
/// The walk is an exhaustive match over the closed node set; the input tree
/// is borrowed and a new, descriptor-annotated tree is returned. Select, sort
/// and filter are resolved independently against the same catalog.
///

pub struct ExpressionResolver<'a, C: FieldCatalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: FieldCatalog + ?Sized> ExpressionResolver<'a, C> {
    #[must_use]
    pub const fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    pub fn resolve(&self, entity: &str, query: &QueryObject) -> Result<ResolvedQuery, QueryError> {
        Ok(QueryObject {
            select: self.resolve_select(entity, &query.select)?,
            sort: self.resolve_sort(entity, &query.sort)?,
            filter: query
                .filter
                .as_ref()
                .map(|filter| self.resolve_filter(entity, filter))
                .transpose()?,
        })
    }

    pub fn resolve_select(
        &self,
        entity: &str,
        select: &Select,
    ) -> Result<Select<FieldDescriptor>, QueryError> {
        let fields = select
            .fields
            .iter()
            .map(|field| self.resolve_selected_field(entity, field))
            .collect::<Result<_, _>>()?;
        let relations = select
            .relations
            .iter()
            .map(|relation| self.resolve_selected_relation(entity, relation))
            .collect::<Result<_, _>>()?;

        Ok(Select { fields, relations })
    }

    pub fn resolve_sort(
        &self,
        entity: &str,
        sort: &[SortingField],
    ) -> Result<Vec<ResolvedSortingField>, QueryError> {
        sort.iter()
            .map(|field| self.resolve_sorting_field(entity, field))
            .collect()
    }

    pub fn resolve_filter(
        &self,
        entity: &str,
        filter: &FilterExpression,
    ) -> Result<ResolvedFilter, QueryError> {
        match filter {
            FilterExpression::Field(condition) => Ok(FilterExpression::Field(
                self.resolve_field_condition(entity, condition)?,
            )),
            FilterExpression::Group(group) => {
                let clauses = group
                    .clauses
                    .iter()
                    .map(|clause| self.resolve_filter(entity, clause))
                    .collect::<Result<_, _>>()?;

                Ok(FilterExpression::Group(BooleanGroup::new(
                    group.operator,
                    clauses,
                )))
            }
        }
    }

    // ---- leaves -------------------------------------------------------

    fn resolve_selected_field(
        &self,
        entity: &str,
        field: &SelectedField,
    ) -> Result<SelectedField<FieldDescriptor>, QueryError> {
        let descriptor = self
            .catalog
            .resolve_column(entity, &field.name, FieldContext::Select)?;

        Ok(SelectedField {
            name: field.name.clone(),
            descriptor,
        })
    }

    fn resolve_selected_relation(
        &self,
        entity: &str,
        relation: &SelectedRelation,
    ) -> Result<ResolvedRelation, QueryError> {
        let descriptor =
            self.catalog
                .resolve_relation(entity, &relation.name, FieldContext::Select)?;

        let target = relation_target(entity, &relation.name, &descriptor, FieldContext::Select)?;
        let query = self.resolve(&target, &relation.query)?;

        Ok(SelectedRelation {
            name: relation.name.clone(),
            query: Box::new(query),
            descriptor,
        })
    }

    fn resolve_sorting_field(
        &self,
        entity: &str,
        field: &SortingField,
    ) -> Result<ResolvedSortingField, QueryError> {
        let descriptor = self.resolve_path(
            entity,
            &field.name,
            &field.sub_path,
            FieldContext::Sort,
        )?;

        Ok(SortingField {
            name: field.name.clone(),
            sub_path: field.sub_path.clone(),
            direction: field.direction,
            descriptor,
        })
    }

    fn resolve_field_condition(
        &self,
        entity: &str,
        condition: &FieldCondition,
    ) -> Result<ResolvedCondition, QueryError> {
        let context = FieldContext::Filter;

        // `owner.name` reads `name` on the entity `owner` points to: leading
        // segments that name relations are walked until a column is reached.
        let mut target = entity.to_string();
        let mut name = condition.field.as_str();
        let mut rest = condition.sub_path.as_slice();
        let mut relations = Vec::new();

        while let Some((next, tail)) = rest.split_first() {
            if self.catalog.column(&target, name).is_some() {
                break;
            }
            let Some(relation) = self.catalog.relation(&target, name) else {
                break;
            };

            target = relation_target(&target, name, &relation, context)?;
            relations.push(relation);
            name = next.as_str();
            rest = tail;
        }

        let descriptor = self.resolve_path(&target, name, rest, context)?;

        Ok(FieldCondition {
            field: condition.field.clone(),
            sub_path: condition.sub_path.clone(),
            operator: condition.operator.clone(),
            value: condition.value.clone(),
            relations,
            descriptor,
        })
    }

    // Column lookup plus the rule that sub-paths address structured columns only.
    fn resolve_path(
        &self,
        entity: &str,
        name: &str,
        sub_path: &[String],
        context: FieldContext,
    ) -> Result<FieldDescriptor, QueryError> {
        let descriptor = self.catalog.resolve_column(entity, name, context)?;

        if !sub_path.is_empty() && descriptor.value_shape() != ValueShape::Structured {
            let reference = std::iter::once(name)
                .chain(sub_path.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(".");

            return Err(QueryError::schema_resolution(
                entity,
                &reference,
                context,
                ResolutionFailure::SubPathNotStructured,
            ));
        }

        Ok(descriptor)
    }
}

// Target entity of a relation; it is only usable once its cardinality is known.
fn relation_target(
    entity: &str,
    name: &str,
    descriptor: &FieldDescriptor,
    context: FieldContext,
) -> Result<String, QueryError> {
    descriptor
        .relation
        .as_ref()
        .filter(|info| info.cardinality.is_some())
        .map(|info| info.target.clone())
        .ok_or_else(|| {
            QueryError::schema_resolution(
                entity,
                name,
                context,
                ResolutionFailure::UnknownCardinality,
            )
        })
}

impl QueryObject {
    /// Resolve this query object against `entity` in `catalog`.
    pub fn resolve<C: FieldCatalog + ?Sized>(
        &self,
        catalog: &C,
        entity: &str,
    ) -> Result<ResolvedQuery, QueryError> {
        ExpressionResolver::new(catalog).resolve(entity, self)
    }
}
