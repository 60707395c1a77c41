use crate::{
    error::{FieldContext, QueryError, ResolutionFailure},
    model::FieldDescriptor,
};

///
/// FieldCatalog
///
/// Read-only lookup of column and relation descriptors for an entity type.
/// Lookups are in-memory metadata access; implementations must not block.
///

pub trait FieldCatalog {
    /// Column descriptor, or `None` when the entity has no such column.
    fn column(&self, entity: &str, name: &str) -> Option<FieldDescriptor>;

    /// Relation descriptor, or `None` when the entity has no such relation.
    fn relation(&self, entity: &str, name: &str) -> Option<FieldDescriptor>;

    fn resolve_column(
        &self,
        entity: &str,
        name: &str,
        context: FieldContext,
    ) -> Result<FieldDescriptor, QueryError> {
        self.column(entity, name).ok_or_else(|| {
            QueryError::schema_resolution(entity, name, context, ResolutionFailure::UnknownColumn)
        })
    }

    fn resolve_relation(
        &self,
        entity: &str,
        name: &str,
        context: FieldContext,
    ) -> Result<FieldDescriptor, QueryError> {
        self.relation(entity, name).ok_or_else(|| {
            QueryError::schema_resolution(
                entity,
                name,
                context,
                ResolutionFailure::UnknownRelation,
            )
        })
    }
}

impl<C: FieldCatalog + ?Sized> FieldCatalog for &C {
    fn column(&self, entity: &str, name: &str) -> Option<FieldDescriptor> {
        (**self).column(entity, name)
    }

    fn relation(&self, entity: &str, name: &str) -> Option<FieldDescriptor> {
        (**self).relation(entity, name)
    }
}
