use crate::model::{Cardinality, ColumnType, FieldCatalog, FieldDescriptor};
use derive_more::Deref;
use std::collections::BTreeMap;

///
/// RelationModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationModel {
    pub target: String,
    pub cardinality: Option<Cardinality>,
}

///
/// EntityModel
///
/// Columns and relations of one entity type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityModel {
    pub name: String,
    pub columns: BTreeMap<String, ColumnType>,
    pub relations: BTreeMap<String, RelationModel>,
}

impl EntityModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.insert(name.into(), column_type);
        self
    }

    #[must_use]
    pub fn relation(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        cardinality: Option<Cardinality>,
    ) -> Self {
        self.relations.insert(
            name.into(),
            RelationModel {
                target: target.into(),
                cardinality,
            },
        );
        self
    }
}

///
/// Schema
///
/// In-memory catalog keyed by entity name. Derefs to the entity map for
/// read-only iteration.
///

#[derive(Clone, Debug, Default, Deref, Eq, PartialEq)]
pub struct Schema {
    entities: BTreeMap<String, EntityModel>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entity(mut self, entity: EntityModel) -> Self {
        self.insert(entity);
        self
    }

    /// Inserts or replaces an entity model.
    pub fn insert(&mut self, entity: EntityModel) {
        self.entities.insert(entity.name.clone(), entity);
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityModel> {
        self.entities.get(name)
    }
}

impl FieldCatalog for Schema {
    fn column(&self, entity: &str, name: &str) -> Option<FieldDescriptor> {
        let model = self.entity(entity)?;
        let column_type = model.columns.get(name)?;

        Some(FieldDescriptor::column(name, column_type.clone()))
    }

    fn relation(&self, entity: &str, name: &str) -> Option<FieldDescriptor> {
        let model = self.entity(entity)?;
        let relation = model.relations.get(name)?;

        Some(FieldDescriptor::relation(
            name,
            relation.target.clone(),
            relation.cardinality,
        ))
    }
}
