use crate::{
    compile::{CompiledQuery, QueryCompiler},
    error::{FieldContext, QueryError, ResolutionFailure},
    model::{Cardinality, FieldDescriptor},
    query::{ResolvedRelation, Select},
    sql::Expr,
};

///
/// Projection
///
/// Selected columns in declaration order, plus the compiled sub-query of
/// every selected relation. An empty column list selects every column.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    pub columns: Vec<Expr>,
    pub relations: Vec<RelationProjection>,
}

impl Projection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.relations.is_empty()
    }
}

///
/// RelationProjection
///

#[derive(Clone, Debug, PartialEq)]
pub struct RelationProjection {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
    pub query: CompiledQuery,
}

///
/// SelectCompiler
///
/// Relations are compiled recursively against their target entity with the
/// same compiler.
///

pub struct SelectCompiler<'a> {
    compiler: &'a QueryCompiler,
}

impl<'a> SelectCompiler<'a> {
    #[must_use]
    pub const fn new(compiler: &'a QueryCompiler) -> Self {
        Self { compiler }
    }

    pub fn compile(
        &self,
        entity: &str,
        select: &Select<FieldDescriptor>,
    ) -> Result<Projection, QueryError> {
        let columns = select
            .fields
            .iter()
            .map(|field| Expr::column(&field.descriptor.name))
            .collect();
        let relations = select
            .relations
            .iter()
            .map(|relation| self.compile_relation(entity, relation))
            .collect::<Result<_, _>>()?;

        Ok(Projection { columns, relations })
    }

    fn compile_relation(
        &self,
        entity: &str,
        relation: &ResolvedRelation,
    ) -> Result<RelationProjection, QueryError> {
        let failure = |reason| {
            QueryError::schema_resolution(entity, &relation.name, FieldContext::Select, reason)
        };

        let info = relation
            .descriptor
            .relation
            .as_ref()
            .ok_or_else(|| failure(ResolutionFailure::UnknownRelation))?;
        let cardinality = info
            .cardinality
            .ok_or_else(|| failure(ResolutionFailure::UnknownCardinality))?;

        Ok(RelationProjection {
            name: relation.name.clone(),
            target: info.target.clone(),
            cardinality,
            query: self.compiler.compile(&info.target, &relation.query)?,
        })
    }
}
