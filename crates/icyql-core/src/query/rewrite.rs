//! Module: query::rewrite
//! Responsibility: translate field names between the names callers use
//! (API names) and the names the catalog knows (DB names).
//! Does not own: field existence checks; resolution runs on the rewritten
//! tree.
//! Boundary: `Rewriter::rewrite` runs before resolution and
//! `Rewriter::export_record` maps result records back.

use crate::{
    error::{FieldContext, QueryError},
    query::{
        BooleanGroup, FieldCondition, FilterExpression, QueryObject, Select, SelectedField,
        SelectedRelation, SortingField,
    },
    value::Value,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

///
/// FieldRenamer
///
/// One naming rule. `Ok(None)` drops the reference (or the result field);
/// an error rejects the whole query.
///

pub trait FieldRenamer: Send + Sync {
    fn api_to_db(&self, name: &str, context: FieldContext) -> Result<Option<String>, QueryError>;

    fn db_to_api(&self, name: &str) -> Result<Option<String>, QueryError>;
}

///
/// FieldsMap
///
/// Bidirectional name map. Unlisted names are an error in both directions;
/// `skip` names are dropped and `fail` names are rejected before lookup.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldsMap {
    db_to_api: BTreeMap<String, String>,
    api_to_db: BTreeMap<String, String>,
    skip: BTreeSet<String>,
    fail: BTreeSet<String>,
}

impl FieldsMap {
    /// Map from `(db name, api name)` pairs.
    #[must_use]
    pub fn from_db_names<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::default();
        for (db, api) in pairs {
            map.insert(db.into(), api.into());
        }

        map
    }

    /// Map DB names to API names with `db_to_api`, e.g. snake to camel case.
    #[must_use]
    pub fn from_db_fields<I, S>(names: I, db_to_api: impl Fn(&str) -> String) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_db_names(names.into_iter().map(|name| {
            let name = name.as_ref();
            (name.to_string(), db_to_api(name))
        }))
    }

    /// Map API names to DB names with `api_to_db`.
    #[must_use]
    pub fn from_api_fields<I, S>(names: I, api_to_db: impl Fn(&str) -> String) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_db_names(names.into_iter().map(|name| {
            let name = name.as_ref();
            (api_to_db(name), name.to_string())
        }))
    }

    #[must_use]
    pub fn skip<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn fail<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fail.extend(names.into_iter().map(Into::into));
        self
    }

    /// Merge `other` into this map; its entries win.
    pub fn update(&mut self, other: Self) -> &mut Self {
        self.db_to_api.extend(other.db_to_api);
        self.api_to_db.extend(other.api_to_db);
        self.skip.extend(other.skip);
        self.fail.extend(other.fail);
        self
    }

    fn insert(&mut self, db: String, api: String) {
        self.api_to_db.insert(api.clone(), db.clone());
        self.db_to_api.insert(db, api);
    }

    fn lookup(
        &self,
        map: &BTreeMap<String, String>,
        name: &str,
    ) -> Result<Option<String>, QueryError> {
        if self.skip.contains(name) {
            return Ok(None);
        }
        if self.fail.contains(name) {
            return Err(QueryError::unknown_field(name));
        }

        map.get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| QueryError::unknown_field(name))
    }
}

impl FieldRenamer for FieldsMap {
    fn api_to_db(&self, name: &str, _context: FieldContext) -> Result<Option<String>, QueryError> {
        self.lookup(&self.api_to_db, name)
    }

    fn db_to_api(&self, name: &str) -> Result<Option<String>, QueryError> {
        self.lookup(&self.db_to_api, name)
    }
}

///
/// Rename
///
/// Renames the listed fields (`api name => db name`) and drops every other.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Rename {
    forward: BTreeMap<String, String>,
    reverse: BTreeMap<String, String>,
}

impl Rename {
    #[must_use]
    pub fn new<I, K, V>(renames: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let forward: BTreeMap<String, String> = renames
            .into_iter()
            .map(|(api, db)| (api.into(), db.into()))
            .collect();
        let reverse = forward
            .iter()
            .map(|(api, db)| (db.clone(), api.clone()))
            .collect();

        Self { forward, reverse }
    }
}

impl FieldRenamer for Rename {
    fn api_to_db(&self, name: &str, _context: FieldContext) -> Result<Option<String>, QueryError> {
        Ok(self.forward.get(name).cloned())
    }

    fn db_to_api(&self, name: &str) -> Result<Option<String>, QueryError> {
        Ok(self.reverse.get(name).cloned())
    }
}

///
/// KeepNames
///
/// Keeps the listed names as they are and drops every other.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KeepNames(BTreeSet<String>);

impl KeepNames {
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    fn keep(&self, name: &str) -> Option<String> {
        self.0.contains(name).then(|| name.to_string())
    }
}

impl FieldRenamer for KeepNames {
    fn api_to_db(&self, name: &str, _context: FieldContext) -> Result<Option<String>, QueryError> {
        Ok(self.keep(name))
    }

    fn db_to_api(&self, name: &str) -> Result<Option<String>, QueryError> {
        Ok(self.keep(name))
    }
}

type RewriterFactory = Arc<dyn Fn() -> Rewriter + Send + Sync>;

///
/// Rewriter
///
/// A renamer for one entity plus rewriters for its relations, keyed by the
/// relation's DB name.
///
/// Relation rewriters can be deferred behind a function, which lets two
/// entities that point at each other share rewriters.
///

#[derive(Clone)]
pub struct Rewriter {
    renamer: Arc<dyn FieldRenamer>,
    relations: BTreeMap<String, RewriterFactory>,
}

impl Rewriter {
    #[must_use]
    pub fn new(renamer: impl FieldRenamer + 'static) -> Self {
        Self {
            renamer: Arc::new(renamer),
            relations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_relation(self, name: impl Into<String>, rewriter: Self) -> Self {
        self.with_relation_fn(name, move || rewriter.clone())
    }

    /// Rewriter for a relation, built by `factory` whenever it is looked up.
    #[must_use]
    pub fn with_relation_fn<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Self + Send + Sync + 'static,
    {
        self.relations.insert(name.into(), Arc::new(factory));
        self
    }

    /// Rewriter registered for the relation with this DB name.
    #[must_use]
    pub fn relation(&self, name: &str) -> Option<Self> {
        self.relations.get(name).map(|factory| factory())
    }

    pub fn api_to_db(
        &self,
        name: &str,
        context: FieldContext,
    ) -> Result<Option<String>, QueryError> {
        self.renamer.api_to_db(name, context)
    }

    pub fn db_to_api(&self, name: &str) -> Result<Option<String>, QueryError> {
        self.renamer.db_to_api(name)
    }

    /// Query object with every field reference translated to DB names.
    ///
    /// Dropped references disappear: a dropped filter leaf leaves its group
    /// with fewer clauses, a dropped top-level leaf leaves no filter.
    pub fn rewrite(&self, query: &QueryObject) -> Result<QueryObject, QueryError> {
        let filter = match &query.filter {
            Some(filter) => self.rewrite_filter(filter)?,
            None => None,
        };

        Ok(QueryObject {
            select: self.rewrite_select(&query.select)?,
            sort: self.rewrite_sort(&query.sort)?,
            filter,
        })
    }

    /// Result record with DB field names translated back to API names,
    /// descending into embedded relation records.
    pub fn export_record(
        &self,
        record: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, QueryError> {
        let mut out = BTreeMap::new();

        for (name, value) in record {
            let Some(api_name) = self.db_to_api(name)? else {
                continue;
            };
            let value = match self.relation(name) {
                Some(nested) => nested.export_value(value)?,
                None => value.clone(),
            };

            out.insert(api_name, value);
        }

        Ok(out)
    }

    fn export_value(&self, value: &Value) -> Result<Value, QueryError> {
        Ok(match value {
            Value::Map(record) => Value::Map(self.export_record(record)?),
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.export_value(item))
                    .collect::<Result<_, _>>()?,
            ),
            other => other.clone(),
        })
    }

    // Dotted references rename their head here; the tail is renamed by the
    // relation's rewriter when the head names one, otherwise it is a
    // structured sub-path and kept as written.
    fn rewrite_reference(
        &self,
        reference: &str,
        context: FieldContext,
    ) -> Result<Option<String>, QueryError> {
        let (head, tail) = match reference.split_once('.') {
            Some((head, tail)) => (head, Some(tail)),
            None => (reference, None),
        };

        let Some(db_head) = self.api_to_db(head, context)? else {
            return Ok(None);
        };
        let Some(tail) = tail else {
            return Ok(Some(db_head));
        };

        let db_tail = match self.relation(&db_head) {
            Some(nested) => match nested.rewrite_reference(tail, context)? {
                Some(db_tail) => db_tail,
                None => return Ok(None),
            },
            None => tail.to_string(),
        };

        Ok(Some(format!("{db_head}.{db_tail}")))
    }

    fn rewrite_select(&self, select: &Select) -> Result<Select, QueryError> {
        let mut out = Select::default();

        for field in &select.fields {
            if let Some(name) = self.api_to_db(&field.name, FieldContext::Select)? {
                out.fields.push(SelectedField::new(name));
            }
        }

        for relation in &select.relations {
            let Some(name) = self.api_to_db(&relation.name, FieldContext::Select)? else {
                continue;
            };
            let query = match self.relation(&name) {
                Some(nested) => nested.rewrite(&relation.query)?,
                None => (*relation.query).clone(),
            };

            out.relations.push(SelectedRelation::new(name, query));
        }

        Ok(out)
    }

    fn rewrite_sort(&self, sort: &[SortingField]) -> Result<Vec<SortingField>, QueryError> {
        let mut out = Vec::with_capacity(sort.len());

        for field in sort {
            let reference = self.rewrite_reference(&field.reference(), FieldContext::Sort)?;
            if let Some(reference) = reference {
                out.push(SortingField::new(&reference, field.direction));
            }
        }

        Ok(out)
    }

    fn rewrite_filter(
        &self,
        filter: &FilterExpression,
    ) -> Result<Option<FilterExpression>, QueryError> {
        Ok(match filter {
            FilterExpression::Field(condition) => self
                .rewrite_reference(&condition.reference(), FieldContext::Filter)?
                .map(|reference| {
                    FilterExpression::Field(FieldCondition::new(
                        &reference,
                        condition.operator.clone(),
                        condition.value.clone(),
                    ))
                }),
            FilterExpression::Group(group) => {
                let mut clauses = Vec::with_capacity(group.clauses.len());
                for clause in &group.clauses {
                    clauses.extend(self.rewrite_filter(clause)?);
                }

                Some(FilterExpression::Group(BooleanGroup::new(
                    group.operator,
                    clauses,
                )))
            }
        })
    }
}

impl fmt::Debug for Rewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rewriter")
            .field("relations", &self.relations.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
