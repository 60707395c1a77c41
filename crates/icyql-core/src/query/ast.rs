use crate::{model::FieldDescriptor, value::Value};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

///
/// Query Object AST
///
/// Every node is generic over its descriptor slot `D`:
/// - `()` while the tree is unresolved (as parsed from caller input)
/// - `FieldDescriptor` once the resolver has bound it to a catalog
///
/// Resolution produces a new tree; an unresolved tree can be resolved any
/// number of times, against any schema binding.
///

pub type ResolvedQuery = QueryObject<FieldDescriptor>;
pub type ResolvedFilter = FilterExpression<FieldDescriptor>;
pub type ResolvedCondition = FieldCondition<FieldDescriptor>;
pub type ResolvedSortingField = SortingField<FieldDescriptor>;
pub type ResolvedRelation = SelectedRelation<FieldDescriptor>;

/// Split a dot-notation reference into the field name and its sub-path.
#[must_use]
pub fn split_path(reference: &str) -> (String, Vec<String>) {
    let mut parts = reference.split('.');
    let name = parts.next().unwrap_or_default().to_string();

    (name, parts.map(str::to_string).collect())
}

fn join_path(name: &str, sub_path: &[String]) -> String {
    if sub_path.is_empty() {
        return name.to_string();
    }

    let mut out = name.to_string();
    for part in sub_path {
        out.push('.');
        out.push_str(part);
    }
    out
}

///
/// QueryObject
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryObject<D = ()> {
    pub select: Select<D>,
    pub sort: Vec<SortingField<D>>,
    pub filter: Option<FilterExpression<D>>,
}

impl<D> QueryObject<D> {
    /// Field references at this level: selected fields and relations, sort
    /// fields and filter leaves. Relation sub-queries are not counted.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.select.fields.len()
            + self.select.relations.len()
            + self.sort.len()
            + self.filter.as_ref().map_or(0, FilterExpression::leaf_count)
    }
}

impl QueryObject {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn select_field(mut self, name: impl Into<String>) -> Self {
        self.select.fields.push(SelectedField::new(name));
        self
    }

    #[must_use]
    pub fn select_relation(mut self, name: impl Into<String>, query: Self) -> Self {
        self.select.relations.push(SelectedRelation::new(name, query));
        self
    }

    #[must_use]
    pub fn sort_by(mut self, reference: &str, direction: SortDirection) -> Self {
        self.sort.push(SortingField::new(reference, direction));
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }
}

///
/// Select
///

#[derive(Clone, Debug, PartialEq)]
pub struct Select<D = ()> {
    pub fields: Vec<SelectedField<D>>,
    pub relations: Vec<SelectedRelation<D>>,
}

impl<D> Default for Select<D> {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }
}

impl<D> Select<D> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.relations.is_empty()
    }

    /// Whether a field or relation with this name is selected.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
            || self.relations.iter().any(|relation| relation.name == name)
    }
}

///
/// SelectedField
///

#[derive(Clone, Debug, PartialEq)]
pub struct SelectedField<D = ()> {
    pub name: String,
    pub descriptor: D,
}

impl SelectedField {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: (),
        }
    }
}

///
/// SelectedRelation
///
/// A relation selected together with the query to run against its target.
///

#[derive(Clone, Debug, PartialEq)]
pub struct SelectedRelation<D = ()> {
    pub name: String,
    pub query: Box<QueryObject<D>>,
    pub descriptor: D,
}

impl SelectedRelation {
    #[must_use]
    pub fn new(name: impl Into<String>, query: QueryObject) -> Self {
        Self {
            name: name.into(),
            query: Box::new(query),
            descriptor: (),
        }
    }
}

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

///
/// SortingField
///

#[derive(Clone, Debug, PartialEq)]
pub struct SortingField<D = ()> {
    pub name: String,
    pub sub_path: Vec<String>,
    pub direction: SortDirection,
    pub descriptor: D,
}

impl SortingField {
    /// Sorting field from a dot-notation reference.
    #[must_use]
    pub fn new(reference: &str, direction: SortDirection) -> Self {
        let (name, sub_path) = split_path(reference);

        Self {
            name,
            sub_path,
            direction,
            descriptor: (),
        }
    }
}

impl<D> SortingField<D> {
    #[must_use]
    pub fn reference(&self) -> String {
        join_path(&self.name, &self.sub_path)
    }
}

///
/// BooleanOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BooleanOp {
    And,
    Or,
    Nor,
    Not,
}

impl BooleanOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
            Self::Nor => "$nor",
            Self::Not => "$not",
        }
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for BooleanOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "$and" => Ok(Self::And),
            "$or" => Ok(Self::Or),
            "$nor" => Ok(Self::Nor),
            "$not" => Ok(Self::Not),
            other => Err(format!("unsupported boolean operator: {other}")),
        }
    }
}

///
/// FilterExpression
///

#[derive(Clone, Debug, PartialEq)]
pub enum FilterExpression<D = ()> {
    Field(FieldCondition<D>),
    Group(BooleanGroup<D>),
}

impl<D> FilterExpression<D> {
    /// Number of field conditions in the tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Field(_) => 1,
            Self::Group(group) => group.clauses.iter().map(Self::leaf_count).sum(),
        }
    }

    /// Number of boolean groups in the tree.
    #[must_use]
    pub fn group_count(&self) -> usize {
        match self {
            Self::Field(_) => 0,
            Self::Group(group) => 1 + group.clauses.iter().map(Self::group_count).sum::<usize>(),
        }
    }
}

impl<D> From<FieldCondition<D>> for FilterExpression<D> {
    fn from(condition: FieldCondition<D>) -> Self {
        Self::Field(condition)
    }
}

impl<D> From<BooleanGroup<D>> for FilterExpression<D> {
    fn from(group: BooleanGroup<D>) -> Self {
        Self::Group(group)
    }
}

///
/// FieldCondition
///
/// Leaf filter node: `{ field: { operator: value } }`.
///
/// `field` and `sub_path` keep the reference as written. Once resolved,
/// `relations` holds the relations the reference walks through (outermost
/// first) and `descriptor` the column it ends on; both are empty/unit before
/// resolution.
///

#[derive(Clone, Debug, PartialEq)]
pub struct FieldCondition<D = ()> {
    pub field: String,
    pub sub_path: Vec<String>,
    pub operator: String,
    pub value: Value,
    pub relations: Vec<D>,
    pub descriptor: D,
}

impl FieldCondition {
    /// Condition on a dot-notation reference.
    #[must_use]
    pub fn new(reference: &str, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        let (field, sub_path) = split_path(reference);

        Self {
            field,
            sub_path,
            operator: operator.into(),
            value: value.into(),
            relations: Vec::new(),
            descriptor: (),
        }
    }
}

impl<D> FieldCondition<D> {
    #[must_use]
    pub fn reference(&self) -> String {
        join_path(&self.field, &self.sub_path)
    }

    /// Sub-path inside the final column, past any traversed relations.
    #[must_use]
    pub fn column_path(&self) -> &[String] {
        self.sub_path
            .get(self.relations.len()..)
            .unwrap_or_default()
    }
}

///
/// BooleanGroup
///

#[derive(Clone, Debug, PartialEq)]
pub struct BooleanGroup<D = ()> {
    pub operator: BooleanOp,
    pub clauses: Vec<FilterExpression<D>>,
}

impl<D> BooleanGroup<D> {
    #[must_use]
    pub const fn new(operator: BooleanOp, clauses: Vec<FilterExpression<D>>) -> Self {
        Self { operator, clauses }
    }
}
