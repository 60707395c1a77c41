use crate::query::{FilterExpression, QueryObject, Select, SortingField};
use serde_json::{Map, Value as Json, json};

impl<D> QueryObject<D> {
    /// Export back to the JSON query object form.
    ///
    /// Descriptors are not part of the exported form, so a resolved tree
    /// exports exactly like the tree it was resolved from.
    #[must_use]
    pub fn to_json(&self) -> Json {
        let mut object = Map::new();
        if !self.select.is_empty() {
            object.insert("select".to_string(), export_select(&self.select));
        }
        if !self.sort.is_empty() {
            object.insert(
                "sort".to_string(),
                Json::Array(self.sort.iter().map(export_sorting_field).collect()),
            );
        }
        if let Some(filter) = &self.filter {
            object.insert("filter".to_string(), filter.to_json());
        }

        Json::Object(object)
    }
}

impl<D> FilterExpression<D> {
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self {
            Self::Field(condition) => {
                let mut operator = Map::new();
                operator.insert(
                    condition.operator.clone(),
                    Json::from(condition.value.clone()),
                );

                let mut object = Map::new();
                object.insert(condition.reference(), Json::Object(operator));
                Json::Object(object)
            }
            Self::Group(group) => {
                let clauses = group.clauses.iter().map(Self::to_json).collect();

                let mut object = Map::new();
                object.insert(group.operator.symbol().to_string(), Json::Array(clauses));
                Json::Object(object)
            }
        }
    }
}

fn export_select<D>(select: &Select<D>) -> Json {
    let mut items: Vec<Json> = select
        .fields
        .iter()
        .map(|field| Json::String(field.name.clone()))
        .collect();

    if !select.relations.is_empty() {
        let relations = select
            .relations
            .iter()
            .map(|relation| (relation.name.clone(), relation.query.to_json()))
            .collect::<Map<_, _>>();
        items.push(Json::Object(relations));
    }

    Json::Array(items)
}

fn export_sorting_field<D>(field: &SortingField<D>) -> Json {
    json!({
        "field": field.reference(),
        "direction": field.direction.as_str(),
    })
}
