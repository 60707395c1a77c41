//! Module: query::parse
//! Responsibility: map an already-deserialized JSON document onto the
//! query object grammar.
//! Does not own: wire decoding or field existence checks.
//! Boundary: every malformed shape fails with `UnsupportedExpression`.

use crate::{
    error::QueryError,
    query::{
        BooleanGroup, BooleanOp, FieldCondition, FilterExpression, QueryObject, Select,
        SelectedField, SelectedRelation, SortDirection, SortingField, split_path,
    },
    value::Value,
};
use serde_json::{Map, Value as Json};

const KEY_SELECT: &str = "select";
const KEY_SORT: &str = "sort";
const KEY_FILTER: &str = "filter";

impl QueryObject {
    /// Parse a query object from its JSON form.
    ///
    /// `null` is the empty query object.
    pub fn from_json(json: &Json) -> Result<Self, QueryError> {
        let object = match json {
            Json::Null => return Ok(Self::default()),
            Json::Object(object) => object,
            other => {
                return Err(QueryError::unsupported(format!(
                    "query object must be an object, got {}",
                    json_type(other)
                )));
            }
        };

        if let Some(key) = object
            .keys()
            .find(|key| ![KEY_SELECT, KEY_SORT, KEY_FILTER].contains(&key.as_str()))
        {
            return Err(QueryError::unsupported(format!(
                "unknown query object key \"{key}\""
            )));
        }

        Ok(Self {
            select: parse_select(object.get(KEY_SELECT))?,
            sort: parse_sort(object.get(KEY_SORT))?,
            filter: match object.get(KEY_FILTER) {
                None | Some(Json::Null) => None,
                Some(filter) => FilterExpression::from_json(filter)?,
            },
        })
    }
}

impl FilterExpression {
    /// Parse a filter document; `{}` yields `None`.
    pub fn from_json(json: &Json) -> Result<Option<Self>, QueryError> {
        let Json::Object(object) = json else {
            return Err(QueryError::unsupported("\"filter\" must be an object"));
        };

        let mut entries = parse_filter_object(object)?;
        Ok(match entries.len() {
            0 => None,
            1 => entries.pop(),
            _ => Some(Self::Group(BooleanGroup::new(BooleanOp::And, entries))),
        })
    }
}

// ---- select -----------------------------------------------------------

fn parse_select(json: Option<&Json>) -> Result<Select, QueryError> {
    let items = match json {
        None | Some(Json::Null) => return Ok(Select::default()),
        Some(Json::Array(items)) => items,
        Some(_) => return Err(QueryError::unsupported("\"select\" must be an array")),
    };

    let mut select = Select::default();
    for item in items {
        match item {
            Json::String(name) => select.fields.push(SelectedField::new(name.as_str())),
            Json::Object(relations) => {
                for (name, query) in relations {
                    let query = QueryObject::from_json(query)?;
                    select.relations.push(SelectedRelation::new(name.as_str(), query));
                }
            }
            other => {
                return Err(QueryError::unsupported(format!(
                    "unsupported type encountered in \"select\": {}",
                    json_type(other)
                )));
            }
        }
    }

    Ok(select)
}

// ---- sort -------------------------------------------------------------

fn parse_sort(json: Option<&Json>) -> Result<Vec<SortingField>, QueryError> {
    let items = match json {
        None | Some(Json::Null) => return Ok(Vec::new()),
        Some(Json::Array(items)) => items,
        Some(_) => return Err(QueryError::unsupported("\"sort\" must be an array")),
    };

    items.iter().map(parse_sorting_field).collect()
}

fn parse_sorting_field(json: &Json) -> Result<SortingField, QueryError> {
    match json {
        // "name", "name+", "name-"
        Json::String(spec) => {
            let (reference, direction) = if let Some(name) = spec.strip_suffix('-') {
                (name, SortDirection::Desc)
            } else if let Some(name) = spec.strip_suffix('+') {
                (name, SortDirection::Asc)
            } else {
                (spec.as_str(), SortDirection::Asc)
            };

            sorting_field(reference, direction)
        }
        Json::Object(object) => {
            let Some(Json::String(reference)) = object.get("field") else {
                return Err(QueryError::unsupported(
                    "sort entry must name its \"field\" as a string",
                ));
            };
            let direction = match object.get("direction") {
                None | Some(Json::Null) => SortDirection::Asc,
                Some(Json::String(dir)) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                Some(Json::String(dir)) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                Some(other) => {
                    return Err(QueryError::unsupported(format!(
                        "sort direction must be \"asc\" or \"desc\", got {other}"
                    )));
                }
            };

            sorting_field(reference, direction)
        }
        other => Err(QueryError::unsupported(format!(
            "unsupported type encountered in \"sort\": {}",
            json_type(other)
        ))),
    }
}

fn sorting_field(reference: &str, direction: SortDirection) -> Result<SortingField, QueryError> {
    if reference.is_empty() {
        return Err(QueryError::unsupported("sort field name must not be empty"));
    }

    Ok(SortingField::new(reference, direction))
}

// ---- filter -----------------------------------------------------------

fn parse_filter_object(object: &Map<String, Json>) -> Result<Vec<FilterExpression>, QueryError> {
    let mut out = Vec::with_capacity(object.len());

    for (key, value) in object {
        if key.starts_with('$') {
            out.push(parse_boolean_group(key, value)?);
        } else {
            out.extend(parse_field_conditions(key, value)?);
        }
    }

    Ok(out)
}

fn parse_field_conditions(
    reference: &str,
    value: &Json,
) -> Result<Vec<FilterExpression>, QueryError> {
    let (field, _) = split_path(reference);
    if field.is_empty() {
        return Err(QueryError::unsupported("filter field name must not be empty"));
    }

    // { field: { $op: value, ... } } unless the object carries no operators,
    // in which case it is a literal for the { field: value } shorthand.
    let operators = match value {
        Json::Object(object) if !object.is_empty() && object.keys().all(|k| k.starts_with('$')) => {
            object
        }
        Json::Object(object) if object.keys().any(|k| k.starts_with('$')) => {
            return Err(QueryError::unsupported(format!(
                "filter for \"{reference}\" mixes operators and plain keys"
            )));
        }
        literal => {
            return Ok(vec![FilterExpression::Field(FieldCondition::new(
                reference,
                "$eq",
                Value::from(literal),
            ))]);
        }
    };

    Ok(operators
        .iter()
        .map(|(operator, operand)| {
            FilterExpression::Field(FieldCondition::new(
                reference,
                operator.as_str(),
                Value::from(operand),
            ))
        })
        .collect())
}

fn parse_boolean_group(key: &str, operand: &Json) -> Result<FilterExpression, QueryError> {
    let operator: BooleanOp = key.parse().map_err(QueryError::unsupported)?;

    // Every entry of every clause object is a clause of the group itself:
    // `{ "$or": [{ "a": 1, "b": 2 }] }` is `a OR b`.
    let clauses = match (operator, operand) {
        // $not also takes a single object.
        (BooleanOp::Not, Json::Object(object)) => parse_filter_object(object)?,
        (_, Json::Array(items)) => {
            let mut clauses = Vec::with_capacity(items.len());
            for item in items {
                let Json::Object(object) = item else {
                    return Err(QueryError::unsupported(format!(
                        "boolean group clause must be an object, got {}",
                        json_type(item)
                    )));
                };
                clauses.extend(parse_filter_object(object)?);
            }

            clauses
        }
        (BooleanOp::Not, _) => {
            return Err(QueryError::unsupported(format!(
                "{key}'s operand must be an object or an array"
            )));
        }
        _ => {
            return Err(QueryError::unsupported(format!(
                "{key}'s operand must be an array"
            )));
        }
    };

    Ok(FilterExpression::Group(BooleanGroup::new(operator, clauses)))
}

const fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
