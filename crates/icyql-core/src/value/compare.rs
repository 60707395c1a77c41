use crate::value::Value;
use std::cmp::Ordering;

/// SQL equality between two non-null values.
///
/// Returns `None` when either side is NULL; numeric variants compare by
/// value across `Int` and `Float`.
#[must_use]
pub fn sql_eq(left: &Value, right: &Value) -> Option<bool> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Some(false);
            }
            let mut unknown = false;
            for (x, y) in a.iter().zip(b) {
                match sql_eq(x, y) {
                    Some(false) => return Some(false),
                    None => unknown = true,
                    Some(true) => {}
                }
            }

            if unknown { None } else { Some(true) }
        }
        _ if left.is_numeric() && right.is_numeric() => {
            Some(sql_cmp(left, right) == Some(Ordering::Equal))
        }
        _ => Some(left == right),
    }
}

/// SQL ordering between two values of the same family.
///
/// Returns `None` for NULLs and for mismatched or unordered families.
#[must_use]
pub fn sql_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        _ if left.is_numeric() && right.is_numeric() => {
            left.as_f64()?.partial_cmp(&right.as_f64()?)
        }
        _ => None,
    }
}
