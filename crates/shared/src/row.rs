//! Row vocabulary shared by entities and store adapters
//!
//! A row is a flat, ordered JSON object. Nested objects are allowed for
//! attribute maps (`params`) and for the inlined home point of a mission.

use serde::{Deserialize, Serialize};

pub use serde_json::Value;

/// A single stored row, keyed by column name
pub type Row = serde_json::Map<String, Value>;

/// Column names used across tables
pub mod params {
    pub const ID: &str = "id";
    pub const TYPE: &str = "type";
    pub const NAME: &str = "name";
    pub const PARAMS: &str = "params";

    pub const ROUTE: &str = "route";
    pub const WAYPOINT: &str = "waypoint";

    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const ALTITUDE: &str = "altitude";
    pub const CURRENT: &str = "current";
    pub const REACHED: &str = "reached";

    pub const VEHICLE: &str = "vehicle";
    pub const HOME: &str = "home";
}

/// Equality predicate on one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub value: Value,
}

impl Condition {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Check whether a row satisfies this predicate.
    ///
    /// A number and a string with the same text are equal, so id columns
    /// written as numbers match the stringified ids entities carry.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column)
            .is_some_and(|value| same_key(value, &self.value))
    }

    /// Check whether a row satisfies every predicate in the list
    pub fn all_match(conditions: &[Condition], row: &Row) -> bool {
        conditions.iter().all(|c| c.matches(row))
    }
}

fn same_key(stored: &Value, wanted: &Value) -> bool {
    match (stored, wanted) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => stored == wanted,
    }
}

/// Typed accessors for rows
pub trait RowExt {
    fn str_value(&self, key: &str) -> Option<&str>;
    fn f64_value(&self, key: &str) -> Option<f64>;
    fn bool_value(&self, key: &str) -> Option<bool>;
    fn object_value(&self, key: &str) -> Option<&Row>;
}

impl RowExt for Row {
    fn str_value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn f64_value(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    fn bool_value(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    fn object_value(&self, key: &str) -> Option<&Row> {
        self.get(key).and_then(Value::as_object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_conditions() {
        let join = row(json!({ "route": "r-1", "waypoint": "w-1" }));

        assert!(Condition::new(params::ROUTE, "r-1").matches(&join));
        assert!(!Condition::new(params::ROUTE, "r-2").matches(&join));
        assert!(!Condition::new("missing", "r-1").matches(&join));

        let both = [
            Condition::new(params::ROUTE, "r-1"),
            Condition::new(params::WAYPOINT, "w-1"),
        ];
        assert!(Condition::all_match(&both, &join));
        assert!(Condition::all_match(&[], &join));
    }

    #[test]
    fn test_numeric_ids_match_their_text() {
        let join = row(json!({ "route": 7, "waypoint": "12" }));

        assert!(Condition::new(params::ROUTE, "7").matches(&join));
        assert!(Condition::new(params::WAYPOINT, 12).matches(&join));
        assert!(!Condition::new(params::ROUTE, "07").matches(&join));
        assert!(!Condition::new(params::ROUTE, Value::Bool(true)).matches(&join));
    }

    #[test]
    fn test_row_accessors() {
        let row = row(json!({
            "name": "WPT 1",
            "altitude": 120.5,
            "current": true,
            "params": { "radius": 50 }
        }));

        assert_eq!(row.str_value(params::NAME), Some("WPT 1"));
        assert_eq!(row.f64_value(params::ALTITUDE), Some(120.5));
        assert_eq!(row.bool_value(params::CURRENT), Some(true));
        assert_eq!(row.object_value(params::PARAMS).map(|p| p.len()), Some(1));
        assert_eq!(row.str_value(params::ALTITUDE), None);
    }
}
