//! Attribute definitions - the typed fields a descriptor permits

use serde::{Deserialize, Serialize};
use shared::{Row, Value};
use std::collections::BTreeMap;

/// Attribute values of one entity, keyed by attribute id
pub type Attributes = BTreeMap<String, Value>;

/// Value kind of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Real,
    Integer,
    Boolean,
}

/// Definition of one permitted attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDef {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub kind: AttributeKind,

    pub default: Value,

    #[serde(default)]
    pub min: Option<f64>,

    #[serde(default)]
    pub max: Option<f64>,
}

impl AttributeDef {
    pub fn real(id: impl Into<String>, name: impl Into<String>, default: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: AttributeKind::Real,
            default: Value::from(default),
            min: None,
            max: None,
        }
    }

    pub fn integer(id: impl Into<String>, name: impl Into<String>, default: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: AttributeKind::Integer,
            default: Value::from(default),
            min: None,
            max: None,
        }
    }

    pub fn boolean(id: impl Into<String>, name: impl Into<String>, default: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: AttributeKind::Boolean,
            default: Value::from(default),
            min: None,
            max: None,
        }
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Convert a value to this attribute's kind, clamped to its bounds.
    ///
    /// Returns `None` if the value cannot represent this kind.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self.kind {
            AttributeKind::Real => {
                let v = self.clamp(value.as_f64()?);
                serde_json::Number::from_f64(v).map(Value::Number)
            }
            AttributeKind::Integer => {
                let v = match value.as_i64() {
                    Some(i) => i as f64,
                    None => value.as_f64()?.round(),
                };
                Some(Value::from(self.clamp(v) as i64))
            }
            AttributeKind::Boolean => value.as_bool().map(Value::Bool),
        }
    }

    fn clamp(&self, v: f64) -> f64 {
        let v = self.min.map_or(v, |min| v.max(min));
        self.max.map_or(v, |max| v.min(max))
    }
}

/// Defaults for a set of definitions
pub fn default_attributes(defs: &[AttributeDef]) -> Attributes {
    defs.iter()
        .map(|d| (d.id.clone(), d.default.clone()))
        .collect()
}

/// Keep only permitted keys, coercing their values; add defaults for the rest
pub fn sync_attributes(defs: &[AttributeDef], attributes: &Attributes) -> Attributes {
    defs.iter()
        .map(|d| {
            let value = attributes
                .get(&d.id)
                .and_then(|v| d.coerce(v))
                .unwrap_or_else(|| d.default.clone());
            (d.id.clone(), value)
        })
        .collect()
}

pub fn attributes_to_value(attributes: &Attributes) -> Value {
    Value::Object(
        attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Row>(),
    )
}

pub fn attributes_from_row(row: Option<&Row>) -> Attributes {
    row.map(|r| r.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_clamps_to_bounds() {
        let radius = AttributeDef::real("radius", "Radius", 100.0).with_bounds(0.0, 500.0);

        assert_eq!(radius.coerce(&json!(250.0)), Some(json!(250.0)));
        assert_eq!(radius.coerce(&json!(900)), Some(json!(500.0)));
        assert_eq!(radius.coerce(&json!(-3.5)), Some(json!(0.0)));
        assert_eq!(radius.coerce(&json!("far")), None);
    }

    #[test]
    fn test_coerce_integer_and_boolean() {
        let speed = AttributeDef::integer("airspeed", "Airspeed", 10).with_bounds(0.0, 100.0);
        assert_eq!(speed.coerce(&json!(12.6)), Some(json!(13)));
        assert_eq!(speed.coerce(&json!(250)), Some(json!(100)));

        let passthrough = AttributeDef::boolean("passthrough", "Passthrough", true);
        assert_eq!(passthrough.coerce(&json!(false)), Some(json!(false)));
        assert_eq!(passthrough.coerce(&json!(1)), None);
    }

    #[test]
    fn test_sync_drops_unknown_and_fills_defaults() {
        let defs = vec![
            AttributeDef::real("altitude", "Altitude", 50.0),
            AttributeDef::boolean("passthrough", "Passthrough", true),
        ];
        let mut current = Attributes::new();
        current.insert("altitude".to_string(), json!(80.0));
        current.insert("stale".to_string(), json!(1));

        let synced = sync_attributes(&defs, &current);
        assert_eq!(synced.len(), 2);
        assert_eq!(synced["altitude"], json!(80.0));
        assert_eq!(synced["passthrough"], json!(true));
        assert!(!synced.contains_key("stale"));
    }
}
