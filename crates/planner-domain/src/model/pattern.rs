//! Route patterns - parametrised templates a route can be generated from

use super::attribute::Attributes;
use super::id::EntityId;
use super::types::{Descriptor, RoutePatternType};
use shared::Value;
use std::sync::Arc;

/// A pattern instance with its own attribute values
#[derive(Debug, Clone)]
pub struct RoutePattern {
    id: EntityId,
    pattern_type: Arc<RoutePatternType>,
    attributes: Attributes,
}

impl RoutePattern {
    pub fn new(pattern_type: Arc<RoutePatternType>) -> Self {
        let attributes = pattern_type.default_attributes();
        Self {
            id: EntityId::generate(),
            pattern_type,
            attributes,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn pattern_type(&self) -> &Arc<RoutePatternType> {
        &self.pattern_type
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn set_attribute(&mut self, key: &str, value: Value) -> bool {
        match self.pattern_type.attribute(key).and_then(|def| def.coerce(&value)) {
            Some(v) => {
                self.attributes.insert(key.to_string(), v);
                true
            }
            None => false,
        }
    }
}

/// Creates patterns of one pattern type
///
/// This is a PORT: factories are registered per pattern id with the
/// missions repository.
pub trait RoutePatternFactory: Send + Sync {
    fn pattern_type(&self) -> &Arc<RoutePatternType>;

    fn create(&self) -> RoutePattern;
}

/// Factory producing patterns initialised with the type's defaults
#[derive(Debug, Clone)]
pub struct DefaultPatternFactory {
    pattern_type: Arc<RoutePatternType>,
}

impl DefaultPatternFactory {
    pub fn new(pattern_type: Arc<RoutePatternType>) -> Self {
        Self { pattern_type }
    }
}

impl RoutePatternFactory for DefaultPatternFactory {
    fn pattern_type(&self) -> &Arc<RoutePatternType> {
        &self.pattern_type
    }

    fn create(&self) -> RoutePattern {
        RoutePattern::new(self.pattern_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attribute::AttributeDef;
    use serde_json::json;

    #[test]
    fn test_default_factory() {
        let grid = Arc::new(RoutePatternType {
            id: "grid".to_string(),
            name: "Survey grid".to_string(),
            icon: "grid.svg".to_string(),
            attributes: vec![AttributeDef::real("spacing", "Spacing", 50.0).with_bounds(1.0, 500.0)],
        });

        let factory = DefaultPatternFactory::new(grid);
        let mut pattern = factory.create();
        assert_eq!(pattern.attributes()["spacing"], json!(50.0));

        assert!(pattern.set_attribute("spacing", json!(0.2)));
        assert_eq!(pattern.attributes()["spacing"], json!(1.0));
        assert!(!pattern.set_attribute("heading", json!(90)));
    }
}
