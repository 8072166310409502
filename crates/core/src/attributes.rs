//! Attribute registration hook
//!
//! Serializable types describe their attributes once, when their factory is
//! added. The bridge only collects the metadata; serializing attribute
//! values is the engine's business.

use serde_json::Value;

/// Metadata of one serializable attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub default: Value,
}

/// Errors raised while registering attributes
#[derive(Debug, thiserror::Error)]
pub enum AttributeError {
    #[error("Attribute name is empty")]
    EmptyName,

    #[error("Attribute registered twice: {0}")]
    Duplicate(String),

    /// Failure reported by the type's own hook
    #[error("{0}")]
    Hook(String),
}

/// Collects attributes from a type's `register_attributes` hook
#[derive(Debug, Default)]
pub struct AttributeRegistrar {
    attributes: Vec<AttributeInfo>,
}

impl AttributeRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute with its default value
    pub fn register(
        &mut self,
        name: impl Into<String>,
        default: impl Into<Value>,
    ) -> Result<(), AttributeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(AttributeError::EmptyName);
        }
        if self.attributes.iter().any(|a| a.name == name) {
            return Err(AttributeError::Duplicate(name));
        }

        self.attributes.push(AttributeInfo {
            name,
            default: default.into(),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeInfo> {
        self.attributes.iter()
    }

    pub fn into_attributes(self) -> Vec<AttributeInfo> {
        self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_in_order() {
        let mut registrar = AttributeRegistrar::new();
        registrar.register("Speed", 2.5).unwrap();
        registrar.register("Name", "player").unwrap();

        let names: Vec<_> = registrar.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Speed", "Name"]);

        let attrs = registrar.into_attributes();
        assert_eq!(attrs[1].default, Value::from("player"));
    }

    #[test]
    fn test_rejects_duplicates_and_empty_names() {
        let mut registrar = AttributeRegistrar::new();
        registrar.register("Speed", 1).unwrap();

        assert!(matches!(
            registrar.register("Speed", 2),
            Err(AttributeError::Duplicate(name)) if name == "Speed"
        ));
        assert!(matches!(
            registrar.register("", 0),
            Err(AttributeError::EmptyName)
        ));
        assert_eq!(registrar.len(), 1);
    }
}
