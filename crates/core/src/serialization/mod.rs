//! Component descriptions and the type registry.
//!
//! Every serializable component turns itself into a [`ComponentDescription`]:
//!
//! ```json
//! { "type": "vecpipe_core::retrievers::InMemoryEmbeddingRetriever",
//!   "init_parameters": {
//!     "top_k": 10,
//!     "document_store": { "type": "...", "init_parameters": {} } } }
//! ```
//!
//! The [`registry`] maps type names back to factories, so a description rebuilds a
//! component without the caller naming its concrete type. Nested components (such
//! as a retriever's document store) are rebuilt bottom-up.

/// Name → factory registry for components and document stores.
pub mod registry;

pub use registry::{
    component_from_description, document_store_from_description, from_value, is_registered,
    register_component, register_document_store, TypeRegistry,
};

use crate::error::DeserializationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;

/// Serialized form of a component: its registered type name plus the parameters
/// needed to construct an equivalent instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescription {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub init_parameters: Map<String, Value>,
}

impl ComponentDescription {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            init_parameters: Map::new(),
        }
    }

    /// Adds an init parameter, builder style.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.init_parameters.insert(name.into(), value.into());
        self
    }

    /// Parses a description from JSON.
    ///
    /// `type` must be present and a string. A missing `init_parameters` is read as
    /// an empty map.
    pub fn from_value(value: &Value) -> Result<Self, DeserializationError> {
        let Value::Object(object) = value else {
            return Err(DeserializationError::InvalidParameter {
                type_name: "<unknown>".to_string(),
                name: "<root>".to_string(),
                reason: format!("expected an object, found {}", json_kind(value)),
            });
        };
        let type_name = match object.get("type") {
            None | Some(Value::Null) => return Err(DeserializationError::MissingType),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(DeserializationError::InvalidParameter {
                    type_name: "<unknown>".to_string(),
                    name: "type".to_string(),
                    reason: format!("expected a string, found {}", json_kind(other)),
                })
            }
        };
        let init_parameters = match object.get("init_parameters") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(params)) => params.clone(),
            Some(other) => {
                return Err(DeserializationError::InvalidParameter {
                    type_name,
                    name: "init_parameters".to_string(),
                    reason: format!("expected an object, found {}", json_kind(other)),
                })
            }
        };
        Ok(Self {
            type_name,
            init_parameters,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("type".to_string(), Value::String(self.type_name.clone()));
        object.insert(
            "init_parameters".to_string(),
            Value::Object(self.init_parameters.clone()),
        );
        Value::Object(object)
    }

    /// Returns a required init parameter, or [`DeserializationError::MissingKey`].
    pub fn require(&self, key: &str) -> Result<&Value, DeserializationError> {
        match self.init_parameters.get(key) {
            None | Some(Value::Null) => Err(DeserializationError::MissingKey {
                type_name: self.type_name.clone(),
                key: key.to_string(),
            }),
            Some(value) => Ok(value),
        }
    }

    /// Decodes an optional init parameter. Absent and `null` both yield `None`.
    pub fn optional<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, DeserializationError> {
        match self.init_parameters.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                DeserializationError::InvalidParameter {
                    type_name: self.type_name.clone(),
                    name: key.to_string(),
                    reason: e.to_string(),
                }
            }),
        }
    }
}

/// A pipeline component that can describe itself for later reconstruction.
pub trait Component: fmt::Debug + Send + Sync {
    /// Registry name of the concrete type.
    fn type_name(&self) -> &'static str;

    /// Description holding every init parameter, defaults included.
    fn to_description(&self) -> ComponentDescription;

    /// Allows callers to recover the concrete type after registry lookup.
    fn as_any(&self) -> &dyn Any;
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full() {
        let desc = ComponentDescription::from_value(&json!({
            "type": "some::Component",
            "init_parameters": {"top_k": 5}
        }))
        .unwrap();
        assert_eq!(desc.type_name, "some::Component");
        assert_eq!(desc.init_parameters.get("top_k"), Some(&json!(5)));
    }

    #[test]
    fn test_missing_init_parameters_is_empty() {
        let desc = ComponentDescription::from_value(&json!({"type": "some::Component"})).unwrap();
        assert!(desc.init_parameters.is_empty());
    }

    #[test]
    fn test_missing_type() {
        let err = ComponentDescription::from_value(&json!({"init_parameters": {}})).unwrap_err();
        assert_eq!(err, DeserializationError::MissingType);
        assert_eq!(err.to_string(), "missing 'type' in serialization data");
    }

    #[test]
    fn test_bad_shapes() {
        assert!(matches!(
            ComponentDescription::from_value(&json!([1, 2])),
            Err(DeserializationError::InvalidParameter { .. })
        ));
        assert!(matches!(
            ComponentDescription::from_value(&json!({"type": 3})),
            Err(DeserializationError::InvalidParameter { .. })
        ));
        assert!(matches!(
            ComponentDescription::from_value(&json!({"type": "x", "init_parameters": "nope"})),
            Err(DeserializationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_to_value_round_trip() {
        let desc = ComponentDescription::new("a::B")
            .with_parameter("top_k", 3)
            .with_parameter("scale_score", false);
        let value = desc.to_value();
        assert_eq!(
            value,
            json!({"type": "a::B", "init_parameters": {"top_k": 3, "scale_score": false}})
        );
        assert_eq!(ComponentDescription::from_value(&value).unwrap(), desc);
    }

    #[test]
    fn test_require_and_optional() {
        let desc = ComponentDescription::new("a::B")
            .with_parameter("top_k", 3)
            .with_parameter("filters", Value::Null);
        assert_eq!(desc.require("top_k").unwrap(), &json!(3));
        assert_eq!(
            desc.require("filters").unwrap_err(),
            DeserializationError::MissingKey {
                type_name: "a::B".to_string(),
                key: "filters".to_string()
            }
        );
        assert_eq!(desc.optional::<i64>("top_k").unwrap(), Some(3));
        assert_eq!(desc.optional::<i64>("missing").unwrap(), None);
        assert!(desc.optional::<bool>("top_k").is_err());
    }
}
