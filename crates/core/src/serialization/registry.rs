//! Process-wide registry mapping type names to factories.
//!
//! Built-in components are registered when the registry is first touched.
//! Further types are added with [`register_component`] and
//! [`register_document_store`]; there is no discovery by reflection.

use crate::error::DeserializationError;
use crate::retrievers::InMemoryEmbeddingRetriever;
use crate::serialization::{Component, ComponentDescription};
use crate::storage::{DocumentStore, InMemoryDocumentStore};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Builds a component from its description.
pub type ComponentFactory = Arc<
    dyn Fn(&ComponentDescription) -> Result<Arc<dyn Component>, DeserializationError> + Send + Sync,
>;

/// Builds a document store from its description.
pub type DocumentStoreFactory = Arc<
    dyn Fn(&ComponentDescription) -> Result<Arc<dyn DocumentStore>, DeserializationError>
        + Send
        + Sync,
>;

type StoreResult = Result<Arc<dyn DocumentStore>, DeserializationError>;

/// Name → factory tables. Document stores appear in both tables, so a store
/// description can be rebuilt either as a store or as a plain component.
#[derive(Default)]
pub struct TypeRegistry {
    components: HashMap<String, ComponentFactory>,
    document_stores: HashMap<String, DocumentStoreFactory>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut components: Vec<&String> = self.components.keys().collect();
        components.sort();
        let mut stores: Vec<&String> = self.document_stores.keys().collect();
        stores.sort();
        f.debug_struct("TypeRegistry")
            .field("components", &components)
            .field("document_stores", &stores)
            .finish()
    }
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in store and retriever.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_document_store(
            InMemoryDocumentStore::TYPE_NAME,
            InMemoryDocumentStore::from_description,
        );
        registry.register_component(
            InMemoryEmbeddingRetriever::TYPE_NAME,
            InMemoryEmbeddingRetriever::from_description,
        );
        registry
    }

    /// Registers a component factory, replacing any previous one under `type_name`.
    ///
    /// A document store previously registered under the same name stops being
    /// resolvable as a store.
    pub fn register_component<C, F>(&mut self, type_name: &str, factory: F)
    where
        C: Component + 'static,
        F: Fn(&ComponentDescription) -> Result<C, DeserializationError> + Send + Sync + 'static,
    {
        let factory: ComponentFactory = Arc::new(
            move |desc: &ComponentDescription| -> Result<Arc<dyn Component>, DeserializationError> {
                Ok(Arc::new(factory(desc)?))
            },
        );
        self.document_stores.remove(type_name);
        self.components.insert(type_name.to_string(), factory);
    }

    /// Registers a document store factory under `type_name`.
    pub fn register_document_store<S, F>(&mut self, type_name: &str, factory: F)
    where
        S: DocumentStore + 'static,
        F: Fn(&ComponentDescription) -> Result<S, DeserializationError> + Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        let as_component = Arc::clone(&factory);
        let store_factory: DocumentStoreFactory = Arc::new(
            move |desc: &ComponentDescription| -> StoreResult {
                Ok(Arc::new(factory(desc)?))
            },
        );
        let component_factory: ComponentFactory = Arc::new(
            move |desc: &ComponentDescription| -> Result<Arc<dyn Component>, DeserializationError> {
                Ok(Arc::new(as_component(desc)?))
            },
        );
        self.document_stores
            .insert(type_name.to_string(), store_factory);
        self.components
            .insert(type_name.to_string(), component_factory);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.components.contains_key(type_name)
    }

    pub fn component_factory(&self, type_name: &str) -> Option<ComponentFactory> {
        self.components.get(type_name).cloned()
    }

    pub fn document_store_factory(&self, type_name: &str) -> Option<DocumentStoreFactory> {
        self.document_stores.get(type_name).cloned()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.keys().cloned().collect();
        names.sort();
        names
    }
}

static REGISTRY: LazyLock<RwLock<TypeRegistry>> =
    LazyLock::new(|| RwLock::new(TypeRegistry::with_builtins()));

/// Registers a component type in the process-wide registry.
pub fn register_component<C, F>(type_name: &str, factory: F)
where
    C: Component + 'static,
    F: Fn(&ComponentDescription) -> Result<C, DeserializationError> + Send + Sync + 'static,
{
    REGISTRY.write().register_component(type_name, factory);
    tracing::info!(component_type = %type_name, "Component type registered");
}

/// Registers a document store type in the process-wide registry.
pub fn register_document_store<S, F>(type_name: &str, factory: F)
where
    S: DocumentStore + 'static,
    F: Fn(&ComponentDescription) -> Result<S, DeserializationError> + Send + Sync + 'static,
{
    REGISTRY.write().register_document_store(type_name, factory);
    tracing::info!(component_type = %type_name, "Document store type registered");
}

/// Whether `type_name` is known to the process-wide registry.
pub fn is_registered(type_name: &str) -> bool {
    REGISTRY.read().contains(type_name)
}

/// Rebuilds any registered component from its description.
pub fn component_from_description(
    description: &ComponentDescription,
) -> Result<Arc<dyn Component>, DeserializationError> {
    // Factories may recurse into the registry for nested components, so the
    // read guard must be gone before one runs.
    let factory = REGISTRY.read().component_factory(&description.type_name);
    let factory =
        factory.ok_or_else(|| DeserializationError::UnknownType(description.type_name.clone()))?;
    tracing::debug!(component_type = %description.type_name, "Deserializing component");
    factory(description)
}

/// Rebuilds a registered document store from its description.
pub fn document_store_from_description(
    description: &ComponentDescription,
) -> Result<Arc<dyn DocumentStore>, DeserializationError> {
    let factory = REGISTRY
        .read()
        .document_store_factory(&description.type_name);
    let factory =
        factory.ok_or_else(|| DeserializationError::UnknownType(description.type_name.clone()))?;
    tracing::debug!(component_type = %description.type_name, "Deserializing document store");
    factory(description)
}

/// Parses a JSON description and rebuilds the component it names.
pub fn from_value(value: &Value) -> Result<Arc<dyn Component>, DeserializationError> {
    component_from_description(&ComponentDescription::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::any::Any;

    #[derive(Debug)]
    struct Greeter {
        greeting: String,
    }

    impl Component for Greeter {
        fn type_name(&self) -> &'static str {
            "tests::Greeter"
        }

        fn to_description(&self) -> ComponentDescription {
            ComponentDescription::new(self.type_name())
                .with_parameter("greeting", self.greeting.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn greeter_from_description(
        desc: &ComponentDescription,
    ) -> Result<Greeter, DeserializationError> {
        Ok(Greeter {
            greeting: desc
                .optional::<String>("greeting")?
                .unwrap_or_else(|| "hello".to_string()),
        })
    }

    #[test]
    fn test_builtins_registered() {
        assert!(is_registered(InMemoryDocumentStore::TYPE_NAME));
        assert!(is_registered(InMemoryEmbeddingRetriever::TYPE_NAME));
        assert!(!is_registered("tests::NeverRegistered"));
    }

    #[test]
    fn test_unknown_type() {
        let err = from_value(&json!({"type": "tests::Nope", "init_parameters": {}})).unwrap_err();
        assert_eq!(err, DeserializationError::UnknownType("tests::Nope".to_string()));
    }

    #[test]
    fn test_missing_type() {
        let err = from_value(&json!({"init_parameters": {}})).unwrap_err();
        assert_eq!(err, DeserializationError::MissingType);
    }

    #[test]
    fn test_register_custom_component() {
        register_component("tests::Greeter", greeter_from_description);
        let component = from_value(&json!({
            "type": "tests::Greeter",
            "init_parameters": {"greeting": "hi"}
        }))
        .unwrap();
        let greeter = component.as_any().downcast_ref::<Greeter>().unwrap();
        assert_eq!(greeter.greeting, "hi");
        assert_eq!(
            component.to_description().to_value(),
            json!({"type": "tests::Greeter", "init_parameters": {"greeting": "hi"}})
        );
    }

    #[test]
    fn test_store_is_not_a_component_only_type() {
        let store_desc = ComponentDescription::new(InMemoryDocumentStore::TYPE_NAME);
        assert!(document_store_from_description(&store_desc).is_ok());
        assert!(component_from_description(&store_desc).is_ok());

        let retriever_desc = ComponentDescription::new(InMemoryEmbeddingRetriever::TYPE_NAME);
        assert_eq!(
            document_store_from_description(&retriever_desc).unwrap_err(),
            DeserializationError::UnknownType(InMemoryEmbeddingRetriever::TYPE_NAME.to_string())
        );
    }

    #[test]
    fn test_component_replaces_store_registration() {
        let mut registry = TypeRegistry::with_builtins();
        registry.register_document_store(
            "tests::Shadowed",
            InMemoryDocumentStore::from_description,
        );
        assert!(registry.document_store_factory("tests::Shadowed").is_some());

        registry.register_component("tests::Shadowed", greeter_from_description);
        assert!(registry.document_store_factory("tests::Shadowed").is_none());
        let factory = registry.component_factory("tests::Shadowed").unwrap();
        let component = factory(&ComponentDescription::new("tests::Shadowed")).unwrap();
        assert!(component.as_any().downcast_ref::<Greeter>().is_some());

        registry.register_document_store(
            "tests::Shadowed",
            InMemoryDocumentStore::from_description,
        );
        assert!(registry.document_store_factory("tests::Shadowed").is_some());
    }

    #[test]
    fn test_local_registry_is_isolated() {
        let mut registry = TypeRegistry::new();
        assert!(!registry.contains("tests::Local"));
        registry.register_component("tests::Local", greeter_from_description);
        assert_eq!(registry.type_names(), vec!["tests::Local".to_string()]);
        assert!(!is_registered("tests::Local"));

        let builtins = TypeRegistry::with_builtins();
        assert!(builtins
            .document_store_factory(InMemoryDocumentStore::TYPE_NAME)
            .is_some());
        assert!(builtins
            .document_store_factory(InMemoryEmbeddingRetriever::TYPE_NAME)
            .is_none());
    }
}
