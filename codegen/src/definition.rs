//! Component definitions and the insertion-ordered definition graph.

use std::collections::{HashMap, HashSet};

use aot_model::{ResolvableType, TypeIndex};

use crate::selector::DefinitionSelector;

/// Names and types of the container's own infrastructure definitions.
pub mod infrastructure {
    /// Configuration class post-processor.
    pub const CONFIGURATION_ANNOTATION_PROCESSOR: &str =
        "org.springframework.context.annotation.internalConfigurationAnnotationProcessor";
    /// Bean name generator used during configuration parsing.
    pub const CONFIGURATION_BEAN_NAME_GENERATOR: &str =
        "org.springframework.context.annotation.internalConfigurationBeanNameGenerator";
    /// Event listener method processor.
    pub const EVENT_LISTENER_PROCESSOR: &str =
        "org.springframework.context.event.internalEventListenerProcessor";
    /// Event listener factory.
    pub const EVENT_LISTENER_FACTORY: &str =
        "org.springframework.context.event.internalEventListenerFactory";
    /// Autowired annotation post-processor.
    pub const AUTOWIRED_ANNOTATION_PROCESSOR: &str =
        "org.springframework.context.annotation.internalAutowiredAnnotationProcessor";
    /// Common annotation post-processor.
    pub const COMMON_ANNOTATION_PROCESSOR: &str =
        "org.springframework.context.annotation.internalCommonAnnotationProcessor";
    /// Metadata reader cache used while parsing configuration classes.
    pub const CACHING_METADATA_READER_FACTORY: &str =
        "org.springframework.boot.autoconfigure.internalCachingMetadataReaderFactory";

    /// Every infrastructure definition as `(name, type)`, in registration order.
    pub const DEFINITIONS: &[(&str, &str)] = &[
        (
            CONFIGURATION_ANNOTATION_PROCESSOR,
            "org.springframework.context.annotation.ConfigurationClassPostProcessor",
        ),
        (
            AUTOWIRED_ANNOTATION_PROCESSOR,
            "org.springframework.beans.factory.annotation.AutowiredAnnotationBeanPostProcessor",
        ),
        (
            COMMON_ANNOTATION_PROCESSOR,
            "org.springframework.context.annotation.CommonAnnotationBeanPostProcessor",
        ),
        (
            EVENT_LISTENER_PROCESSOR,
            "org.springframework.context.event.EventListenerMethodProcessor",
        ),
        (
            EVENT_LISTENER_FACTORY,
            "org.springframework.context.event.DefaultEventListenerFactory",
        ),
        (
            CONFIGURATION_BEAN_NAME_GENERATOR,
            "org.springframework.context.annotation.FullyQualifiedAnnotationBeanNameGenerator",
        ),
        (
            CACHING_METADATA_READER_FACTORY,
            "org.springframework.boot.autoconfigure.SharedMetadataReaderFactoryContextInitializer$SharedMetadataReaderFactoryBean",
        ),
    ];
}

/// Who a definition belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    /// Declared by the application or its auto-configurations.
    #[default]
    Application,
    /// Registered by the container for its own use.
    Infrastructure,
}

/// How the instance of a definition is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Through a constructor of the bean type.
    Constructor,
    /// Through a factory method of a configuration class.
    FactoryMethod {
        /// Type declaring the method.
        declaring_type: String,
        /// Definition whose instance receives the call; `None` for static
        /// methods.
        factory_bean: Option<String>,
        /// Method name; overloads are resolved later.
        method: String,
    },
    /// Through a source expression evaluated by the generated code.
    Supplier {
        /// Expression producing the instance.
        expression: String,
    },
}

/// One managed instance to create, as captured from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDefinition {
    /// Unique name within the graph.
    pub name: String,
    /// Declared type, with generics when known.
    pub bean_type: ResolvableType,
    /// How the instance is obtained.
    pub origin: Origin,
    /// Preferred candidate among several of the same type.
    pub primary: bool,
    /// Registered by the framework rather than declared by the user.
    pub synthetic: bool,
    /// Definition role.
    pub role: Role,
    /// Where the definition came from, for diagnostics.
    pub description: Option<String>,
}

impl ComponentDefinition {
    /// A constructor-based application definition.
    pub fn new(name: impl Into<String>, bean_type: ResolvableType) -> Self {
        Self {
            name: name.into(),
            bean_type,
            origin: Origin::Constructor,
            primary: false,
            synthetic: false,
            role: Role::Application,
            description: None,
        }
    }

    /// Sets the origin.
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Definition whose instance receives the factory-method call, if any.
    #[must_use]
    pub fn factory_bean(&self) -> Option<&str> {
        match &self.origin {
            Origin::FactoryMethod {
                factory_bean: Some(name),
                ..
            } => Some(name),
            _ => None,
        }
    }

    /// The declared type without generated-subclass suffixes (`$$...`).
    #[must_use]
    pub fn user_type(&self) -> &str {
        let name = self.bean_type.name.as_str();
        name.find("$$").map_or(name, |idx| &name[..idx])
    }
}

/// Definitions keyed by name, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DefinitionGraph {
    definitions: Vec<ComponentDefinition>,
    by_name: HashMap<String, usize>,
}

impl DefinitionGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition. A definition with the same name is replaced in
    /// place and returned.
    pub fn register(&mut self, definition: ComponentDefinition) -> Option<ComponentDefinition> {
        match self.by_name.get(&definition.name) {
            Some(&idx) => Some(std::mem::replace(&mut self.definitions[idx], definition)),
            None => {
                self.by_name
                    .insert(definition.name.clone(), self.definitions.len());
                self.definitions.push(definition);
                None
            }
        }
    }

    /// Looks up a definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ComponentDefinition> {
        self.by_name.get(name).map(|&i| &self.definitions[i])
    }

    /// Returns `true` if a definition has this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.definitions.iter()
    }

    /// Mutable iteration in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ComponentDefinition> {
        self.definitions.iter_mut()
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if the graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Keeps the definitions accepted by `selector`, preserving order.
    ///
    /// Factory-method definitions whose factory bean is dropped are dropped
    /// with it, transitively.
    #[must_use]
    pub fn select(&self, selector: &dyn DefinitionSelector) -> DefinitionGraph {
        let mut dropped: HashSet<&str> = self
            .definitions
            .iter()
            .filter(|d| !selector.select(&d.name, d))
            .map(|d| d.name.as_str())
            .collect();
        loop {
            let orphans: Vec<&str> = self
                .definitions
                .iter()
                .filter(|d| !dropped.contains(d.name.as_str()))
                .filter(|d| d.factory_bean().is_some_and(|f| dropped.contains(f)))
                .map(|d| d.name.as_str())
                .collect();
            if orphans.is_empty() {
                break;
            }
            dropped.extend(orphans);
        }
        let mut selected = DefinitionGraph::new();
        for definition in &self.definitions {
            if !dropped.contains(definition.name.as_str()) {
                selected.register(definition.clone());
            }
        }
        selected
    }

    /// Definitions whose type can be injected where `required` is expected,
    /// in insertion order.
    #[must_use]
    pub fn candidates(
        &self,
        index: &TypeIndex,
        required: &ResolvableType,
    ) -> Vec<&ComponentDefinition> {
        self.definitions
            .iter()
            .filter(|d| is_candidate(index, &d.bean_type, required))
            .collect()
    }

    /// Returns `true` if any definition matches `required`.
    #[must_use]
    pub fn has_candidate(&self, index: &TypeIndex, type_name: &str) -> bool {
        let required = ResolvableType::of(type_name);
        self.definitions
            .iter()
            .any(|d| is_candidate(index, &d.bean_type, &required))
    }
}

fn is_candidate(index: &TypeIndex, candidate: &ResolvableType, required: &ResolvableType) -> bool {
    index.is_assignable(&candidate.name, &required.name) && generics_match(candidate, required)
}

/// Unresolved generics on either side are accepted.
fn generics_match(candidate: &ResolvableType, required: &ResolvableType) -> bool {
    if !candidate.has_generics() || !required.has_generics() {
        return true;
    }
    if candidate.name != required.name {
        // Generics of different raw types cannot be compared without
        // resolving the hierarchy; accept.
        return true;
    }
    candidate.generics.len() == required.generics.len()
        && candidate
            .generics
            .iter()
            .zip(&required.generics)
            .all(|(c, r)| {
                r.name == "?" || r.name == "java.lang.Object" || (c.name == r.name && generics_match(c, r))
            })
}
