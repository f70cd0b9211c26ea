//! Definition selection: which captured definitions get generated code.

use std::collections::HashSet;

use crate::definition::{infrastructure, ComponentDefinition};

/// A pure predicate over captured definitions.
///
/// Implementations must depend only on the name and the definition so that
/// selection does not vary with traversal order.
pub trait DefinitionSelector {
    /// Returns `true` to keep the definition.
    fn select(&self, name: &str, definition: &ComponentDefinition) -> bool;
}

impl<F> DefinitionSelector for F
where
    F: Fn(&str, &ComponentDefinition) -> bool,
{
    fn select(&self, name: &str, definition: &ComponentDefinition) -> bool {
        self(name, definition)
    }
}

/// Drops the processors whose work happens at build time, plus
/// caller-supplied types.
#[derive(Debug, Clone)]
pub struct DefaultDefinitionSelector {
    excluded_names: HashSet<&'static str>,
    excluded_types: HashSet<String>,
}

impl DefaultDefinitionSelector {
    /// Creates a selector excluding the given fully-qualified type names.
    #[must_use]
    pub fn new(exclude_types: &[String]) -> Self {
        let excluded_names = [
            // Configuration processing is happening at build time.
            infrastructure::CONFIGURATION_ANNOTATION_PROCESSOR,
            infrastructure::CONFIGURATION_BEAN_NAME_GENERATOR,
            infrastructure::EVENT_LISTENER_PROCESSOR,
            infrastructure::EVENT_LISTENER_FACTORY,
            // Injection points are resolved at build time.
            infrastructure::AUTOWIRED_ANNOTATION_PROCESSOR,
            infrastructure::COMMON_ANNOTATION_PROCESSOR,
            infrastructure::CACHING_METADATA_READER_FACTORY,
        ]
        .into_iter()
        .collect();
        Self {
            excluded_names,
            excluded_types: exclude_types.iter().cloned().collect(),
        }
    }
}

impl Default for DefaultDefinitionSelector {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl DefinitionSelector for DefaultDefinitionSelector {
    fn select(&self, name: &str, definition: &ComponentDefinition) -> bool {
        !self.excluded_names.contains(name) && !self.excluded_types.contains(definition.user_type())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use aot_model::ResolvableType;

    #[test]
    fn excludes_build_time_processors() {
        let selector = DefaultDefinitionSelector::default();
        for (name, type_name) in infrastructure::DEFINITIONS {
            let def = ComponentDefinition::new(*name, ResolvableType::of(*type_name));
            assert!(!selector.select(name, &def), "{name} should be excluded");
        }
        let app = ComponentDefinition::new("app", ResolvableType::of("com.example.App"));
        assert!(selector.select("app", &app));
    }

    #[test]
    fn excludes_types_by_user_class() {
        let selector = DefaultDefinitionSelector::new(&["com.example.TestOnly".to_string()]);
        let enhanced = ComponentDefinition::new(
            "testOnly",
            ResolvableType::of("com.example.TestOnly$$EnhancerBySpringCGLIB$$abc"),
        );
        assert!(!selector.select("testOnly", &enhanced));
    }

    #[test]
    fn closures_are_selectors() {
        let only_a = |name: &str, _: &ComponentDefinition| name == "a";
        let def = ComponentDefinition::new("a", ResolvableType::of("com.example.A"));
        assert!(only_a.select("a", &def));
        assert!(!only_a.select("b", &def));
    }
}
