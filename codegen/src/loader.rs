//! The metadata loader: captures the definition graph of an application
//! without instantiating anything.
//!
//! Configuration classes are parsed the way the container does during its
//! registration phase: conditions first, then the component scan, imports
//! and finally bean methods. User configuration is processed before
//! auto-configurations so that bean conditions on the latter observe the
//! user's definitions.

use std::collections::HashSet;

use aot_model::{annotations, types, Condition, ResolvableType, TypeDescriptor, TypeIndex};
use tracing::debug;

use crate::definition::{infrastructure, ComponentDefinition, DefinitionGraph, Origin, Role};
use crate::environment::Environment;
use crate::error::{GenerationError, LoadError};
use crate::options::AotOptions;

/// Property enabling definitions to replace earlier ones with the same name.
pub const ALLOW_OVERRIDING_PROPERTY: &str = "spring.main.allow-bean-definition-overriding";

/// Adjusts a captured definition before the graph is finalized.
pub trait DefinitionCustomizer {
    /// Customizes one definition.
    fn customize(&self, definition: &mut ComponentDefinition);
}

impl<F> DefinitionCustomizer for F
where
    F: Fn(&mut ComponentDefinition),
{
    fn customize(&self, definition: &mut ComponentDefinition) {
        self(definition);
    }
}

/// Entry points of one configuration to capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationSource {
    /// Root configuration classes, processed in order.
    pub roots: Vec<String>,
    /// Auto-configuration classes, processed after the roots.
    pub auto_configurations: Vec<String>,
}

impl ConfigurationSource {
    /// A configuration with the given roots and auto-configurations.
    #[must_use]
    pub fn new(roots: Vec<String>, auto_configurations: Vec<String>) -> Self {
        Self {
            roots,
            auto_configurations,
        }
    }

    fn describe(&self) -> String {
        self.roots.join(", ")
    }
}

/// Captures definition graphs from compiled-type metadata.
pub struct MetadataLoader<'a> {
    index: &'a TypeIndex,
    environment: &'a Environment,
    options: &'a AotOptions,
    customizers: Vec<Box<dyn DefinitionCustomizer + 'a>>,
}

struct LoadState {
    graph: DefinitionGraph,
    processed: HashSet<String>,
    allow_overriding: bool,
}

impl<'a> MetadataLoader<'a> {
    /// Creates a loader evaluating conditions against `environment`.
    #[must_use]
    pub fn new(index: &'a TypeIndex, environment: &'a Environment, options: &'a AotOptions) -> Self {
        Self {
            index,
            environment,
            options,
            customizers: Vec::new(),
        }
    }

    /// Adds a customizer applied to every captured definition.
    #[must_use]
    pub fn with_customizer(mut self, customizer: impl DefinitionCustomizer + 'a) -> Self {
        self.customizers.push(Box::new(customizer));
        self
    }

    /// Captures the definition graph of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::ConfigurationLoad`] with the underlying
    /// [`LoadError`] as its source if any part of the configuration cannot
    /// be evaluated.
    pub fn load(&self, source: &ConfigurationSource) -> Result<DefinitionGraph, GenerationError> {
        self.capture(source)
            .map_err(|e| GenerationError::ConfigurationLoad {
                application: source.describe(),
                source: e,
            })
    }

    fn capture(&self, source: &ConfigurationSource) -> Result<DefinitionGraph, LoadError> {
        let mut state = LoadState {
            graph: DefinitionGraph::new(),
            processed: HashSet::new(),
            allow_overriding: self
                .environment
                .get_property(ALLOW_OVERRIDING_PROPERTY)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
        };

        for (name, type_name) in infrastructure::DEFINITIONS {
            let mut definition =
                ComponentDefinition::new(*name, ResolvableType::of(*type_name));
            definition.role = Role::Infrastructure;
            definition.synthetic = true;
            state.graph.register(definition);
        }

        for root in &source.roots {
            let desc = self.require(root, "the application")?;
            self.process_configuration(desc, component_name(desc), &mut state)?;
        }
        for auto in &source.auto_configurations {
            match self.index.get(auto) {
                Some(desc) => self.process_configuration(desc, desc.name.clone(), &mut state)?,
                None => debug!(auto_configuration = %auto, "auto-configuration not on the class path"),
            }
        }

        for definition in state.graph.iter_mut() {
            for customizer in &self.customizers {
                customizer.customize(definition);
            }
        }
        debug!(
            application = %source.describe(),
            definitions = state.graph.len(),
            "captured definition graph"
        );
        Ok(state.graph)
    }

    fn require(&self, name: &str, referenced_from: &str) -> Result<&'a TypeDescriptor, LoadError> {
        self.index.get(name).ok_or_else(|| LoadError::ClassNotFound {
            name: name.to_string(),
            referenced_from: referenced_from.to_string(),
        })
    }

    fn process_configuration(
        &self,
        desc: &TypeDescriptor,
        bean_name: String,
        state: &mut LoadState,
    ) -> Result<(), LoadError> {
        if state.processed.contains(&desc.name) {
            return Ok(());
        }
        if !self.matches(&desc.conditions, &desc.name, &state.graph)? {
            debug!(class = %desc.name, "skipped by its conditions");
            return Ok(());
        }
        state.processed.insert(desc.name.clone());

        let mut definition = ComponentDefinition::new(bean_name.clone(), ResolvableType::of(&desc.name))
            .with_description(format!("class {}", desc.name));
        definition.primary = desc.primary;
        register(state, definition)?;

        if let Some(packages) = &desc.component_scan {
            let own = [desc.package().to_string()];
            let packages = if packages.is_empty() { &own[..] } else { &packages[..] };
            for package in packages {
                for candidate in self.index.in_package(package) {
                    // Auto-configurations are only ever imported through the
                    // factories list.
                    if !candidate.is_component()
                        || candidate.has_annotation(annotations::AUTO_CONFIGURATION)
                        || state.processed.contains(&candidate.name)
                    {
                        continue;
                    }
                    if candidate.is_configuration() {
                        self.process_configuration(candidate, component_name(candidate), state)?;
                    } else {
                        self.process_component(candidate, state)?;
                    }
                }
            }
        }

        for import in &desc.imports {
            let imported = self.require(import, &desc.name)?;
            self.process_configuration(imported, imported.name.clone(), state)?;
        }

        let mut seen_methods = HashSet::new();
        for method in desc.bean_methods() {
            // Overloads share one definition; the first declaration names it.
            if !seen_methods.insert(method.name.as_str()) {
                continue;
            }
            let Some(bean) = &method.bean else { continue };
            let element = format!("{}.{}", desc.name, method.name);
            if !self.matches(&bean.conditions, &element, &state.graph)? {
                debug!(method = %element, "bean method skipped by its conditions");
                continue;
            }
            let name = bean.name.clone().unwrap_or_else(|| method.name.clone());
            let mut definition = ComponentDefinition::new(name, method.return_type.clone())
                .with_origin(Origin::FactoryMethod {
                    declaring_type: desc.name.clone(),
                    factory_bean: (!method.is_static).then(|| bean_name.clone()),
                    method: method.name.clone(),
                })
                .with_description(format!("factory method {element}"));
            definition.primary = bean.primary;
            register(state, definition)?;
        }
        Ok(())
    }

    fn process_component(
        &self,
        desc: &TypeDescriptor,
        state: &mut LoadState,
    ) -> Result<(), LoadError> {
        if !self.matches(&desc.conditions, &desc.name, &state.graph)? {
            debug!(class = %desc.name, "component skipped by its conditions");
            return Ok(());
        }
        state.processed.insert(desc.name.clone());
        let mut definition = ComponentDefinition::new(component_name(desc), ResolvableType::of(&desc.name))
            .with_description(format!("scanned component {}", desc.name));
        definition.primary = desc.primary;
        register(state, definition)
    }

    fn matches(
        &self,
        conditions: &[Condition],
        element: &str,
        graph: &DefinitionGraph,
    ) -> Result<bool, LoadError> {
        for condition in conditions {
            if !self.evaluate(condition, element, graph)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn evaluate(
        &self,
        condition: &Condition,
        element: &str,
        graph: &DefinitionGraph,
    ) -> Result<bool, LoadError> {
        let present = |name: &String| self.index.is_present(name) && !self.options.is_removed(name);
        Ok(match condition {
            Condition::OnProperty {
                name,
                having_value,
                match_if_missing,
            } => {
                let value = self
                    .environment
                    .resolved_property(name)
                    .map_err(|source| LoadError::Condition {
                        element: element.to_string(),
                        source,
                    })?;
                match (value, having_value) {
                    (None, _) => *match_if_missing,
                    (Some(v), Some(expected)) => v.trim().eq_ignore_ascii_case(expected),
                    (Some(v), None) => !v.trim().eq_ignore_ascii_case("false"),
                }
            }
            Condition::OnProfile(profiles) => self.environment.accepts_profiles(profiles),
            Condition::OnClass(names) => names.iter().all(present),
            Condition::OnMissingClass(names) => !names.iter().any(present),
            Condition::OnBean(type_name) => graph.has_candidate(self.index, type_name),
            Condition::OnMissingBean(type_name) => !graph.has_candidate(self.index, type_name),
        })
    }
}

fn register(state: &mut LoadState, definition: ComponentDefinition) -> Result<(), LoadError> {
    if let Some(existing) = state.graph.get(&definition.name) {
        if !state.allow_overriding {
            return Err(LoadError::DuplicateDefinition {
                name: definition.name.clone(),
                existing: existing.bean_type.to_string(),
                replacement: definition.bean_type.to_string(),
            });
        }
        debug!(name = %definition.name, "overriding definition");
    }
    state.graph.register(definition);
    Ok(())
}

/// Default name of a scanned component or application class: the explicit
/// name, or the decapitalized short class name.
#[must_use]
pub fn component_name(desc: &TypeDescriptor) -> String {
    if let Some(name) = &desc.bean_name {
        return name.clone();
    }
    let package = desc.package();
    let short = if package.is_empty() {
        desc.name.as_str()
    } else {
        &desc.name[package.len() + 1..]
    };
    decapitalize(&short.replace('$', "."))
}

/// Lower-cases the first character unless the first two are upper case.
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a.is_uppercase() && b.is_uppercase() => name.to_string(),
        (Some(a), _) => a.to_lowercase().chain(name.chars().skip(1)).collect(),
        (None, _) => String::new(),
    }
}

/// Finds the single type annotated as the application entry point.
///
/// # Errors
///
/// Returns [`LoadError::ApplicationClassNotDetected`] unless exactly one
/// candidate exists.
pub fn detect_application_class(index: &TypeIndex) -> Result<String, LoadError> {
    let candidates: Vec<&str> = index
        .iter()
        .filter(|t| t.has_annotation(annotations::SPRING_BOOT_APPLICATION))
        .map(|t| t.name.as_str())
        .collect();
    match candidates.as_slice() {
        [single] => Ok((*single).to_string()),
        other => Err(LoadError::ApplicationClassNotDetected { found: other.len() }),
    }
}

/// Short name of a type as written in source: `Outer.Inner`.
#[must_use]
pub fn source_short_name(name: &str) -> String {
    let package = types::package_of(name);
    let short = if package.is_empty() {
        name
    } else {
        &name[package.len() + 1..]
    };
    short.replace('$', ".")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::environment::PropertySource;
    use aot_model::{BeanDeclaration, MethodDescriptor};

    fn app(name: &str) -> TypeDescriptor {
        let mut desc = TypeDescriptor::class(name);
        desc.annotations = vec![annotations::SPRING_BOOT_APPLICATION.into()];
        desc.component_scan = Some(Vec::new());
        desc
    }

    fn component(name: &str) -> TypeDescriptor {
        let mut desc = TypeDescriptor::class(name);
        desc.annotations = vec![annotations::COMPONENT.into()];
        desc
    }

    fn bean_method(name: &str, return_type: &str) -> MethodDescriptor {
        MethodDescriptor {
            name: name.into(),
            return_type: ResolvableType::of(return_type),
            bean: Some(BeanDeclaration::default()),
            ..MethodDescriptor::default()
        }
    }

    fn env(entries: &[(&str, &str)]) -> Environment {
        Environment::new(vec![PropertySource::new(
            "test",
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )])
    }

    fn load(index: &TypeIndex, env: &Environment, source: ConfigurationSource) -> Result<DefinitionGraph, GenerationError> {
        let options = AotOptions::default();
        let result = MetadataLoader::new(index, env, &options).load(&source);
        result
    }

    fn application_names(graph: &DefinitionGraph) -> Vec<&str> {
        graph
            .iter()
            .filter(|d| d.role == Role::Application)
            .map(|d| d.name.as_str())
            .collect()
    }

    #[test]
    fn captures_scanned_components_and_bean_methods() {
        let mut root = app("com.example.DemoApplication");
        root.methods = vec![bean_method("clock", "java.time.Clock")];
        let index = TypeIndex::from_types([
            root,
            component("com.example.web.GreetingController"),
            component("com.other.Ignored"),
        ]);
        let graph = load(
            &index,
            &env(&[]),
            ConfigurationSource::new(vec!["com.example.DemoApplication".into()], Vec::new()),
        )
        .unwrap();

        assert_eq!(
            application_names(&graph),
            ["demoApplication", "greetingController", "clock"]
        );
        assert_eq!(
            graph.get("clock").unwrap().origin,
            Origin::FactoryMethod {
                declaring_type: "com.example.DemoApplication".into(),
                factory_bean: Some("demoApplication".into()),
                method: "clock".into(),
            }
        );
        assert!(graph.contains(infrastructure::AUTOWIRED_ANNOTATION_PROCESSOR));
    }

    #[test]
    fn conditions_use_the_target_environment() {
        let mut feature = TypeDescriptor::class("com.example.FeatureConfiguration");
        feature.annotations = vec![annotations::AUTO_CONFIGURATION.into()];
        feature.conditions = vec![Condition::OnProperty {
            name: "feature.enabled".into(),
            having_value: Some("true".into()),
            match_if_missing: false,
        }];
        feature.methods = vec![bean_method("feature", "com.example.Feature")];
        let index = TypeIndex::from_types([app("com.example.App"), feature]);
        let source = ConfigurationSource::new(
            vec!["com.example.App".into()],
            vec!["com.example.FeatureConfiguration".into()],
        );

        let off = load(&index, &env(&[]), source.clone()).unwrap();
        assert!(!off.contains("feature"));
        let on = load(&index, &env(&[("feature.enabled", "true")]), source).unwrap();
        assert!(on.contains("com.example.FeatureConfiguration"));
        assert!(on.contains("feature"));
    }

    #[test]
    fn auto_configuration_backs_off_from_user_beans() {
        let mut root = app("com.example.App");
        root.methods = vec![bean_method("myMapper", "com.example.Mapper")];
        let mut auto = TypeDescriptor::class("com.example.MapperAutoConfiguration");
        let mut method = bean_method("defaultMapper", "com.example.Mapper");
        if let Some(bean) = method.bean.as_mut() {
            bean.conditions = vec![Condition::OnMissingBean("com.example.Mapper".into())];
        }
        auto.methods = vec![method];
        let index = TypeIndex::from_types([root, auto, TypeDescriptor::class("com.example.Mapper")]);

        let graph = load(
            &index,
            &env(&[]),
            ConfigurationSource::new(
                vec!["com.example.App".into()],
                vec!["com.example.MapperAutoConfiguration".into()],
            ),
        )
        .unwrap();
        assert!(graph.contains("myMapper"));
        assert!(!graph.contains("defaultMapper"));
    }

    #[test]
    fn duplicate_names_fail_unless_overriding_is_allowed() {
        let mut root = app("com.example.App");
        root.methods = vec![bean_method("service", "com.example.Service")];
        let mut other = TypeDescriptor::class("com.example.Other");
        other.methods = vec![bean_method("service", "com.example.Service")];
        root.imports = vec!["com.example.Other".into()];
        let index = TypeIndex::from_types([root, other]);
        let source = ConfigurationSource::new(vec!["com.example.App".into()], Vec::new());

        let err = load(&index, &env(&[]), source.clone()).unwrap_err();
        match err {
            GenerationError::ConfigurationLoad { application, source } => {
                assert_eq!(application, "com.example.App");
                assert!(matches!(source, LoadError::DuplicateDefinition { ref name, .. } if name == "service"));
            }
            other => unreachable!("unexpected error {other:?}"),
        }
        assert!(load(&index, &env(&[(ALLOW_OVERRIDING_PROPERTY, "true")]), source).is_ok());
    }

    #[test]
    fn missing_import_is_a_load_failure() {
        let mut root = app("com.example.App");
        root.imports = vec!["com.example.Missing".into()];
        let index = TypeIndex::from_types([root]);
        let err = load(
            &index,
            &env(&[]),
            ConfigurationSource::new(vec!["com.example.App".into()], Vec::new()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("com.example.App"));
    }

    #[test]
    fn customizers_adjust_captured_definitions() {
        let index = TypeIndex::from_types([app("com.example.App")]);
        let environment = env(&[]);
        let options = AotOptions::default();
        let graph = MetadataLoader::new(&index, &environment, &options)
            .with_customizer(|d: &mut ComponentDefinition| {
                if d.name == "app" {
                    d.primary = true;
                }
            })
            .load(&ConfigurationSource::new(vec!["com.example.App".into()], Vec::new()))
            .unwrap();
        assert!(graph.get("app").unwrap().primary);
    }

    #[test]
    fn names_follow_container_conventions() {
        assert_eq!(component_name(&TypeDescriptor::class("com.example.URLFetcher")), "URLFetcher");
        assert_eq!(component_name(&TypeDescriptor::class("com.example.Outer$Inner")), "outer.Inner");
        assert_eq!(source_short_name("com.example.Outer$Inner"), "Outer.Inner");
    }

    #[test]
    fn detects_a_single_application_class() {
        let index = TypeIndex::from_types([app("com.example.App"), component("com.example.A")]);
        assert_eq!(detect_application_class(&index).unwrap(), "com.example.App");
        let none = TypeIndex::from_types([component("com.example.A")]);
        assert!(matches!(
            detect_application_class(&none),
            Err(LoadError::ApplicationClassNotDetected { found: 0 })
        ));
    }
}
