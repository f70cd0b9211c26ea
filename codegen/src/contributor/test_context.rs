//! Test contexts: one generated context per distinct test configuration.
//!
//! Test classes declaring the same configuration classes, inlined properties
//! and profiles share a context. Each context is an initializer below the
//! `TestContextBootstrapInitializer` root, which maps every test class to a
//! context loader for its initializer.

use aot_model::{TestContextDeclaration, TypeDescriptor};
use tracing::{debug, info};

use super::BootstrapContributor;
use crate::context::{BuildContext, SourceFile};
use crate::error::GenerationError;
use crate::loader::{source_short_name, ConfigurationSource};
use crate::options::{AotOptions, AotPhase};
use crate::processor::ContextProcessor;
use crate::synthesizer::{CodeSynthesizer, UnitKind, UnitTree};

/// Class name of the generated test root.
pub const TEST_ROOT_CLASS: &str = "TestContextBootstrapInitializer";

/// Package of the test root unless configured otherwise.
pub const DEFAULT_TEST_PACKAGE: &str = "org.springframework.aot";

/// Generates a context per group of equally configured test classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestContextContributor;

/// Test classes sharing one declaration, in name order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContextGroup {
    /// The shared declaration.
    pub declaration: TestContextDeclaration,
    /// Fully-qualified test class names.
    pub test_classes: Vec<String>,
}

impl TestContextGroup {
    /// Name of the group's initializer; `ordinal` numbers the groups with
    /// several test classes.
    #[must_use]
    pub fn class_name(&self, ordinal: usize) -> String {
        match self.test_classes.as_slice() {
            [single] => format!("{}ContextInitializer", source_short_name(single).replace('.', "_")),
            _ => format!("{TEST_ROOT_CLASS}{ordinal}"),
        }
    }

    /// Class documentation listing the test classes.
    #[must_use]
    pub fn javadoc(&self) -> String {
        let names: Vec<String> = self
            .test_classes
            .iter()
            .map(|c| format!("{{@code {}}}", source_short_name(c)))
            .collect();
        let listed = match names.as_slice() {
            [] => String::new(),
            [single] => single.clone(),
            [first, second] => format!("{first} and {second}"),
            [init @ .., last] => format!("{}, and {last}", init.join(", ")),
        };
        format!("AOT generated context for {listed}.")
    }
}

/// Groups the test classes of the index by identical declaration. Groups are
/// ordered by their first test class name.
#[must_use]
pub fn group_test_classes<'a>(types: impl Iterator<Item = &'a TypeDescriptor>) -> Vec<TestContextGroup> {
    let mut tests: Vec<(&str, &TestContextDeclaration)> = types
        .filter_map(|t| t.test_context.as_ref().map(|d| (t.name.as_str(), d)))
        .collect();
    tests.sort_by(|a, b| a.0.cmp(b.0));

    let mut groups: Vec<TestContextGroup> = Vec::new();
    for (name, declaration) in tests {
        match groups.iter_mut().find(|g| &g.declaration == declaration) {
            Some(group) => group.test_classes.push(name.to_string()),
            None => groups.push(TestContextGroup {
                declaration: declaration.clone(),
                test_classes: vec![name.to_string()],
            }),
        }
    }
    groups
}

impl BootstrapContributor for TestContextContributor {
    fn name(&self) -> &'static str {
        "test-context"
    }

    fn supports_phase(&self, phase: AotPhase) -> bool {
        phase == AotPhase::Test
    }

    fn contribute(&self, context: &mut BuildContext, options: &AotOptions) -> Result<(), GenerationError> {
        let groups = group_test_classes(context.index.iter());
        if groups.is_empty() {
            debug!("no test class declares a context");
            return Ok(());
        }

        let package = options
            .package
            .clone()
            .unwrap_or_else(|| DEFAULT_TEST_PACKAGE.to_string());
        let mut tree = UnitTree::new(&package);
        let root = tree.add(None, TEST_ROOT_CLASS, UnitKind::ContextLoaders { entries: Vec::new() });
        let processor = ContextProcessor::new(&context.index, options);

        let mut entries = Vec::new();
        let mut ordinal = 0;
        let mut definitions = 0;
        for group in &groups {
            let class_name = group.class_name(ordinal);
            if group.test_classes.len() > 1 {
                ordinal += 1;
            }
            let roots = if group.declaration.classes.is_empty() {
                vec![context.application_class().map_err(|source| {
                    GenerationError::ConfigurationLoad {
                        application: group.test_classes.join(", "),
                        source,
                    }
                })?]
            } else {
                group.declaration.classes.clone()
            };
            let environment = context
                .environment
                .with_inlined(&group.declaration.properties, &group.declaration.active_profiles)
                .map_err(|source| GenerationError::ConfigurationLoad {
                    application: group.test_classes.join(", "),
                    source,
                })?;
            let source = ConfigurationSource::new(roots, context.auto_configurations.clone());
            let processed = processor.process(
                &source,
                &environment,
                &mut tree,
                Some(root),
                &class_name,
                &mut context.registry,
            )?;
            tree.get_mut(processed.unit).javadoc = Some(group.javadoc());
            definitions += processed.definitions;
            entries.extend(group.test_classes.iter().map(|t| (t.clone(), processed.unit)));
            debug!(class_name = %class_name, tests = group.test_classes.len(), "generated test context");
        }
        tree.get_mut(root).kind = UnitKind::ContextLoaders { entries };

        let synthesizer =
            CodeSynthesizer::new(&context.index, &package, options.statements_per_unit());
        let rendered = synthesizer.render(&tree);
        let units = rendered.len();
        for (class_name, content) in rendered {
            context.add_source_file(SourceFile {
                package: package.clone(),
                class_name,
                content,
            });
        }
        context.record(definitions, units);
        info!(contexts = groups.len(), definitions, units, "generated test contexts");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_class(name: &str, classes: &[&str], profiles: &[&str]) -> TypeDescriptor {
        let mut desc = TypeDescriptor::class(name);
        desc.test_context = Some(TestContextDeclaration {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            properties: Vec::new(),
            active_profiles: profiles.iter().map(|p| p.to_string()).collect(),
        });
        desc
    }

    #[test]
    fn identical_declarations_share_a_group() {
        let types = [
            test_class("com.example.WebTests", &["com.example.App"], &[]),
            TypeDescriptor::class("com.example.App"),
            test_class("com.example.RepoTests", &["com.example.App"], &["it"]),
            test_class("com.example.ApiTests", &["com.example.App"], &[]),
        ];
        let groups = group_test_classes(types.iter());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].test_classes, ["com.example.ApiTests", "com.example.WebTests"]);
        assert_eq!(groups[1].test_classes, ["com.example.RepoTests"]);
        assert_eq!(groups[0].class_name(0), "TestContextBootstrapInitializer0");
        assert_eq!(groups[1].class_name(1), "RepoTestsContextInitializer");
    }

    #[test]
    fn javadoc_lists_every_test_class() {
        let group = |classes: &[&str]| TestContextGroup {
            declaration: TestContextDeclaration::default(),
            test_classes: classes.iter().map(|c| c.to_string()).collect(),
        };
        assert_eq!(
            group(&["a.A"]).javadoc(),
            "AOT generated context for {@code A}."
        );
        assert_eq!(
            group(&["a.A", "a.B"]).javadoc(),
            "AOT generated context for {@code A} and {@code B}."
        );
        assert_eq!(
            group(&["a.A", "a.B", "a.Outer$C"]).javadoc(),
            "AOT generated context for {@code A}, {@code B}, and {@code Outer.C}."
        );
    }
}
