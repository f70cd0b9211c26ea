//! One context through the whole pipeline: load, select, resolve, synthesize.

use aot_model::TypeIndex;
use tracing::debug;

use crate::environment::Environment;
use crate::error::GenerationError;
use crate::loader::{ConfigurationSource, MetadataLoader};
use crate::options::AotOptions;
use crate::registry::NativeConfigurationRegistry;
use crate::resolver::InjectionResolver;
use crate::selector::DefaultDefinitionSelector;
use crate::synthesizer::{CodeSynthesizer, UnitId, UnitTree};

/// Outcome of processing one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedContext {
    /// Initializer unit of the context.
    pub unit: UnitId,
    /// Registration statements generated.
    pub definitions: usize,
}

/// Runs the pipeline for contexts whose units share one tree.
pub struct ContextProcessor<'a> {
    index: &'a TypeIndex,
    options: &'a AotOptions,
}

impl<'a> ContextProcessor<'a> {
    /// Creates a processor over `index`.
    #[must_use]
    pub fn new(index: &'a TypeIndex, options: &'a AotOptions) -> Self {
        Self { index, options }
    }

    /// Captures the graph of `source` under `environment`, drops excluded
    /// definitions, resolves the rest and adds an initializer named
    /// `class_name` to `tree`.
    ///
    /// # Errors
    ///
    /// Returns the first load, resolution, ambiguity or cycle failure.
    pub fn process(
        &self,
        source: &ConfigurationSource,
        environment: &Environment,
        tree: &mut UnitTree,
        parent: Option<UnitId>,
        class_name: &str,
        registry: &mut NativeConfigurationRegistry,
    ) -> Result<ProcessedContext, GenerationError> {
        let graph = MetadataLoader::new(self.index, environment, self.options).load(source)?;
        let selector = DefaultDefinitionSelector::new(&self.options.exclude_types);
        let selected = graph.select(&selector);
        debug!(
            captured = graph.len(),
            selected = selected.len(),
            class_name,
            "definition graph captured"
        );

        let package = tree.package().to_string();
        let resolved =
            InjectionResolver::new(self.index, &selected, environment, &package).resolve_all(registry)?;
        let definitions = resolved.len();
        let synthesizer =
            CodeSynthesizer::new(self.index, &package, self.options.statements_per_unit());
        let unit = synthesizer.synthesize(tree, parent, class_name, resolved, registry)?;
        Ok(ProcessedContext { unit, definitions })
    }
}
