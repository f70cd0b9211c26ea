//! The application context of the main source set.

use aot_model::types::package_of;
use tracing::info;

use super::BootstrapContributor;
use crate::context::{BuildContext, SourceFile};
use crate::error::GenerationError;
use crate::loader::ConfigurationSource;
use crate::options::{AotOptions, AotPhase};
use crate::processor::ContextProcessor;
use crate::synthesizer::{CodeSynthesizer, UnitTree};

/// Class name of the generated application initializer.
pub const INITIALIZER_CLASS: &str = "ContextBootstrapInitializer";

/// Generates the initializer registering every definition of the
/// application context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationContextContributor;

impl BootstrapContributor for ApplicationContextContributor {
    fn name(&self) -> &'static str {
        "application-context"
    }

    fn supports_phase(&self, phase: AotPhase) -> bool {
        phase == AotPhase::Main
    }

    fn contribute(&self, context: &mut BuildContext, options: &AotOptions) -> Result<(), GenerationError> {
        let application = context
            .application_class()
            .map_err(|source| GenerationError::ConfigurationLoad {
                application: "the application".to_string(),
                source,
            })?;
        let package = options
            .package
            .clone()
            .unwrap_or_else(|| package_of(&application).to_string());

        let source = ConfigurationSource::new(
            vec![application.clone()],
            context.auto_configurations.clone(),
        );
        let mut tree = UnitTree::new(&package);
        let processed = ContextProcessor::new(&context.index, options).process(
            &source,
            &context.environment,
            &mut tree,
            None,
            INITIALIZER_CLASS,
            &mut context.registry,
        )?;

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
        context.record(processed.definitions, units);
        info!(
            application = %application,
            definitions = processed.definitions,
            units,
            "generated application context"
        );
        Ok(())
    }
}
