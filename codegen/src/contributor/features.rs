//! Build arguments for removed subsystems.

use tracing::debug;

use super::BootstrapContributor;
use crate::context::{BuildContext, ResourceFile, NATIVE_CONFIG_PATH};
use crate::error::GenerationError;
use crate::options::{AotOptions, AotPhase, Mode};

/// File name of the native-image build arguments.
pub const NATIVE_IMAGE_PROPERTIES: &str = "native-image.properties";

/// Writes `native-image.properties` passing a system property for every
/// removed subsystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureFlagsContributor;

impl BootstrapContributor for FeatureFlagsContributor {
    fn name(&self) -> &'static str {
        "feature-flags"
    }

    fn supports_phase(&self, _phase: AotPhase) -> bool {
        true
    }

    fn contribute(&self, context: &mut BuildContext, options: &AotOptions) -> Result<(), GenerationError> {
        if options.mode != Mode::Native {
            return Ok(());
        }
        let Some(content) = native_image_properties(options) else {
            return Ok(());
        };
        let path = format!("{NATIVE_CONFIG_PATH}/{NATIVE_IMAGE_PROPERTIES}");
        debug!(path = %path, "feature flags");
        context.add_resource_file(ResourceFile { path, content });
        Ok(())
    }
}

/// Content of `native-image.properties`, or `None` if nothing is removed.
#[must_use]
pub fn native_image_properties(options: &AotOptions) -> Option<String> {
    let args: Vec<String> = options
        .removed_subsystems()
        .into_iter()
        .map(|s| format!("-D{}=true", s.flag()))
        .collect();
    if args.is_empty() {
        return None;
    }
    Some(format!("Args = {}\n", args.join(" \\\n       ")))
}
