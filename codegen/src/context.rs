//! Per-run build state shared by contributors.

use std::path::{Path, PathBuf};

use aot_model::properties::{self, AUTO_CONFIGURATION_KEY};
use aot_model::TypeIndex;
use tracing::debug;

use crate::environment::Environment;
use crate::error::{GenerationError, LoadError};
use crate::loader::detect_application_class;
use crate::options::{AotOptions, AotPhase};
use crate::registry::NativeConfigurationRegistry;

/// Directory of native-image descriptors, relative to the resources root.
pub const NATIVE_CONFIG_PATH: &str = "META-INF/native-image/org.springframework.aot/spring-aot";

/// Location of the factories file listing auto-configurations.
pub const FACTORIES_PATH: &str = "META-INF/spring.factories";

/// A generated Java compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Package of the class.
    pub package: String,
    /// Simple class name.
    pub class_name: String,
    /// Full source text.
    pub content: String,
}

impl SourceFile {
    /// Path of the file below a sources root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in self.package.split('.').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(format!("{}.java", self.class_name));
        path
    }
}

/// A generated resource, addressed by a `/`-separated relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    /// Path below the resources root.
    pub path: String,
    /// File content.
    pub content: String,
}

/// Where the application lives and where output goes.
#[derive(Debug, Clone, Default)]
pub struct ApplicationStructure {
    /// Root of generated sources.
    pub sources_path: PathBuf,
    /// Root of generated resources and descriptors.
    pub resources_path: PathBuf,
    /// Resource folders of the application.
    pub resource_folders: Vec<PathBuf>,
    /// Classes folders holding compiled-type metadata.
    pub classes_folders: Vec<PathBuf>,
    /// Main application class; detected when unset.
    pub application_class: Option<String>,
}

/// Everything one generation run accumulates.
#[derive(Debug)]
pub struct BuildContext {
    /// Phase being generated.
    pub phase: AotPhase,
    /// Compiled types of the application and its dependencies.
    pub index: TypeIndex,
    /// Base environment of the application.
    pub environment: Environment,
    /// Auto-configuration classes, in declared order.
    pub auto_configurations: Vec<String>,
    /// Native configuration requested so far.
    pub registry: NativeConfigurationRegistry,
    application_class: Option<String>,
    sources: Vec<SourceFile>,
    resources: Vec<ResourceFile>,
    definitions: usize,
    units: usize,
}

impl BuildContext {
    /// Creates a context from already loaded parts.
    #[must_use]
    pub fn new(phase: AotPhase, index: TypeIndex, environment: Environment) -> Self {
        Self {
            phase,
            index,
            environment,
            auto_configurations: Vec::new(),
            registry: NativeConfigurationRegistry::new(),
            application_class: None,
            sources: Vec::new(),
            resources: Vec::new(),
            definitions: 0,
            units: 0,
        }
    }

    /// Loads the type index, the environment and the auto-configuration list
    /// described by `structure`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::ConfigurationLoad`] if metadata, property or
    /// factories files cannot be read.
    pub fn load(
        phase: AotPhase,
        structure: &ApplicationStructure,
        options: &AotOptions,
    ) -> Result<Self, GenerationError> {
        let application = structure
            .application_class
            .clone()
            .unwrap_or_else(|| "the application".to_string());
        let wrap = |source: LoadError| GenerationError::ConfigurationLoad {
            application: application.clone(),
            source,
        };

        let index = TypeIndex::load(&structure.classes_folders).map_err(|e| wrap(e.into()))?;
        let environment =
            Environment::load(&structure.resource_folders, &options.properties).map_err(&wrap)?;
        let folders: Vec<&Path> = structure
            .resource_folders
            .iter()
            .chain(&structure.classes_folders)
            .map(PathBuf::as_path)
            .collect();
        let auto_configurations = read_auto_configurations(&folders).map_err(&wrap)?;
        debug!(
            types = index.len(),
            auto_configurations = auto_configurations.len(),
            "loaded build context"
        );

        let mut context =
            Self::new(phase, index, environment).with_auto_configurations(auto_configurations);
        context.application_class = structure.application_class.clone();
        Ok(context)
    }

    /// Sets the auto-configuration classes.
    #[must_use]
    pub fn with_auto_configurations(mut self, names: Vec<String>) -> Self {
        self.auto_configurations = names;
        self
    }

    /// The configured application class, or the single detected one.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ApplicationClassNotDetected`] if none is
    /// configured and detection is not conclusive.
    pub fn application_class(&self) -> Result<String, LoadError> {
        match &self.application_class {
            Some(name) => Ok(name.clone()),
            None => detect_application_class(&self.index),
        }
    }

    /// Queues a source file for writing.
    pub fn add_source_file(&mut self, file: SourceFile) {
        self.sources.push(file);
    }

    /// Queues a resource file for writing.
    pub fn add_resource_file(&mut self, file: ResourceFile) {
        self.resources.push(file);
    }

    /// Source files queued so far.
    #[must_use]
    pub fn source_files(&self) -> &[SourceFile] {
        &self.sources
    }

    /// Resource files queued so far.
    #[must_use]
    pub fn resource_files(&self) -> &[ResourceFile] {
        &self.resources
    }

    /// Counts generated definitions and units for the run report.
    pub fn record(&mut self, definitions: usize, units: usize) {
        self.definitions += definitions;
        self.units += units;
    }

    /// Definitions generated so far.
    #[must_use]
    pub fn definitions(&self) -> usize {
        self.definitions
    }

    /// Units generated so far.
    #[must_use]
    pub fn units(&self) -> usize {
        self.units
    }
}

/// Reads the auto-configuration entries of every factories file, first
/// occurrence wins.
fn read_auto_configurations(folders: &[&Path]) -> Result<Vec<String>, LoadError> {
    let mut names: Vec<String> = Vec::new();
    for folder in folders {
        let path = folder.join(FACTORIES_PATH);
        if !path.is_file() {
            continue;
        }
        let content = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        for name in properties::factory_names(&content, AUTO_CONFIGURATION_KEY) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn source_paths_follow_the_package() {
        let file = SourceFile {
            package: "com.example.app".into(),
            class_name: "ContextBootstrapInitializer".into(),
            content: String::new(),
        };
        assert_eq!(
            file.relative_path(),
            Path::new("com/example/app/ContextBootstrapInitializer.java")
        );
    }

    #[test]
    fn load_reads_factories_and_properties() {
        let resources = tempfile::tempdir().unwrap();
        let classes = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(resources.path().join("META-INF")).unwrap();
        std::fs::write(
            resources.path().join(FACTORIES_PATH),
            format!("{AUTO_CONFIGURATION_KEY}=\\\n  com.acme.AAutoConfiguration,\\\n  com.acme.BAutoConfiguration\n"),
        )
        .unwrap();
        std::fs::create_dir_all(classes.path().join("META-INF")).unwrap();
        std::fs::write(
            classes.path().join(FACTORIES_PATH),
            format!("{AUTO_CONFIGURATION_KEY}=com.acme.BAutoConfiguration,com.acme.CAutoConfiguration\n"),
        )
        .unwrap();
        std::fs::write(resources.path().join("application.properties"), "app.name=demo\n").unwrap();

        let structure = ApplicationStructure {
            resource_folders: vec![resources.path().to_path_buf()],
            classes_folders: vec![classes.path().to_path_buf()],
            ..ApplicationStructure::default()
        };
        let context = BuildContext::load(AotPhase::Main, &structure, &AotOptions::default()).unwrap();
        assert_eq!(
            context.auto_configurations,
            [
                "com.acme.AAutoConfiguration",
                "com.acme.BAutoConfiguration",
                "com.acme.CAutoConfiguration"
            ]
        );
        assert_eq!(context.environment.get_property("app.name"), Some("demo"));
        assert!(context.application_class().is_err());
    }
}
