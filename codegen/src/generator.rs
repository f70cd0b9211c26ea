//! The bootstrap generator driver.
//!
//! One call to [`BootstrapCodeGenerator::generate`] processes one source set:
//! it loads the build context, runs the contributors of the phase, registers
//! the application's resources, then writes sources, resources and native
//! descriptors. Any failure aborts the run.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::context::{ApplicationStructure, BuildContext, NATIVE_CONFIG_PATH};
use crate::contributor::ContributorRegistry;
use crate::error::GenerationError;
use crate::options::{AotOptions, AotPhase, Mode};
use crate::registry::descriptor;
use crate::registry::NativeConfigurationRegistry;

/// Report of what was generated.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Files written, in write order.
    pub files: Vec<PathBuf>,
    /// Registration statements generated.
    pub definitions: usize,
    /// Generated units (classes).
    pub units: usize,
}

/// Generates bootstrap code for one application.
pub struct BootstrapCodeGenerator {
    options: AotOptions,
    contributors: Option<ContributorRegistry>,
}

impl BootstrapCodeGenerator {
    /// Creates a generator running the contributors selected by `options`.
    #[must_use]
    pub fn new(options: AotOptions) -> Self {
        Self {
            options,
            contributors: None,
        }
    }

    /// Runs the given contributors instead of the configured ones.
    #[must_use]
    pub fn with_contributors(mut self, contributors: ContributorRegistry) -> Self {
        self.contributors = Some(contributors);
        self
    }

    /// Generates the `phase` source set of `structure`.
    ///
    /// # Errors
    ///
    /// Returns the first load, resolution, contributor or I/O failure.
    pub fn generate(
        &self,
        phase: AotPhase,
        structure: &ApplicationStructure,
    ) -> Result<GenerationReport, GenerationError> {
        let mut context = BuildContext::load(phase, structure, &self.options)?;
        let configured;
        let contributors = match &self.contributors {
            Some(contributors) => contributors,
            None => {
                configured = ContributorRegistry::for_options(&self.options)?;
                &configured
            }
        };
        for contributor in contributors.matching(phase) {
            debug!(contributor = contributor.name(), %phase, "running contributor");
            contributor.contribute(&mut context, &self.options)?;
        }

        register_resources(&structure.resource_folders, &mut context.registry)?;

        let mut report = GenerationReport {
            definitions: context.definitions(),
            units: context.units(),
            ..GenerationReport::default()
        };
        for source in context.source_files() {
            let path = structure.sources_path.join(source.relative_path());
            write_file(&path, &source.content)?;
            report.files.push(path);
        }
        for resource in context.resource_files() {
            let path = join_relative(&structure.resources_path, &resource.path);
            write_file(&path, &resource.content)?;
            report.files.push(path);
        }

        let descriptor_dir = join_relative(&structure.resources_path, NATIVE_CONFIG_PATH);
        std::fs::create_dir_all(&descriptor_dir)
            .map_err(|e| GenerationError::io(&descriptor_dir, e))?;
        if self.options.mode == Mode::Native {
            report
                .files
                .extend(descriptor::write_descriptors(&context.registry, &descriptor_dir)?);
        }

        info!(
            %phase,
            definitions = report.definitions,
            units = report.units,
            files = report.files.len(),
            "bootstrap generation complete"
        );
        Ok(report)
    }
}

/// Registers every file of the resource folders that no broad pattern covers.
/// Native-image configuration shipped with the application is left out.
fn register_resources(
    folders: &[PathBuf],
    registry: &mut NativeConfigurationRegistry,
) -> Result<(), GenerationError> {
    for folder in folders {
        if !folder.is_dir() {
            continue;
        }
        for entry in WalkDir::new(folder).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map_or_else(|| folder.clone(), Path::to_path_buf);
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("file system loop"));
                GenerationError::io(path, source)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(folder) else {
                continue;
            };
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if path.starts_with("META-INF/native-image") {
                continue;
            }
            if registry.request_resource_path(&path) {
                debug!(path = %path, "registered resource");
            }
        }
    }
    Ok(())
}

fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Writes a whole file, creating parent directories.
fn write_file(path: &Path, content: &str) -> Result<(), GenerationError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| GenerationError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| GenerationError::io(path, e))?;
    debug!(path = %path.display(), "wrote file");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn resources_are_registered_once_and_native_image_config_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for path in [
            "static/css/site.css",
            "templates/index.html",
            "META-INF/native-image/reflect-config.json",
            "application.properties",
        ] {
            let file = join_relative(root, path);
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(file, "x").unwrap();
        }
        let mut registry = NativeConfigurationRegistry::new();
        registry.request_resource("^static/.*");
        register_resources(&[root.to_path_buf()], &mut registry).unwrap();
        assert_eq!(
            registry.resource_patterns().iter().collect::<Vec<_>>(),
            ["^static/.*", "application.properties", "templates/index.html"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_resource_directories_fail_the_run() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("private");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::write(locked.join("secret.txt"), "x").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        let readable = std::fs::read_dir(&locked).is_ok();

        let result = register_resources(&[dir.path().to_path_buf()], &mut NativeConfigurationRegistry::new());
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            // Permissions are not enforced for this user.
            return;
        }
        match result {
            Err(GenerationError::Io { path, .. }) => assert_eq!(path, locked),
            other => unreachable!("expected an I/O failure, got {other:?}"),
        }
    }
}
