//! `aot-generate`: generates bootstrap sources, resources and native-image
//! descriptors for one source set of an application.
//!
//! **Outputs:**
//! - `<sources-out>/<package>/ContextBootstrapInitializer*.java`: main phase
//! - `<sources-out>/org/springframework/aot/TestContextBootstrapInitializer*.java`: test phase
//! - `<resources-out>/META-INF/native-image/org.springframework.aot/spring-aot/*.json`
//!
//! **Usage:**
//! ```text
//! aot-generate --sources-out <path> --resources-out <path> --classes <path[:path]>
//!              [--resources <path[:path]>] [--phase main|test] [--config aot.toml]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use aot_codegen::{generate, AotOptions, AotPhase, ApplicationStructure, Mode};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Generate ahead-of-time bootstrap code for an application.
#[derive(Parser)]
#[command(
    name = "aot-generate",
    about = "Generate reflection-free bootstrap code and native-image descriptors"
)]
struct Args {
    /// Deployment mode: `native` or `native-agent`.
    #[arg(long)]
    mode: Option<Mode>,
    /// Root directory of generated sources.
    #[arg(long)]
    sources_out: PathBuf,
    /// Root directory of generated resources.
    #[arg(long)]
    resources_out: PathBuf,
    /// Classes directories holding compiled-type metadata.
    #[arg(long, value_delimiter = ':', required = true)]
    classes: Vec<PathBuf>,
    /// Resource folders of the application.
    #[arg(long, value_delimiter = ':')]
    resources: Vec<PathBuf>,
    /// Test classes directories, added in the test phase.
    #[arg(long, value_delimiter = ':')]
    test_classes: Vec<PathBuf>,
    /// Main application class; detected when omitted.
    #[arg(long)]
    application_class: Option<String>,
    /// Source set to generate: `main` or `test`.
    #[arg(long, default_value = "main")]
    phase: AotPhase,
    /// TOML options file; flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Verbose diagnostics and debugger support.
    #[arg(long)]
    debug: bool,
    /// Port of the attachable debugger.
    #[arg(long)]
    debug_port: Option<u16>,
    /// Remove YAML support.
    #[arg(long)]
    remove_yaml: bool,
    /// Remove JMX support.
    #[arg(long)]
    remove_jmx: bool,
    /// Remove XML support.
    #[arg(long)]
    remove_xml: bool,
    /// Remove expression-language support.
    #[arg(long)]
    remove_spel: bool,
    /// Fully-qualified type whose definitions are excluded (repeatable).
    #[arg(long = "exclude-type")]
    exclude_types: Vec<String>,
    /// Property override as `key=value` (repeatable).
    #[arg(long = "property")]
    properties: Vec<String>,
    /// Package of the generated code.
    #[arg(long)]
    package: Option<String>,
    /// Statements per generated unit before forking.
    #[arg(long)]
    max_statements_per_unit: Option<usize>,
    /// Contributor to run (repeatable); all built-ins when omitted.
    #[arg(long = "contributor")]
    contributors: Vec<String>,
}

impl Args {
    /// Options from the config file, overridden by flags.
    fn options(&self) -> Result<AotOptions> {
        let mut options = match &self.config {
            Some(path) => AotOptions::load(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => AotOptions::default(),
        };
        if let Some(mode) = self.mode {
            options.mode = mode;
        }
        options.debug |= self.debug;
        if let Some(port) = self.debug_port {
            options.debug_port = port;
        }
        options.remove_yaml_support |= self.remove_yaml;
        options.remove_jmx_support |= self.remove_jmx;
        options.remove_xml_support |= self.remove_xml;
        options.remove_spel_support |= self.remove_spel;
        options.exclude_types.extend(self.exclude_types.iter().cloned());
        for property in &self.properties {
            let Some((key, value)) = property.split_once('=') else {
                bail!("Invalid property '{property}', expected key=value");
            };
            options
                .properties
                .insert(key.trim().to_string(), value.to_string());
        }
        if self.package.is_some() {
            options.package.clone_from(&self.package);
        }
        if let Some(max) = self.max_statements_per_unit {
            options.max_statements_per_unit = max;
        }
        if !self.contributors.is_empty() {
            options.contributors = Some(self.contributors.clone());
        }
        Ok(options)
    }

    fn structure(&self) -> ApplicationStructure {
        let mut classes_folders = self.classes.clone();
        if self.phase == AotPhase::Test {
            classes_folders.extend(self.test_classes.iter().cloned());
        }
        ApplicationStructure {
            sources_path: self.sources_out.clone(),
            resources_path: self.resources_out.clone(),
            resource_folders: self.resources.clone(),
            classes_folders,
            application_class: self.application_class.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let options = args.options()?;

    let default_level = if options.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    debug!(?options, "effective options");

    if options.debug {
        println!("Debugger argument: {}", options.debug_agent_argument());
    }
    println!(
        "Generating {} bootstrap ({} mode) from {} classes folder(s)",
        args.phase,
        options.mode,
        args.classes.len()
    );

    let report = generate(options, args.phase, &args.structure())
        .with_context(|| format!("Failed to generate the {} bootstrap", args.phase))?;

    println!(
        "Generated {} definitions in {} units",
        report.definitions, report.units
    );
    println!("Files written ({}):", report.files.len());
    for file in &report.files {
        println!("  {}", file.display());
    }

    println!("Generation complete.");
    Ok(())
}
