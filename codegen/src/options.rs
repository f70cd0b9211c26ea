//! Generation options, phases and modes.
//!
//! [`AotOptions`] is passed explicitly to every stage of the pipeline. It is
//! read from an optional TOML file and then overridden by command-line flags.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default port of the attachable debugger.
pub const DEFAULT_DEBUG_PORT: u16 = 5005;

/// Default number of registration statements per generated unit.
pub const DEFAULT_MAX_STATEMENTS_PER_UNIT: usize = 200;

/// Deployment mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Full native image: sources, resources and descriptors.
    #[default]
    Native,
    /// Tracing-agent assisted build: descriptors are produced by the agent.
    NativeAgent,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Mode::Native),
            "native-agent" => Ok(Mode::NativeAgent),
            other => Err(format!(
                "unknown mode '{other}', expected 'native' or 'native-agent'"
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Native => "native",
            Mode::NativeAgent => "native-agent",
        })
    }
}

/// The source set being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AotPhase {
    /// Application sources.
    Main,
    /// Test sources.
    Test,
}

impl FromStr for AotPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(AotPhase::Main),
            "test" => Ok(AotPhase::Test),
            other => Err(format!("unknown phase '{other}', expected 'main' or 'test'")),
        }
    }
}

impl fmt::Display for AotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AotPhase::Main => "main",
            AotPhase::Test => "test",
        })
    }
}

/// Optional subsystem whose support can be removed from the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    /// YAML configuration files.
    Yaml,
    /// JMX management.
    Jmx,
    /// XML bean definitions and parsers.
    Xml,
    /// The expression language.
    Spel,
}

impl Subsystem {
    /// Package prefixes belonging to the subsystem.
    #[must_use]
    pub fn packages(self) -> &'static [&'static str] {
        match self {
            Subsystem::Yaml => &["org.yaml.snakeyaml."],
            Subsystem::Jmx => &["javax.management.", "org.springframework.jmx."],
            Subsystem::Xml => &[
                "javax.xml.",
                "org.w3c.dom.",
                "org.xml.sax.",
                "org.springframework.beans.factory.xml.",
            ],
            Subsystem::Spel => &["org.springframework.expression."],
        }
    }

    /// System property telling the runtime the subsystem is gone.
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Subsystem::Yaml => "spring.native.remove-yaml-support",
            Subsystem::Jmx => "spring.native.remove-jmx-support",
            Subsystem::Xml => "spring.native.remove-xml-support",
            Subsystem::Spel => "spring.native.remove-spel-support",
        }
    }
}

/// Error raised while reading an options file.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// The file could not be read.
    #[error("cannot read options file {path}")]
    Io {
        /// Path attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`AotOptions`].
    #[error("invalid options file {path}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Options shared by every stage of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AotOptions {
    /// Deployment mode; only [`Mode::Native`] writes descriptors.
    pub mode: Mode,
    /// Verbose diagnostics and debugger support.
    pub debug: bool,
    /// Port of the attachable debugger.
    pub debug_port: u16,
    /// Drop YAML support.
    pub remove_yaml_support: bool,
    /// Drop JMX support.
    pub remove_jmx_support: bool,
    /// Drop XML support.
    pub remove_xml_support: bool,
    /// Drop expression-language support.
    pub remove_spel_support: bool,
    /// Fully-qualified type names whose definitions are dropped.
    pub exclude_types: Vec<String>,
    /// Statements per generated unit before forking a new one.
    pub max_statements_per_unit: usize,
    /// Contributors to run, by name; all built-ins when unset.
    pub contributors: Option<Vec<String>>,
    /// Property overrides, highest precedence.
    pub properties: BTreeMap<String, String>,
    /// Package of the generated code; the application's package when unset.
    pub package: Option<String>,
}

impl Default for AotOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Native,
            debug: false,
            debug_port: DEFAULT_DEBUG_PORT,
            remove_yaml_support: false,
            remove_jmx_support: false,
            remove_xml_support: false,
            remove_spel_support: false,
            exclude_types: Vec::new(),
            max_statements_per_unit: DEFAULT_MAX_STATEMENTS_PER_UNIT,
            contributors: None,
            properties: BTreeMap::new(),
            package: None,
        }
    }
}

impl AotOptions {
    /// Parses options from TOML content.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the content does not describe valid options.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| OptionsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Subsystems whose support is removed, in a fixed order.
    #[must_use]
    pub fn removed_subsystems(&self) -> Vec<Subsystem> {
        [
            (self.remove_yaml_support, Subsystem::Yaml),
            (self.remove_jmx_support, Subsystem::Jmx),
            (self.remove_xml_support, Subsystem::Xml),
            (self.remove_spel_support, Subsystem::Spel),
        ]
        .into_iter()
        .filter_map(|(removed, s)| removed.then_some(s))
        .collect()
    }

    /// Returns `true` if the type belongs to a removed subsystem.
    #[must_use]
    pub fn is_removed(&self, type_name: &str) -> bool {
        self.removed_subsystems()
            .iter()
            .any(|s| s.packages().iter().any(|p| type_name.starts_with(p)))
    }

    /// JVM argument that opens the debugger on [`AotOptions::debug_port`].
    #[must_use]
    pub fn debug_agent_argument(&self) -> String {
        format!(
            "-agentlib:jdwp=transport=dt_socket,server=y,suspend=y,address=*:{}",
            self.debug_port
        )
    }

    /// Statement threshold, never below one.
    #[must_use]
    pub fn statements_per_unit(&self) -> usize {
        self.max_statements_per_unit.max(1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = AotOptions::default();
        assert_eq!(options.mode, Mode::Native);
        assert_eq!(options.debug_port, 5005);
        assert!(options.removed_subsystems().is_empty());
    }

    #[test]
    fn reads_kebab_case_toml() {
        let options = AotOptions::from_toml_str(
            r#"
            mode = "native-agent"
            remove-yaml-support = true
            exclude-types = ["com.example.TestOnly"]
            max-statements-per-unit = 10

            [properties]
            "server.port" = "9090"
            "#,
        )
        .unwrap();
        assert_eq!(options.mode, Mode::NativeAgent);
        assert_eq!(options.removed_subsystems(), vec![Subsystem::Yaml]);
        assert_eq!(options.exclude_types, ["com.example.TestOnly"]);
        assert_eq!(options.max_statements_per_unit, 10);
        assert_eq!(options.properties["server.port"], "9090");
        assert_eq!(options.debug_port, DEFAULT_DEBUG_PORT);
    }

    #[test]
    fn removed_subsystems_hide_their_packages() {
        let options = AotOptions {
            remove_spel_support: true,
            ..AotOptions::default()
        };
        assert!(options.is_removed("org.springframework.expression.spel.SpelParser"));
        assert!(!options.is_removed("org.yaml.snakeyaml.Yaml"));
    }

    #[test]
    fn parses_modes() {
        assert_eq!("native-agent".parse::<Mode>(), Ok(Mode::NativeAgent));
        assert!("jvm".parse::<Mode>().is_err());
        assert!(AotOptions::default()
            .debug_agent_argument()
            .ends_with("address=*:5005"));
    }
}
