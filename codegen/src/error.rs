//! Error types for every generation stage.

use std::fmt;
use std::path::PathBuf;

use aot_model::IndexError;

/// Failure while capturing an application's definition graph.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Compiled-type metadata could not be read.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// A property or factories file could not be read.
    #[error("cannot read {path}")]
    Io {
        /// Path attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// No application class was given and none could be detected.
    #[error("unable to find a single application class: {found} candidate(s) annotated as application entry point")]
    ApplicationClassNotDetected {
        /// Number of annotated types found.
        found: usize,
    },
    /// A referenced configuration or component class is not on the class path.
    #[error("class {name} referenced from {referenced_from} cannot be found")]
    ClassNotFound {
        /// Missing type.
        name: String,
        /// Element that referenced it.
        referenced_from: String,
    },
    /// Two definitions share a name and overriding is disabled.
    #[error(
        "invalid bean definition with name '{name}' defined by {replacement}: \
         there is already {existing} bound"
    )]
    DuplicateDefinition {
        /// Clashing name.
        name: String,
        /// Type of the registered definition.
        existing: String,
        /// Type of the rejected definition.
        replacement: String,
    },
    /// A condition referenced a placeholder that cannot be resolved.
    #[error("condition on {element} cannot be evaluated")]
    Condition {
        /// Element carrying the condition.
        element: String,
        /// Placeholder failure.
        #[source]
        source: PlaceholderError,
    },
}

/// A `${...}` placeholder without value or default.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not resolve placeholder '{placeholder}' in value \"{value}\"")]
pub struct PlaceholderError {
    /// The unresolvable key.
    pub placeholder: String,
    /// The full expression being resolved.
    pub value: String,
}

/// Why an injection point could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// No candidate of the required type exists.
    NoCandidate,
    /// The qualifier names no candidate of the required type.
    NoQualifiedCandidate(String),
    /// Several candidates remain after qualifier, primary and name narrowing.
    MultipleCandidates(Vec<String>),
    /// A value expression references a missing property.
    Placeholder(PlaceholderError),
    /// A value cannot be converted to the required type.
    InvalidValue(String),
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionFailure::NoCandidate => f.write_str("no qualifying bean"),
            ResolutionFailure::NoQualifiedCandidate(q) => {
                write!(f, "no qualifying bean named '{q}'")
            }
            ResolutionFailure::MultipleCandidates(names) => write!(
                f,
                "expected single matching bean but found {}: {}",
                names.len(),
                names.join(",")
            ),
            ResolutionFailure::Placeholder(e) => write!(f, "{e}"),
            ResolutionFailure::InvalidValue(v) => write!(f, "cannot convert value \"{v}\""),
        }
    }
}

/// A fatal generation failure. Every variant aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The configuration graph could not be captured.
    #[error("failed to load the configuration of {application}")]
    ConfigurationLoad {
        /// Root configuration class (or test context) being processed.
        application: String,
        /// Original failure.
        #[source]
        source: LoadError,
    },
    /// An injection point has zero or several candidates.
    #[error("error creating bean with name '{definition}': unsatisfied dependency expressed through {member}: {reason} of type '{required_type}'")]
    Resolution {
        /// Owning definition.
        definition: String,
        /// Member signature.
        member: String,
        /// Required type.
        required_type: String,
        /// Failure detail.
        reason: ResolutionFailure,
    },
    /// Several constructors or factory methods are equally eligible.
    #[error("error creating bean with name '{definition}': ambiguous construction of {type_name}, candidates: {}", candidates.join(", "))]
    AmbiguousConstruction {
        /// Owning definition.
        definition: String,
        /// Type being constructed.
        type_name: String,
        /// Signatures of the tied candidates.
        candidates: Vec<String>,
    },
    /// Definitions depend on each other in a cycle.
    #[error("requested beans are currently in creation, unresolvable circular reference between: {}", definitions.join(", "))]
    DependencyCycle {
        /// Definitions involved, in graph order.
        definitions: Vec<String>,
    },
    /// A contributor name does not match any known contributor.
    #[error("unknown bootstrap contributor '{name}'")]
    UnknownContributor {
        /// Configured name.
        name: String,
    },
    /// A directory or file could not be created or written.
    #[error("failed to write {path}")]
    Io {
        /// Path attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A descriptor could not be serialized.
    #[error("failed to serialize descriptor {path}")]
    Descriptor {
        /// Descriptor being written.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl GenerationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerationError::Io {
            path: path.into(),
            source,
        }
    }
}
