//! Bootstrap contributors.
//!
//! A contributor adds source files, resource files and native configuration
//! to a [`BuildContext`] for the phases it supports. The driver runs the
//! contributors of a [`ContributorRegistry`] in registration order; the
//! registry is built explicitly, from the built-ins or from configured names.

pub mod application;
pub mod features;
pub mod hints;
pub mod test_context;

use crate::context::BuildContext;
use crate::error::GenerationError;
use crate::options::{AotOptions, AotPhase};

pub use application::ApplicationContextContributor;
pub use features::FeatureFlagsContributor;
pub use hints::NativeHintsContributor;
pub use test_context::TestContextContributor;

/// A participant in bootstrap generation.
pub trait BootstrapContributor {
    /// Name used to select the contributor in configuration.
    fn name(&self) -> &'static str;

    /// Returns `true` if the contributor runs in `phase`.
    fn supports_phase(&self, phase: AotPhase) -> bool;

    /// Adds files and native configuration to `context`.
    ///
    /// # Errors
    ///
    /// Returns the failure that aborts the run.
    fn contribute(&self, context: &mut BuildContext, options: &AotOptions) -> Result<(), GenerationError>;
}

/// An ordered list of contributors.
#[derive(Default)]
pub struct ContributorRegistry {
    contributors: Vec<Box<dyn BootstrapContributor>>,
}

impl ContributorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in contributor.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for contributor in builtins() {
            registry.register(contributor);
        }
        registry
    }

    /// The built-in contributors named in `names`, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::UnknownContributor`] for a name that matches
    /// no built-in.
    pub fn from_names(names: &[String]) -> Result<Self, GenerationError> {
        let mut available: Vec<Option<Box<dyn BootstrapContributor>>> =
            builtins().into_iter().map(Some).collect();
        let mut registry = Self::new();
        for name in names {
            let slot = available
                .iter_mut()
                .find(|c| c.as_ref().is_some_and(|c| c.name() == name.as_str()));
            match slot.and_then(Option::take) {
                Some(contributor) => registry.register(contributor),
                None if registry.contains(name) => {}
                None => return Err(GenerationError::UnknownContributor { name: name.clone() }),
            }
        }
        Ok(registry)
    }

    /// Built-ins, or the configured subset when `options` names one.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::UnknownContributor`] for an unknown name.
    pub fn for_options(options: &AotOptions) -> Result<Self, GenerationError> {
        match &options.contributors {
            Some(names) => Self::from_names(names),
            None => Ok(Self::builtin()),
        }
    }

    /// Appends a contributor.
    pub fn register(&mut self, contributor: Box<dyn BootstrapContributor>) {
        self.contributors.push(contributor);
    }

    /// Returns `true` if a contributor with that name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.contributors.iter().any(|c| c.name() == name)
    }

    /// Contributors supporting `phase`, in registration order.
    pub fn matching(&self, phase: AotPhase) -> impl Iterator<Item = &dyn BootstrapContributor> {
        self.contributors
            .iter()
            .map(Box::as_ref)
            .filter(move |c| c.supports_phase(phase))
    }

    /// Names of every registered contributor.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.contributors.iter().map(|c| c.name()).collect()
    }
}

fn builtins() -> Vec<Box<dyn BootstrapContributor>> {
    vec![
        Box::new(ApplicationContextContributor),
        Box::new(TestContextContributor),
        Box::new(NativeHintsContributor),
        Box::new(FeatureFlagsContributor),
    ]
}
