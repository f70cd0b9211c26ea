//! Ahead-of-time bootstrap generator.
//!
//! Reads an application's compiled-type metadata, captures the definition
//! graph the container would build at startup, and writes Java initializers
//! that register every definition through direct constructor and factory
//! calls, together with the native-image descriptors the application needs.
//!
//! # Pipeline
//!
//! - [`loader`] captures the [`definition::DefinitionGraph`] under the real
//!   [`environment::Environment`].
//! - [`selector`] drops excluded and infrastructure definitions.
//! - [`resolver`] picks a construction strategy and resolves every injection
//!   point.
//! - [`synthesizer`] orders the statements and distributes them over units.
//! - [`registry`] accumulates reflection, proxy, resource and serialization
//!   needs and serializes them as descriptors.
//!
//! [`generator::BootstrapCodeGenerator`] drives the [`contributor`]s of a
//! phase and writes every output file.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod context;
pub mod contributor;
pub mod definition;
pub mod emit;
pub mod environment;
pub mod error;
pub mod generator;
pub mod loader;
pub mod options;
pub mod processor;
pub mod registry;
pub mod resolver;
pub mod selector;
pub mod synthesizer;

pub use context::{ApplicationStructure, BuildContext};
pub use error::{GenerationError, LoadError};
pub use generator::{BootstrapCodeGenerator, GenerationReport};
pub use options::{AotOptions, AotPhase, Mode};

/// Generates the `phase` source set of `structure` with the contributors
/// selected by `options`.
///
/// # Errors
///
/// Returns the first failure of the run; nothing written so far is valid.
pub fn generate(
    options: AotOptions,
    phase: AotPhase,
    structure: &ApplicationStructure,
) -> Result<GenerationReport, GenerationError> {
    BootstrapCodeGenerator::new(options).generate(phase, structure)
}
