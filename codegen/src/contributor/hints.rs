//! Native hints declared on compiled types.

use aot_model::{AccessBits, NativeHint, TypeIndex};
use tracing::debug;

use super::BootstrapContributor;
use crate::context::BuildContext;
use crate::error::GenerationError;
use crate::options::{AotOptions, AotPhase};
use crate::registry::NativeConfigurationRegistry;

/// Applies every active hint of the index to the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeHintsContributor;

impl BootstrapContributor for NativeHintsContributor {
    fn name(&self) -> &'static str {
        "native-hints"
    }

    fn supports_phase(&self, _phase: AotPhase) -> bool {
        true
    }

    fn contribute(&self, context: &mut BuildContext, options: &AotOptions) -> Result<(), GenerationError> {
        let mut applied = 0;
        for desc in context.index.iter() {
            for hint in &desc.hints {
                if apply_hint(&context.index, hint, options, &mut context.registry) {
                    applied += 1;
                } else {
                    debug!(declared_on = %desc.name, trigger = ?hint.trigger, "hint skipped");
                }
            }
        }
        debug!(applied, "native hints applied");
        Ok(())
    }
}

/// Applies one hint unless its trigger is absent or it touches a removed
/// subsystem. Returns `true` if the hint was applied.
pub fn apply_hint(
    index: &TypeIndex,
    hint: &NativeHint,
    options: &AotOptions,
    registry: &mut NativeConfigurationRegistry,
) -> bool {
    if hint.trigger.as_deref().is_some_and(|t| !index.is_present(t)) {
        return false;
    }
    if hint.referenced_types().any(|t| options.is_removed(t)) {
        return false;
    }

    for type_hint in &hint.types {
        for name in &type_hint.types {
            let access = if type_hint.access.is_empty() {
                AccessBits::inferred_for(name, index.kind_of(name))
            } else {
                type_hint.access
            };
            registry.request_reflection(name, access);
            for method in &type_hint.methods {
                registry.request_reflection_method(name, method.clone());
            }
            for field in &type_hint.fields {
                registry.request_reflection_field(name, field.clone());
            }
        }
    }
    for type_hint in &hint.jni_types {
        for name in &type_hint.types {
            let access = if type_hint.access.is_empty() {
                AccessBits::inferred_for(name, index.kind_of(name))
            } else {
                type_hint.access
            };
            registry.request_jni_reflection(name, access, &type_hint.methods, &type_hint.fields);
        }
    }
    for proxy in &hint.proxies {
        registry.request_proxy(&proxy.types);
    }
    for resource in &hint.resources {
        for pattern in &resource.patterns {
            registry.request_resource(pattern);
        }
        for bundle in &resource.bundles {
            registry.request_resource_bundle(bundle);
        }
    }
    for name in &hint.serializables {
        registry.request_serialization(name);
    }
    true
}
