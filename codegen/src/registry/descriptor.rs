//! Descriptor serialization in the native-image JSON format.

use std::path::{Path, PathBuf};

use aot_model::AccessBits;
use serde::Serialize;
use tracing::debug;

use super::{NativeConfigurationRegistry, ReflectionEntry};
use crate::error::GenerationError;

/// Reflection descriptor file name.
pub const REFLECT_CONFIG: &str = "reflect-config.json";
/// JNI descriptor file name.
pub const JNI_CONFIG: &str = "jni-config.json";
/// Proxy descriptor file name.
pub const PROXY_CONFIG: &str = "proxy-config.json";
/// Resource descriptor file name.
pub const RESOURCE_CONFIG: &str = "resource-config.json";
/// Serialization descriptor file name.
pub const SERIALIZATION_CONFIG: &str = "serialization-config.json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReflectionDescriptor<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "is_false")]
    all_declared_constructors: bool,
    #[serde(skip_serializing_if = "is_false")]
    all_public_constructors: bool,
    #[serde(skip_serializing_if = "is_false")]
    all_declared_methods: bool,
    #[serde(skip_serializing_if = "is_false")]
    all_public_methods: bool,
    #[serde(skip_serializing_if = "is_false")]
    all_declared_fields: bool,
    #[serde(skip_serializing_if = "is_false")]
    all_public_fields: bool,
    #[serde(skip_serializing_if = "is_false")]
    query_all_declared_methods: bool,
    #[serde(skip_serializing_if = "is_false")]
    query_all_public_methods: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    methods: Vec<MethodDescriptor<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldDescriptor<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MethodDescriptor<'a> {
    name: &'a str,
    parameter_types: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldDescriptor<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "is_false")]
    allow_write: bool,
}

#[derive(Serialize)]
struct ProxyDescriptor<'a> {
    interfaces: &'a [String],
}

#[derive(Serialize)]
struct ResourceDescriptor<'a> {
    resources: ResourceIncludes<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bundles: Vec<NameDescriptor<'a>>,
}

#[derive(Serialize)]
struct ResourceIncludes<'a> {
    includes: Vec<PatternDescriptor<'a>>,
}

#[derive(Serialize)]
struct PatternDescriptor<'a> {
    pattern: &'a str,
}

#[derive(Serialize)]
struct NameDescriptor<'a> {
    name: &'a str,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

fn reflection_descriptor<'a>(name: &'a str, entry: &'a ReflectionEntry) -> ReflectionDescriptor<'a> {
    let access = entry.access;
    ReflectionDescriptor {
        name,
        all_declared_constructors: access.contains(AccessBits::DECLARED_CONSTRUCTORS),
        all_public_constructors: access.contains(AccessBits::PUBLIC_CONSTRUCTORS),
        all_declared_methods: access.contains(AccessBits::DECLARED_METHODS),
        all_public_methods: access.contains(AccessBits::PUBLIC_METHODS),
        all_declared_fields: access.contains(AccessBits::DECLARED_FIELDS),
        all_public_fields: access.contains(AccessBits::PUBLIC_FIELDS),
        query_all_declared_methods: access.contains(AccessBits::QUERY_DECLARED_METHODS),
        query_all_public_methods: access.contains(AccessBits::QUERY_PUBLIC_METHODS),
        methods: entry
            .methods
            .iter()
            .map(|m| MethodDescriptor {
                name: &m.name,
                parameter_types: &m.parameter_types,
            })
            .collect(),
        fields: entry
            .fields
            .values()
            .map(|f| FieldDescriptor {
                name: &f.name,
                allow_write: f.allow_write,
            })
            .collect(),
    }
}

/// Renders every non-empty descriptor as `(file name, content)`, in a fixed
/// order. Empty categories produce nothing.
///
/// # Errors
///
/// Returns [`GenerationError::Descriptor`] if serialization fails.
pub fn render(
    registry: &NativeConfigurationRegistry,
) -> Result<Vec<(&'static str, String)>, GenerationError> {
    let mut rendered = Vec::new();

    if !registry.reflection().is_empty() {
        let entries: Vec<_> = registry
            .reflection()
            .iter()
            .map(|(name, entry)| reflection_descriptor(name, entry))
            .collect();
        rendered.push((REFLECT_CONFIG, to_json(REFLECT_CONFIG, &entries)?));
    }
    if !registry.jni().is_empty() {
        let entries: Vec<_> = registry
            .jni()
            .iter()
            .map(|(name, entry)| reflection_descriptor(name, entry))
            .collect();
        rendered.push((JNI_CONFIG, to_json(JNI_CONFIG, &entries)?));
    }
    if !registry.proxies().is_empty() {
        let entries: Vec<_> = registry
            .proxies()
            .iter()
            .map(|interfaces| ProxyDescriptor { interfaces })
            .collect();
        rendered.push((PROXY_CONFIG, to_json(PROXY_CONFIG, &entries)?));
    }
    if !registry.resource_patterns().is_empty() || !registry.resource_bundles().is_empty() {
        let descriptor = ResourceDescriptor {
            resources: ResourceIncludes {
                includes: registry
                    .resource_patterns()
                    .iter()
                    .map(|pattern| PatternDescriptor { pattern })
                    .collect(),
            },
            bundles: registry
                .resource_bundles()
                .iter()
                .map(|name| NameDescriptor { name })
                .collect(),
        };
        rendered.push((RESOURCE_CONFIG, to_json(RESOURCE_CONFIG, &descriptor)?));
    }
    if !registry.serialization().is_empty() {
        let entries: Vec<_> = registry
            .serialization()
            .iter()
            .map(|name| NameDescriptor { name })
            .collect();
        rendered.push((SERIALIZATION_CONFIG, to_json(SERIALIZATION_CONFIG, &entries)?));
    }
    Ok(rendered)
}

/// Writes every non-empty descriptor into `dir` and returns the written
/// paths.
///
/// # Errors
///
/// Returns an error if a descriptor cannot be serialized or written.
pub fn write_descriptors(
    registry: &NativeConfigurationRegistry,
    dir: &Path,
) -> Result<Vec<PathBuf>, GenerationError> {
    let mut written = Vec::new();
    for (file_name, content) in render(registry)? {
        let path = dir.join(file_name);
        std::fs::write(&path, content).map_err(|e| GenerationError::io(&path, e))?;
        debug!(path = %path.display(), "wrote descriptor");
        written.push(path);
    }
    Ok(written)
}

fn to_json<T: Serialize>(file_name: &str, value: &T) -> Result<String, GenerationError> {
    let mut json = serde_json::to_string_pretty(value).map_err(|source| GenerationError::Descriptor {
        path: PathBuf::from(file_name),
        source,
    })?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use aot_model::{FieldHint, MethodHint};

    fn rendered(registry: &NativeConfigurationRegistry, file: &str) -> serde_json::Value {
        let all = render(registry).unwrap();
        let (_, content) = all.iter().find(|(name, _)| *name == file).unwrap();
        assert!(content.ends_with('\n'));
        serde_json::from_str(content).unwrap()
    }

    #[test]
    fn empty_registry_renders_nothing() {
        assert!(render(&NativeConfigurationRegistry::new()).unwrap().is_empty());
    }

    #[test]
    fn reflection_entries_use_native_image_field_names() {
        let mut registry = NativeConfigurationRegistry::new();
        registry.request_reflection("com.example.B", AccessBits::LOAD_AND_CONSTRUCT);
        registry.request_reflection_field(
            "com.example.A",
            FieldHint {
                name: "repo".into(),
                allow_write: true,
            },
        );
        registry.request_reflection_method(
            "com.example.A",
            MethodHint {
                name: "<init>".into(),
                parameter_types: vec!["com.example.Repo".into()],
            },
        );

        let json = rendered(&registry, REFLECT_CONFIG);
        assert_eq!(
            json,
            serde_json::json!([
                {
                    "name": "com.example.A",
                    "methods": [{"name": "<init>", "parameterTypes": ["com.example.Repo"]}],
                    "fields": [{"name": "repo", "allowWrite": true}]
                },
                {"name": "com.example.B", "allDeclaredConstructors": true}
            ])
        );
    }

    #[test]
    fn resources_proxies_and_serialization() {
        let mut registry = NativeConfigurationRegistry::new();
        registry.request_resource("^static/.*");
        registry.request_resource_bundle("messages");
        registry.request_proxy(&["com.example.Api".to_string(), "java.io.Serializable".to_string()]);
        registry.request_serialization("java.util.ArrayList");

        assert_eq!(
            rendered(&registry, RESOURCE_CONFIG),
            serde_json::json!({
                "resources": {"includes": [{"pattern": "^static/.*"}]},
                "bundles": [{"name": "messages"}]
            })
        );
        assert_eq!(
            rendered(&registry, PROXY_CONFIG),
            serde_json::json!([{"interfaces": ["com.example.Api", "java.io.Serializable"]}])
        );
        assert_eq!(
            rendered(&registry, SERIALIZATION_CONFIG),
            serde_json::json!([{"name": "java.util.ArrayList"}])
        );
        assert!(render(&registry).unwrap().iter().all(|(name, _)| *name != JNI_CONFIG));
    }

    #[test]
    fn writes_one_file_per_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = NativeConfigurationRegistry::new();
        registry.request_serialization("java.lang.String");
        let written = write_descriptors(&registry, dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join(SERIALIZATION_CONFIG)]);
        assert!(!dir.path().join(REFLECT_CONFIG).exists());
    }
}
