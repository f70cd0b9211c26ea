//! The native-configuration registry.
//!
//! Accumulates, for the whole generation run, what the generated code and
//! the application need from the native image at run time: reflective
//! access, JNI access, dynamic proxies, resources and serializable types.
//! Every request merges into what is already there; nothing is ever removed.

pub mod descriptor;

use std::collections::{BTreeMap, BTreeSet};

use aot_model::{AccessBits, FieldHint, MethodHint};
use regex::Regex;
use tracing::debug;

/// Access requested for one type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionEntry {
    /// Access bits, OR-ed across requests.
    pub access: AccessBits,
    /// Whitelisted methods; `<init>` for constructors.
    pub methods: BTreeSet<MethodHint>,
    /// Whitelisted fields, keyed by name.
    pub fields: BTreeMap<String, FieldHint>,
}

impl ReflectionEntry {
    fn merge_field(&mut self, field: FieldHint) {
        let entry = self
            .fields
            .entry(field.name.clone())
            .or_insert_with(|| FieldHint {
                name: field.name.clone(),
                allow_write: false,
            });
        entry.allow_write |= field.allow_write;
    }
}

/// Registered resource patterns and the broad-pattern cache.
#[derive(Debug, Default)]
struct Resources {
    patterns: BTreeSet<String>,
    bundles: BTreeSet<String>,
    broad: Vec<Regex>,
}

/// Cross-cutting runtime requirements of one generation run.
#[derive(Debug, Default)]
pub struct NativeConfigurationRegistry {
    reflection: BTreeMap<String, ReflectionEntry>,
    jni: BTreeMap<String, ReflectionEntry>,
    proxies: BTreeSet<Vec<String>>,
    resources: Resources,
    serialization: BTreeSet<String>,
}

impl NativeConfigurationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests reflective access to a type; bits are OR-ed with any
    /// previous request.
    pub fn request_reflection(&mut self, type_name: &str, access: AccessBits) {
        let entry = self.reflection.entry(type_name.to_string()).or_default();
        entry.access |= access;
        if access.contains(AccessBits::RESOURCE) {
            let path = format!("{}.class", type_name.replace('.', "/"));
            self.request_resource(&regex::escape(&path));
        }
    }

    /// Requests reflective invocation of one method (or constructor).
    pub fn request_reflection_method(&mut self, type_name: &str, method: MethodHint) {
        let entry = self.reflection.entry(type_name.to_string()).or_default();
        entry.access |= AccessBits::CLASS;
        entry.methods.insert(method);
    }

    /// Requests reflective access to one field.
    pub fn request_reflection_field(&mut self, type_name: &str, field: FieldHint) {
        let entry = self.reflection.entry(type_name.to_string()).or_default();
        entry.access |= AccessBits::CLASS;
        entry.merge_field(field);
    }

    /// Requests JNI access to a type.
    pub fn request_jni_reflection(
        &mut self,
        type_name: &str,
        access: AccessBits,
        methods: &[MethodHint],
        fields: &[FieldHint],
    ) {
        let entry = self.jni.entry(type_name.to_string()).or_default();
        entry.access |= access;
        entry.methods.extend(methods.iter().cloned());
        for field in fields {
            entry.merge_field(field.clone());
        }
    }

    /// Requests a dynamic proxy implementing `interfaces`, in that order.
    pub fn request_proxy(&mut self, interfaces: &[String]) {
        if !interfaces.is_empty() {
            self.proxies.insert(interfaces.to_vec());
        }
    }

    /// Requests every resource matching `pattern`.
    ///
    /// Patterns of the form `^prefix.*` also enter the broad-pattern cache
    /// consulted by [`NativeConfigurationRegistry::request_resource_path`].
    pub fn request_resource(&mut self, pattern: &str) {
        if !self.resources.patterns.insert(pattern.to_string()) {
            return;
        }
        if is_broad_pattern(pattern) {
            match Regex::new(&format!("^(?:{})$", pattern.trim_start_matches('^'))) {
                Ok(regex) => self.resources.broad.push(regex),
                Err(e) => debug!(pattern, error = %e, "resource pattern not cached"),
            }
        }
    }

    /// Requests one concrete resource path, unless an already registered
    /// broad pattern covers it. Returns `true` if the path was added.
    pub fn request_resource_path(&mut self, path: &str) -> bool {
        if self.is_covered(path) {
            debug!(path, "resource covered by a broader pattern");
            return false;
        }
        let before = self.resources.patterns.len();
        self.request_resource(path);
        self.resources.patterns.len() > before
    }

    /// Returns `true` if a cached broad pattern fully matches `path`.
    #[must_use]
    pub fn is_covered(&self, path: &str) -> bool {
        self.resources.broad.iter().any(|r| r.is_match(path))
    }

    /// Requests a resource bundle by base name.
    pub fn request_resource_bundle(&mut self, name: &str) {
        self.resources.bundles.insert(name.to_string());
    }

    /// Requests Java serialization support for a type.
    pub fn request_serialization(&mut self, type_name: &str) {
        self.serialization.insert(type_name.to_string());
    }

    /// Reflection entries, sorted by type name.
    #[must_use]
    pub fn reflection(&self) -> &BTreeMap<String, ReflectionEntry> {
        &self.reflection
    }

    /// JNI entries, sorted by type name.
    #[must_use]
    pub fn jni(&self) -> &BTreeMap<String, ReflectionEntry> {
        &self.jni
    }

    /// Proxy interface lists.
    #[must_use]
    pub fn proxies(&self) -> &BTreeSet<Vec<String>> {
        &self.proxies
    }

    /// Resource patterns.
    #[must_use]
    pub fn resource_patterns(&self) -> &BTreeSet<String> {
        &self.resources.patterns
    }

    /// Resource bundle names.
    #[must_use]
    pub fn resource_bundles(&self) -> &BTreeSet<String> {
        &self.resources.bundles
    }

    /// Serializable types.
    #[must_use]
    pub fn serialization(&self) -> &BTreeSet<String> {
        &self.serialization
    }

    /// Returns `true` if nothing at all was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reflection.is_empty()
            && self.jni.is_empty()
            && self.proxies.is_empty()
            && self.resources.patterns.is_empty()
            && self.resources.bundles.is_empty()
            && self.serialization.is_empty()
    }
}

/// Only the `^prefix.*` shape is recognized as broad.
fn is_broad_pattern(pattern: &str) -> bool {
    pattern.starts_with('^') && pattern.ends_with(".*")
}
