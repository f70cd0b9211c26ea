//! The target environment: property sources, active profiles and placeholder
//! resolution.
//!
//! Conditions and value injection points are evaluated against this
//! environment at generation time, so the captured graph matches what a
//! runtime boot with the same property sources would produce.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use aot_model::properties;

use crate::error::{LoadError, PlaceholderError};

/// Property listing the active profiles.
pub const ACTIVE_PROFILES_PROPERTY: &str = "spring.profiles.active";

/// Profile considered active when none is set.
pub const DEFAULT_PROFILE: &str = "default";

const MAX_PLACEHOLDER_DEPTH: usize = 32;

/// A named, ordered set of properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
    /// Descriptive name, e.g. the file it was read from.
    pub name: String,
    entries: Vec<(String, String)>,
}

impl PropertySource {
    /// Creates a source from key/value pairs; later duplicates win.
    pub fn new(name: impl Into<String>, entries: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Returns the value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if the source has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Property sources in precedence order plus the active profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    sources: Vec<PropertySource>,
    active_profiles: Vec<String>,
    /// Sources above every property file, highest first.
    leading: Vec<PropertySource>,
    resource_folders: Vec<PathBuf>,
}

impl Environment {
    /// Creates an environment from sources, highest precedence first.
    /// Active profiles are read from the sources.
    #[must_use]
    pub fn new(sources: Vec<PropertySource>) -> Self {
        let mut env = Self {
            sources,
            ..Self::default()
        };
        env.active_profiles = env.profiles_from_properties();
        env
    }

    /// Builds the environment of an application.
    ///
    /// Precedence, highest first: `overrides`, then
    /// `application-{profile}.properties` for each active profile (the last
    /// listed profile wins), then `application.properties`. Files are read
    /// from every resource folder, earlier folders first.
    ///
    /// # Errors
    ///
    /// Returns an error if a property file exists but cannot be read.
    pub fn load(
        resource_folders: &[PathBuf],
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self, LoadError> {
        let override_source = PropertySource::new(
            "commandLineOverrides",
            overrides
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        Self::assemble(resource_folders, vec![override_source], &[])
    }

    /// Derives an environment with inlined `key=value` properties at the
    /// highest precedence and additional active profiles.
    ///
    /// Profile files are read again from the resource folders, so profiles
    /// activated by `profiles` or by an inlined `spring.profiles.active`
    /// contribute their `application-{profile}.properties`.
    ///
    /// # Errors
    ///
    /// Returns an error if a property file exists but cannot be read.
    pub fn with_inlined(&self, inlined: &[String], profiles: &[String]) -> Result<Self, LoadError> {
        let entries = inlined
            .iter()
            .map(|p| match p.split_once(['=', ':']) {
                Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
                None => (p.trim().to_string(), String::new()),
            })
            .collect();
        let mut leading = vec![PropertySource::new("inlinedTestProperties", entries)];
        if self.resource_folders.is_empty() {
            // Not read from files: keep the sources as they are.
            leading.extend(self.sources.iter().cloned());
            let mut env = Self::new(leading);
            env.add_profiles(&self.active_profiles);
            env.add_profiles(profiles);
            return Ok(env);
        }
        leading.extend(self.leading.iter().cloned());
        Self::assemble(&self.resource_folders, leading, profiles)
    }

    fn assemble(
        resource_folders: &[PathBuf],
        leading: Vec<PropertySource>,
        extra_profiles: &[String],
    ) -> Result<Self, LoadError> {
        let base = read_sources(resource_folders, "application.properties")?;

        let mut unprofiled = leading.clone();
        unprofiled.extend(base.iter().cloned());
        let mut env = Environment::new(unprofiled);
        env.add_profiles(extra_profiles);
        let profiles = env.active_profiles;

        let mut sources = leading.clone();
        for profile in profiles.iter().rev() {
            sources.extend(read_sources(
                resource_folders,
                &format!("application-{profile}.properties"),
            )?);
        }
        sources.extend(base);
        sources.retain(|s| !s.is_empty());
        Ok(Self {
            sources,
            active_profiles: profiles,
            leading,
            resource_folders: resource_folders.to_vec(),
        })
    }

    fn add_profiles(&mut self, profiles: &[String]) {
        for profile in profiles {
            if !self.active_profiles.contains(profile) {
                self.active_profiles.push(profile.clone());
            }
        }
    }

    /// Returns the raw value of `key` from the first source defining it.
    #[must_use]
    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.sources.iter().find_map(|s| s.get(key))
    }

    /// Returns the active profiles.
    #[must_use]
    pub fn active_profiles(&self) -> &[String] {
        &self.active_profiles
    }

    /// Returns `true` if any expression matches: a profile name matches when
    /// active, `!name` when inactive. With no active profile, `default` is
    /// considered active.
    #[must_use]
    pub fn accepts_profiles(&self, expressions: &[String]) -> bool {
        let is_active = |name: &str| {
            if self.active_profiles.is_empty() {
                name == DEFAULT_PROFILE
            } else {
                self.active_profiles.iter().any(|p| p == name)
            }
        };
        expressions.iter().any(|expr| match expr.strip_prefix('!') {
            Some(name) => !is_active(name.trim()),
            None => is_active(expr.trim()),
        })
    }

    /// Returns the value of `key` with its placeholders resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the value references an unresolvable placeholder.
    pub fn resolved_property(&self, key: &str) -> Result<Option<String>, PlaceholderError> {
        self.get_property(key)
            .map(|v| self.resolve_placeholders(v))
            .transpose()
    }

    /// Replaces every `${key}` and `${key:default}` in `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder has neither a value nor a default.
    pub fn resolve_placeholders(&self, text: &str) -> Result<String, PlaceholderError> {
        self.resolve_nested(text, text, 0)
    }

    fn resolve_nested(
        &self,
        text: &str,
        original: &str,
        depth: usize,
    ) -> Result<String, PlaceholderError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let body_start = start + 2;
            let Some(end) = matching_brace(&rest[body_start..]) else {
                // Unterminated placeholders are kept verbatim.
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let body = &rest[body_start..body_start + end];
            let (key, default) = split_default(body);
            let key = self.resolve_nested(key, original, depth + 1)?;
            let unresolved = || PlaceholderError {
                placeholder: key.clone(),
                value: original.to_string(),
            };
            if depth >= MAX_PLACEHOLDER_DEPTH {
                return Err(unresolved());
            }
            let value = match (self.get_property(&key), default) {
                (Some(v), _) => self.resolve_nested(v, original, depth + 1)?,
                (None, Some(d)) => self.resolve_nested(d, original, depth + 1)?,
                (None, None) => return Err(unresolved()),
            };
            out.push_str(&value);
            rest = &rest[body_start + end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn profiles_from_properties(&self) -> Vec<String> {
        self.get_property(ACTIVE_PROFILES_PROPERTY)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn read_sources(folders: &[PathBuf], file_name: &str) -> Result<Vec<PropertySource>, LoadError> {
    let mut sources = Vec::new();
    for folder in folders {
        let path = folder.join(file_name);
        if let Some(source) = read_source(&path)? {
            sources.push(source);
        }
    }
    Ok(sources)
}

fn read_source(path: &Path) -> Result<Option<PropertySource>, LoadError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(PropertySource::new(
        path.display().to_string(),
        properties::parse(&content),
    )))
}

/// Index of the `}` closing a placeholder body, honouring nested `${`.
fn matching_brace(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'}' {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
        i += 1;
    }
    None
}

/// Splits `key:default` at the first `:` outside a nested placeholder.
fn split_default(body: &str) -> (&str, Option<&str>) {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 1;
            }
            b'}' if depth > 0 => depth -= 1,
            b':' if depth == 0 => return (&body[..i], Some(&body[i + 1..])),
            _ => {}
        }
        i += 1;
    }
    (body, None)
}
