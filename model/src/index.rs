//! The type index: every compiled type known to one generation run.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::types::{package_of, TypeDescriptor, TypeKind};

/// Suffix of compiled-type metadata files inside a classes directory.
pub const METADATA_FILE_SUFFIX: &str = ".types.json";

/// JDK and container types that are always loadable.
const PLATFORM_TYPES: &[&str] = &[
    "java.lang.Object",
    "java.lang.String",
    "java.lang.Boolean",
    "java.lang.Byte",
    "java.lang.Short",
    "java.lang.Integer",
    "java.lang.Long",
    "java.lang.Float",
    "java.lang.Double",
    "java.lang.Character",
    "java.util.List",
    "java.util.Set",
    "java.util.Collection",
    "java.util.Map",
    "org.springframework.core.env.Environment",
    "org.springframework.context.ApplicationContext",
    "org.springframework.beans.factory.BeanFactory",
    "org.springframework.core.io.ResourceLoader",
    "org.springframework.context.ApplicationEventPublisher",
];

/// Error raised while loading metadata files.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A metadata file or directory could not be read.
    #[error("cannot read type metadata {path}")]
    Io {
        /// Path attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A metadata file is not valid.
    #[error("invalid type metadata in {path}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct MetadataFile {
    #[serde(default)]
    types: Vec<TypeDescriptor>,
}

/// Insertion-ordered index of type descriptors.
///
/// The first descriptor registered under a name wins, mirroring class-path
/// shadowing.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, usize>,
}

impl TypeIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from descriptors, in order.
    pub fn from_types(types: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        let mut index = Self::new();
        for ty in types {
            index.insert(ty);
        }
        index
    }

    /// Loads every `*.types.json` file under the given classes directories.
    ///
    /// Directories are walked in the given order and files in sorted order so
    /// the resulting index is deterministic. Missing directories are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a metadata file cannot be read or parsed.
    pub fn load(dirs: &[PathBuf]) -> Result<Self, IndexError> {
        let mut index = Self::new();
        for dir in dirs {
            index.load_dir(dir)?;
        }
        Ok(index)
    }

    fn load_dir(&mut self, dir: &Path) -> Result<(), IndexError> {
        if !dir.exists() {
            return Ok(());
        }
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| IndexError::Io {
                path: e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("file system loop")),
            })?;
            let path = entry.path();
            let is_metadata = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(METADATA_FILE_SUFFIX));
            if !entry.file_type().is_file() || !is_metadata {
                continue;
            }
            let content = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let file: MetadataFile =
                serde_json::from_str(&content).map_err(|source| IndexError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            for ty in file.types {
                self.insert(ty);
            }
        }
        Ok(())
    }

    /// Registers a descriptor. Returns `false` if the name was already taken.
    pub fn insert(&mut self, ty: TypeDescriptor) -> bool {
        if self.by_name.contains_key(&ty.name) {
            return false;
        }
        self.by_name.insert(ty.name.clone(), self.types.len());
        self.types.push(ty);
        true
    }

    /// Looks up a descriptor by fully-qualified name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    /// Returns `true` if the type can be loaded: indexed, a platform type, or
    /// a primitive.
    #[must_use]
    pub fn is_present(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
            || PLATFORM_TYPES.contains(&name)
            || matches!(
                name,
                "boolean" | "byte" | "short" | "int" | "long" | "float" | "double" | "char"
            )
    }

    /// Returns the kind of an indexed type.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        self.get(name).map(|t| t.kind)
    }

    /// Iterates over descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    /// Number of indexed types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over types declared in `package` or one of its sub-packages.
    pub fn in_package<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a TypeDescriptor> {
        self.types.iter().filter(move |t| {
            let pkg = package_of(&t.name);
            package.is_empty()
                || pkg == package
                || (pkg.starts_with(package) && pkg[package.len()..].starts_with('.'))
        })
    }

    /// Returns the type itself followed by all its super classes and
    /// interfaces, breadth first, ending with `java.lang.Object`.
    #[must_use]
    pub fn supertypes(&self, name: &str) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut ordered = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::from([name.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(desc) = self.get(&current) {
                queue.extend(desc.super_type.iter().cloned());
                queue.extend(desc.interfaces.iter().cloned());
            }
            ordered.push(current);
        }
        if !seen.contains("java.lang.Object") {
            ordered.push("java.lang.Object".to_string());
        }
        ordered
    }

    /// Returns `true` if a value of type `candidate` can be assigned to
    /// `required`.
    #[must_use]
    pub fn is_assignable(&self, candidate: &str, required: &str) -> bool {
        candidate == required || self.supertypes(candidate).iter().any(|t| t == required)
    }
}
