//! Native configuration hints attached to compiled types.
//!
//! A hint describes what a library needs at native-image runtime: reflective
//! access to types, dynamic proxies, bundled resources, serialization. Hints
//! with a `trigger` only apply when the trigger type is present in the
//! analysed application.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::types::TypeKind;

/// Reflective access level requested for a type, as a bit mask.
///
/// Masks combine with `|` and are never reduced.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessBits(pub u32);

impl AccessBits {
    /// No access.
    pub const NONE: AccessBits = AccessBits(0);
    /// Load the class (`Class.forName`).
    pub const CLASS: AccessBits = AccessBits(0x0001);
    /// All declared constructors.
    pub const DECLARED_CONSTRUCTORS: AccessBits = AccessBits(0x0002);
    /// All declared methods.
    pub const DECLARED_METHODS: AccessBits = AccessBits(0x0004);
    /// All declared fields.
    pub const DECLARED_FIELDS: AccessBits = AccessBits(0x0008);
    /// All public constructors.
    pub const PUBLIC_CONSTRUCTORS: AccessBits = AccessBits(0x0010);
    /// All public methods.
    pub const PUBLIC_METHODS: AccessBits = AccessBits(0x0020);
    /// All public fields.
    pub const PUBLIC_FIELDS: AccessBits = AccessBits(0x0040);
    /// The class file as a resource.
    pub const RESOURCE: AccessBits = AccessBits(0x0080);
    /// Metadata query of declared methods.
    pub const QUERY_DECLARED_METHODS: AccessBits = AccessBits(0x0100);
    /// Metadata query of public methods.
    pub const QUERY_PUBLIC_METHODS: AccessBits = AccessBits(0x0200);

    /// Load and instantiate through declared constructors.
    pub const LOAD_AND_CONSTRUCT: AccessBits =
        AccessBits(Self::CLASS.0 | Self::DECLARED_CONSTRUCTORS.0);
    /// Load, instantiate and call public methods.
    pub const LOAD_AND_CONSTRUCT_AND_PUBLIC_METHODS: AccessBits =
        AccessBits(Self::LOAD_AND_CONSTRUCT.0 | Self::PUBLIC_METHODS.0);
    /// Default access for annotation types.
    pub const ANNOTATION: AccessBits = AccessBits(Self::CLASS.0 | Self::PUBLIC_METHODS.0);
    /// Default access for interfaces.
    pub const INTERFACE: AccessBits = AccessBits(Self::CLASS.0 | Self::PUBLIC_METHODS.0);
    /// Everything.
    pub const FULL_REFLECTION: AccessBits = AccessBits(
        Self::CLASS.0
            | Self::DECLARED_CONSTRUCTORS.0
            | Self::DECLARED_METHODS.0
            | Self::DECLARED_FIELDS.0
            | Self::PUBLIC_CONSTRUCTORS.0
            | Self::PUBLIC_METHODS.0
            | Self::PUBLIC_FIELDS.0,
    );

    /// Returns `true` if every bit of `other` is set.
    #[must_use]
    pub fn contains(self, other: AccessBits) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no bit is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The access inferred for a type when a hint does not specify one.
    #[must_use]
    pub fn inferred_for(name: &str, kind: Option<TypeKind>) -> AccessBits {
        if name.ends_with("[]") {
            return Self::CLASS;
        }
        match kind {
            Some(TypeKind::Annotation) => Self::ANNOTATION,
            Some(TypeKind::Interface) => Self::INTERFACE,
            _ => Self::LOAD_AND_CONSTRUCT,
        }
    }
}

impl BitOr for AccessBits {
    type Output = AccessBits;

    fn bitor(self, rhs: AccessBits) -> AccessBits {
        AccessBits(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessBits {
    fn bitor_assign(&mut self, rhs: AccessBits) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for AccessBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessBits({:#06x})", self.0)
    }
}

/// A method whitelisted for reflective invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodHint {
    /// Method name; `<init>` for constructors.
    pub name: String,
    /// Parameter type names.
    pub parameter_types: Vec<String>,
}

/// A field whitelisted for reflective access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldHint {
    /// Field name.
    pub name: String,
    /// Whether the field is written reflectively.
    pub allow_write: bool,
}

/// Reflective access requested for a set of types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeHint {
    /// Fully-qualified type names.
    pub types: Vec<String>,
    /// Access level; inferred from the type kind when empty.
    pub access: AccessBits,
    /// Method whitelist.
    pub methods: Vec<MethodHint>,
    /// Field whitelist.
    pub fields: Vec<FieldHint>,
}

/// A dynamic proxy over an ordered set of interfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyHint {
    /// Interfaces implemented by the proxy, in order.
    pub types: Vec<String>,
}

/// Resources bundled into the image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceHint {
    /// Resource path patterns (regular expressions).
    pub patterns: Vec<String>,
    /// Resource bundle base names.
    pub bundles: Vec<String>,
}

/// A group of hints sharing one trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeHint {
    /// Type whose presence activates the hint; always active when absent.
    pub trigger: Option<String>,
    /// Reflection hints.
    pub types: Vec<TypeHint>,
    /// JNI reflection hints.
    pub jni_types: Vec<TypeHint>,
    /// Proxy hints.
    pub proxies: Vec<ProxyHint>,
    /// Resource hints.
    pub resources: Vec<ResourceHint>,
    /// Types serialized with Java serialization.
    pub serializables: Vec<String>,
}

impl NativeHint {
    /// Returns every type name the hint mentions, trigger included.
    pub fn referenced_types(&self) -> impl Iterator<Item = &str> {
        self.trigger
            .iter()
            .map(String::as_str)
            .chain(self.types.iter().flat_map(|t| t.types.iter().map(String::as_str)))
            .chain(self.jni_types.iter().flat_map(|t| t.types.iter().map(String::as_str)))
            .chain(self.proxies.iter().flat_map(|p| p.types.iter().map(String::as_str)))
            .chain(self.serializables.iter().map(String::as_str))
    }
}
