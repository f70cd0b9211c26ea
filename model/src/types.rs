//! Compiled-type metadata: types, their members, and the conditions attached
//! to configuration elements.
//!
//! These structures are the static replacement for reflective discovery. A
//! classes directory carries them as `*.types.json` documents which the
//! [`TypeIndex`](crate::TypeIndex) loads once at generation time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hints::NativeHint;

/// Well-known annotation names recognised by the loader.
pub mod annotations {
    /// Generic component stereotype.
    pub const COMPONENT: &str = "org.springframework.stereotype.Component";
    /// Service stereotype.
    pub const SERVICE: &str = "org.springframework.stereotype.Service";
    /// Repository stereotype.
    pub const REPOSITORY: &str = "org.springframework.stereotype.Repository";
    /// Controller stereotype.
    pub const CONTROLLER: &str = "org.springframework.stereotype.Controller";
    /// REST controller stereotype.
    pub const REST_CONTROLLER: &str = "org.springframework.web.bind.annotation.RestController";
    /// Configuration class marker.
    pub const CONFIGURATION: &str = "org.springframework.context.annotation.Configuration";
    /// Auto-configuration class marker.
    pub const AUTO_CONFIGURATION: &str =
        "org.springframework.boot.autoconfigure.AutoConfiguration";
    /// Application entry point marker.
    pub const SPRING_BOOT_APPLICATION: &str =
        "org.springframework.boot.autoconfigure.SpringBootApplication";

    /// Every annotation that makes a scanned type a component candidate.
    pub const STEREOTYPES: &[&str] = &[
        COMPONENT,
        SERVICE,
        REPOSITORY,
        CONTROLLER,
        REST_CONTROLLER,
        CONFIGURATION,
        AUTO_CONFIGURATION,
        SPRING_BOOT_APPLICATION,
    ];
}

/// Error raised when a type reference cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type reference `{input}`: {reason}")]
pub struct TypeParseError {
    /// The offending input.
    pub input: String,
    /// What went wrong.
    pub reason: &'static str,
}

/// A type name with its resolved generic arguments, e.g.
/// `java.util.List<com.example.Foo>`.
///
/// Nested types use the binary `$` separator (`com.example.Outer$Inner`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResolvableType {
    /// Fully-qualified raw type name.
    pub name: String,
    /// Resolved generic arguments, empty when raw or unresolved.
    pub generics: Vec<ResolvableType>,
}

impl ResolvableType {
    /// Creates a raw (non-generic) type reference.
    pub fn of(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generics: Vec::new(),
        }
    }

    /// Creates a parameterized type reference.
    pub fn with_generics(name: impl Into<String>, generics: Vec<ResolvableType>) -> Self {
        Self {
            name: name.into(),
            generics,
        }
    }

    /// Returns `true` if generic arguments are present.
    #[must_use]
    pub fn has_generics(&self) -> bool {
        !self.generics.is_empty()
    }

    /// Returns the simple name: the part after the last `.` or `$`.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Returns the package of the raw type, empty for the default package.
    #[must_use]
    pub fn package(&self) -> &str {
        package_of(&self.name)
    }

    /// Returns `true` for primitive types such as `int` or `boolean`.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.name.as_str(),
            "boolean" | "byte" | "short" | "int" | "long" | "float" | "double" | "char"
        )
    }

    /// Returns `true` for array types.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.name.ends_with("[]")
    }
}

impl fmt::Display for ResolvableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.generics.is_empty() {
            f.write_str("<")?;
            for (i, g) in self.generics.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{g}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for ResolvableType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { input: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(ty)
    }
}

impl TryFrom<String> for ResolvableType {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResolvableType> for String {
    fn from(value: ResolvableType) -> Self {
        value.to_string()
    }
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn error(&self, reason: &'static str) -> TypeParseError {
        TypeParseError {
            input: self.input.to_string(),
            reason,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn parse_type(&mut self) -> Result<ResolvableType, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '<' || c == '>' || c == ',' || c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(self.error("expected a type name"));
        }
        let name = self.input[start..self.pos].to_string();
        self.skip_ws();
        let mut generics = Vec::new();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                generics.push(self.parse_type()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("unterminated generic argument list")),
                }
            }
        }
        Ok(ResolvableType { name, generics })
    }
}

/// Returns the part of a binary type name after the last `.` or `$`.
#[must_use]
pub fn simple_name(name: &str) -> &str {
    name.rsplit(['.', '$']).next().unwrap_or(name)
}

/// Returns the package of a binary type name, empty for the default package.
#[must_use]
pub fn package_of(name: &str) -> &str {
    // Nested types live in the package of their outermost type.
    let outer = name.split('$').next().unwrap_or(name);
    match outer.rfind('.') {
        Some(idx) => &outer[..idx],
        None => "",
    }
}

/// Member or type visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Accessible from everywhere.
    #[default]
    Public,
    /// Accessible from subclasses and the declaring package.
    Protected,
    /// Accessible from the declaring package only.
    Package,
    /// Accessible from the declaring type only.
    Private,
}

impl Visibility {
    /// Returns `true` if a member with this visibility, declared in
    /// `declaring_package`, can be accessed from code in `from_package`.
    #[must_use]
    pub fn is_accessible_from(self, declaring_package: &str, from_package: &str) -> bool {
        match self {
            Visibility::Public => true,
            Visibility::Protected | Visibility::Package => declaring_package == from_package,
            Visibility::Private => false,
        }
    }
}

/// What sort of type a descriptor describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// A concrete or abstract class.
    #[default]
    Class,
    /// An interface.
    Interface,
    /// An annotation type.
    Annotation,
    /// An enum.
    Enum,
}

/// A constructor, factory method or setter parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterDescriptor {
    /// Parameter name as recorded in the compiled metadata.
    pub name: String,
    /// Declared parameter type.
    #[serde(rename = "type")]
    pub type_: ResolvableType,
    /// Explicit qualifier (a bean name) narrowing the candidates.
    pub qualifier: Option<String>,
    /// Value expression: `${key}`, `${key:default}` or a plain literal.
    pub value: Option<String>,
    /// Whether a candidate must exist.
    pub required: bool,
}

impl Default for ParameterDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_: ResolvableType::of("java.lang.Object"),
            qualifier: None,
            value: None,
            required: true,
        }
    }
}

/// A declared constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructorDescriptor {
    /// Ordered parameters.
    pub parameters: Vec<ParameterDescriptor>,
    /// Constructor visibility.
    pub visibility: Visibility,
    /// Explicitly marked as the injection constructor.
    pub autowired: bool,
}

impl ConstructorDescriptor {
    /// Returns the parameter types in declaration order.
    #[must_use]
    pub fn parameter_types(&self) -> Vec<&ResolvableType> {
        self.parameters.iter().map(|p| &p.type_).collect()
    }
}

/// Marks a method as a bean factory method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeanDeclaration {
    /// Explicit bean name; the method name is used otherwise.
    pub name: Option<String>,
    /// Whether the produced bean is the primary candidate of its type.
    pub primary: bool,
    /// Registration conditions for this method.
    pub conditions: Vec<Condition>,
    /// Marks an explicitly preferred overload.
    pub autowired: bool,
}

/// A declared method: a factory method, an injected setter, or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodDescriptor {
    /// Method name.
    pub name: String,
    /// Ordered parameters.
    pub parameters: Vec<ParameterDescriptor>,
    /// Declared return type.
    pub return_type: ResolvableType,
    /// Method visibility.
    pub visibility: Visibility,
    /// Whether the method is static.
    #[serde(rename = "static")]
    pub is_static: bool,
    /// Present when the method produces a bean.
    pub bean: Option<BeanDeclaration>,
    /// Whether the method is an injection setter.
    pub inject: bool,
    /// Whether the injection is required (setters only).
    pub required: bool,
}

impl Default for MethodDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            parameters: Vec::new(),
            return_type: ResolvableType::of("void"),
            visibility: Visibility::Public,
            is_static: false,
            bean: None,
            inject: false,
            required: true,
        }
    }
}

impl MethodDescriptor {
    /// Returns the parameter types in declaration order.
    #[must_use]
    pub fn parameter_types(&self) -> Vec<&ResolvableType> {
        self.parameters.iter().map(|p| &p.type_).collect()
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared field type.
    #[serde(rename = "type")]
    pub type_: ResolvableType,
    /// Field visibility.
    pub visibility: Visibility,
    /// Whether the field is an injection point.
    pub inject: bool,
    /// Whether a candidate must exist.
    pub required: bool,
    /// Explicit qualifier (a bean name).
    pub qualifier: Option<String>,
    /// Value expression.
    pub value: Option<String>,
}

impl Default for FieldDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_: ResolvableType::of("java.lang.Object"),
            visibility: Visibility::Private,
            inject: false,
            required: true,
            qualifier: None,
            value: None,
        }
    }
}

/// A registration condition evaluated against the target environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Matches when a property is set (and optionally has a given value).
    OnProperty {
        /// Property key.
        name: String,
        /// Required value; any value other than `false` matches when absent.
        #[serde(default)]
        having_value: Option<String>,
        /// Result when the property is not set.
        #[serde(default)]
        match_if_missing: bool,
    },
    /// Matches when any listed profile is active; `!name` negates.
    OnProfile(Vec<String>),
    /// Matches when every listed type is present.
    OnClass(Vec<String>),
    /// Matches when no listed type is present.
    OnMissingClass(Vec<String>),
    /// Matches when a definition of the type has already been registered.
    OnBean(String),
    /// Matches when no definition of the type has been registered yet.
    OnMissingBean(String),
}

/// Context configuration declared by a test class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct TestContextDeclaration {
    /// Configuration classes; the application class is used when empty.
    pub classes: Vec<String>,
    /// Inlined `key=value` properties.
    pub properties: Vec<String>,
    /// Profiles activated for the context.
    pub active_profiles: Vec<String>,
}

/// Metadata for one compiled type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDescriptor {
    /// Fully-qualified binary name.
    pub name: String,
    /// Class, interface, annotation or enum.
    pub kind: TypeKind,
    /// Type visibility.
    pub visibility: Visibility,
    /// Direct super class.
    pub super_type: Option<String>,
    /// Directly implemented interfaces.
    pub interfaces: Vec<String>,
    /// Fully-qualified names of the annotations present on the type.
    pub annotations: Vec<String>,
    /// Explicit component name.
    pub bean_name: Option<String>,
    /// Whether the component is the primary candidate of its type.
    pub primary: bool,
    /// Declared constructors; empty means an implicit public no-arg one.
    pub constructors: Vec<ConstructorDescriptor>,
    /// Declared methods.
    pub methods: Vec<MethodDescriptor>,
    /// Declared fields.
    pub fields: Vec<FieldDescriptor>,
    /// Registration conditions.
    pub conditions: Vec<Condition>,
    /// Packages to scan; `Some(vec![])` scans the type's own package.
    pub component_scan: Option<Vec<String>>,
    /// Imported configuration classes.
    pub imports: Vec<String>,
    /// Native configuration hints.
    pub hints: Vec<NativeHint>,
    /// Present on test classes that bootstrap a context.
    pub test_context: Option<TestContextDeclaration>,
}

impl TypeDescriptor {
    /// Creates an empty public class descriptor.
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if the annotation is present.
    #[must_use]
    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a == annotation)
    }

    /// Returns `true` if the type is a component scanning candidate.
    #[must_use]
    pub fn is_component(&self) -> bool {
        self.kind == TypeKind::Class
            && annotations::STEREOTYPES
                .iter()
                .any(|s| self.has_annotation(s))
    }

    /// Returns `true` if the type contributes configuration: bean methods,
    /// imports or a component scan.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        self.has_annotation(annotations::CONFIGURATION)
            || self.has_annotation(annotations::AUTO_CONFIGURATION)
            || self.has_annotation(annotations::SPRING_BOOT_APPLICATION)
    }

    /// Returns the declared constructors, or the implicit no-arg constructor.
    #[must_use]
    pub fn effective_constructors(&self) -> Vec<ConstructorDescriptor> {
        if self.constructors.is_empty() {
            vec![ConstructorDescriptor::default()]
        } else {
            self.constructors.clone()
        }
    }

    /// Returns the package of the type.
    #[must_use]
    pub fn package(&self) -> &str {
        package_of(&self.name)
    }

    /// Returns the simple name of the type.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Returns the bean factory methods in declaration order.
    pub fn bean_methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter().filter(|m| m.bean.is_some())
    }
}
