//! The injection resolver: decides how each retained definition is built.
//!
//! For every definition the resolver picks a construction strategy
//! (constructor, factory method or supplier), resolves every argument, field
//! and setter against the definition graph, and embeds value expressions as
//! literals resolved against the environment. Members that generated code
//! cannot reach directly are marked reflective and recorded in the
//! native-configuration registry.

use aot_model::{
    AccessBits, FieldHint, MethodHint, ParameterDescriptor, ResolvableType, TypeDescriptor,
    TypeIndex, TypeKind, Visibility,
};

use crate::definition::{ComponentDefinition, DefinitionGraph, Origin};
use crate::environment::Environment;
use crate::error::{GenerationError, ResolutionFailure};
use crate::registry::NativeConfigurationRegistry;

/// A dependency provided by the container itself rather than a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerDependency {
    /// The application context (also a resource loader and event publisher).
    Context,
    /// The environment.
    Environment,
    /// The bean factory.
    BeanFactory,
}

impl ContainerDependency {
    /// Maps a required type to the container dependency satisfying it.
    #[must_use]
    pub fn for_type(type_name: &str) -> Option<Self> {
        match type_name {
            "org.springframework.context.ApplicationContext"
            | "org.springframework.context.ConfigurableApplicationContext"
            | "org.springframework.context.support.GenericApplicationContext"
            | "org.springframework.core.io.ResourceLoader"
            | "org.springframework.context.ApplicationEventPublisher" => Some(Self::Context),
            "org.springframework.core.env.Environment"
            | "org.springframework.core.env.ConfigurableEnvironment" => Some(Self::Environment),
            "org.springframework.beans.factory.BeanFactory"
            | "org.springframework.beans.factory.ListableBeanFactory"
            | "org.springframework.beans.factory.config.ConfigurableListableBeanFactory" => {
                Some(Self::BeanFactory)
            }
            _ => None,
        }
    }
}

/// A value embedded in generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// A string.
    Str(String),
    /// A boolean.
    Bool(bool),
    /// An `int`, `short` or `byte`.
    Int(i64),
    /// A `long`.
    Long(i64),
    /// A `float`, as written.
    Float(String),
    /// A `double`, as written.
    Double(String),
    /// A `char`.
    Char(char),
    /// An enum constant.
    Enum {
        /// Enum type.
        type_name: String,
        /// Constant name.
        constant: String,
    },
}

/// Collection kinds injected with every candidate of their element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// `java.util.List` or `java.util.Collection`.
    List,
    /// `java.util.Set`.
    Set,
}

/// Where an injected value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Another definition.
    Bean {
        /// Definition name.
        name: String,
        /// Type requested by the injection point.
        type_: ResolvableType,
    },
    /// Every definition of an element type, in graph order.
    Beans {
        /// Collection shape.
        kind: CollectionKind,
        /// Element type.
        element_type: ResolvableType,
        /// Definition names.
        names: Vec<String>,
    },
    /// A container-provided object.
    Container(ContainerDependency),
    /// A value resolved at generation time.
    Literal(Literal),
    /// An optional dependency without candidate.
    Null,
}

impl ValueSource {
    fn bean_names(&self) -> Vec<&str> {
        match self {
            ValueSource::Bean { name, .. } => vec![name.as_str()],
            ValueSource::Beans { names, .. } => names.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// How the instance is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instantiation {
    /// A constructor call.
    Constructor {
        /// Parameter types of the chosen constructor.
        parameter_types: Vec<ResolvableType>,
        /// Positional arguments.
        arguments: Vec<ValueSource>,
        /// The constructor is not accessible from generated code.
        reflective: bool,
    },
    /// A factory method call.
    FactoryMethod {
        /// Type declaring the method.
        declaring_type: String,
        /// Target definition; `None` for static methods.
        factory_bean: Option<String>,
        /// Method name.
        method: String,
        /// Parameter types of the chosen overload.
        parameter_types: Vec<ResolvableType>,
        /// Positional arguments.
        arguments: Vec<ValueSource>,
        /// The method is not accessible from generated code.
        reflective: bool,
    },
    /// A verbatim source expression.
    Supplier {
        /// Expression producing the instance.
        expression: String,
    },
}

/// A field or setter injection applied after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberInjection {
    /// Field assignment.
    Field {
        /// Type declaring the field.
        declaring_type: String,
        /// Field name.
        name: String,
        /// Declared field type.
        type_: ResolvableType,
        /// Injected value.
        value: ValueSource,
        /// The field is not accessible from generated code.
        reflective: bool,
    },
    /// Setter invocation.
    Method {
        /// Type declaring the method.
        declaring_type: String,
        /// Method name.
        name: String,
        /// Parameter types.
        parameter_types: Vec<ResolvableType>,
        /// Positional arguments.
        arguments: Vec<ValueSource>,
        /// The method is not accessible from generated code.
        reflective: bool,
    },
}

impl MemberInjection {
    fn values(&self) -> Vec<&ValueSource> {
        match self {
            MemberInjection::Field { value, .. } => vec![value],
            MemberInjection::Method { arguments, .. } => arguments.iter().collect(),
        }
    }
}

/// A definition with its construction strategy and injections resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDefinition {
    /// The definition.
    pub definition: ComponentDefinition,
    /// Whether generated code can name the bean type.
    pub type_accessible: bool,
    /// How the instance is obtained.
    pub instantiation: Instantiation,
    /// Injections applied after construction, in declaration order.
    pub injections: Vec<MemberInjection>,
}

impl ResolvedDefinition {
    /// Names of the definitions this one references, in first-use order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<&str> {
        let (factory, arguments): (Option<&str>, &[ValueSource]) = match &self.instantiation {
            Instantiation::Constructor { arguments, .. } => (None, arguments.as_slice()),
            Instantiation::FactoryMethod {
                factory_bean,
                arguments,
                ..
            } => (factory_bean.as_deref(), arguments.as_slice()),
            Instantiation::Supplier { .. } => (None, &[][..]),
        };
        let referenced = factory
            .into_iter()
            .chain(arguments.iter().flat_map(ValueSource::bean_names))
            .chain(
                self.injections
                    .iter()
                    .flat_map(|i| i.values().into_iter().flat_map(ValueSource::bean_names)),
            );
        let mut names: Vec<&str> = Vec::new();
        for name in referenced {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// One executable member considered for construction.
struct Executable<'d> {
    signature: String,
    parameters: &'d [ParameterDescriptor],
    visibility: Visibility,
    autowired: bool,
}

/// Resolves definitions of one graph.
pub struct InjectionResolver<'a> {
    index: &'a TypeIndex,
    graph: &'a DefinitionGraph,
    environment: &'a Environment,
    target_package: &'a str,
}

impl<'a> InjectionResolver<'a> {
    /// Creates a resolver for code generated in `target_package`.
    #[must_use]
    pub fn new(
        index: &'a TypeIndex,
        graph: &'a DefinitionGraph,
        environment: &'a Environment,
        target_package: &'a str,
    ) -> Self {
        Self {
            index,
            graph,
            environment,
            target_package,
        }
    }

    /// Resolves every definition of the graph, in graph order.
    ///
    /// # Errors
    ///
    /// Returns the first resolution or ambiguity failure.
    pub fn resolve_all(
        &self,
        registry: &mut NativeConfigurationRegistry,
    ) -> Result<Vec<ResolvedDefinition>, GenerationError> {
        self.graph
            .iter()
            .map(|definition| self.resolve(definition, registry))
            .collect()
    }

    /// Resolves one definition, recording reflective needs in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Resolution`] when a required injection
    /// point has no unique candidate, and
    /// [`GenerationError::AmbiguousConstruction`] when several constructors
    /// or factory methods are equally eligible.
    pub fn resolve(
        &self,
        definition: &ComponentDefinition,
        registry: &mut NativeConfigurationRegistry,
    ) -> Result<ResolvedDefinition, GenerationError> {
        let desc = self.index.get(&definition.bean_type.name);
        let type_accessible = desc.map_or(true, |d| self.type_accessible(d));
        if !type_accessible {
            registry.request_reflection(&definition.bean_type.name, AccessBits::CLASS);
        }

        let instantiation = match &definition.origin {
            Origin::Constructor => self.resolve_constructor(definition, desc, registry)?,
            Origin::FactoryMethod {
                declaring_type,
                factory_bean,
                method,
            } => self.resolve_factory_method(
                definition,
                declaring_type,
                factory_bean.as_deref(),
                method,
                registry,
            )?,
            Origin::Supplier { expression } => Instantiation::Supplier {
                expression: expression.clone(),
            },
        };

        let injections = match (&definition.origin, desc) {
            (Origin::Supplier { .. }, _) | (_, None) => Vec::new(),
            (_, Some(desc)) => self.resolve_injections(definition, desc, registry)?,
        };

        Ok(ResolvedDefinition {
            definition: definition.clone(),
            type_accessible,
            instantiation,
            injections,
        })
    }

    fn type_accessible(&self, desc: &TypeDescriptor) -> bool {
        desc.visibility
            .is_accessible_from(desc.package(), self.target_package)
    }

    fn member_accessible(&self, desc: Option<&TypeDescriptor>, visibility: Visibility) -> bool {
        match desc {
            Some(desc) => {
                self.type_accessible(desc)
                    && visibility.is_accessible_from(desc.package(), self.target_package)
            }
            None => visibility == Visibility::Public,
        }
    }

    fn resolve_constructor(
        &self,
        definition: &ComponentDefinition,
        desc: Option<&TypeDescriptor>,
        registry: &mut NativeConfigurationRegistry,
    ) -> Result<Instantiation, GenerationError> {
        let Some(desc) = desc else {
            // Types outside the index are built with their public no-arg
            // constructor.
            return Ok(Instantiation::Constructor {
                parameter_types: Vec::new(),
                arguments: Vec::new(),
                reflective: false,
            });
        };
        let constructors = desc.effective_constructors();
        let executables: Vec<Executable<'_>> = constructors
            .iter()
            .map(|c| Executable {
                signature: signature(&desc.name, "", &c.parameters),
                parameters: &c.parameters,
                visibility: c.visibility,
                autowired: c.autowired,
            })
            .collect();
        let (chosen, arguments) = self.choose(definition, &desc.name, &executables, "constructor")?;
        let parameter_types: Vec<ResolvableType> =
            chosen.parameters.iter().map(|p| p.type_.clone()).collect();
        let reflective = !self.member_accessible(Some(desc), chosen.visibility);
        if reflective {
            registry.request_reflection_method(
                &desc.name,
                MethodHint {
                    name: "<init>".to_string(),
                    parameter_types: erased(&parameter_types),
                },
            );
        }
        Ok(Instantiation::Constructor {
            parameter_types,
            arguments,
            reflective,
        })
    }

    fn resolve_factory_method(
        &self,
        definition: &ComponentDefinition,
        declaring_type: &str,
        factory_bean: Option<&str>,
        method: &str,
        registry: &mut NativeConfigurationRegistry,
    ) -> Result<Instantiation, GenerationError> {
        if let Some(bean) = factory_bean.filter(|bean| !self.graph.contains(bean)) {
            return Err(GenerationError::Resolution {
                definition: definition.name.clone(),
                member: format!("factory method '{method}'"),
                required_type: declaring_type.to_string(),
                reason: ResolutionFailure::NoQualifiedCandidate(bean.to_string()),
            });
        }
        let declaring = self.index.get(declaring_type);
        let overloads: Vec<Executable<'_>> = declaring
            .map(|d| {
                d.bean_methods()
                    .filter(|m| m.name == method)
                    .map(|m| Executable {
                        signature: signature(declaring_type, &format!(".{method}"), &m.parameters),
                        parameters: &m.parameters,
                        visibility: m.visibility,
                        autowired: m.bean.as_ref().is_some_and(|b| b.autowired),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (parameter_types, arguments, visibility) = if overloads.is_empty() {
            (Vec::new(), Vec::new(), Visibility::Public)
        } else {
            let (chosen, arguments) =
                self.choose(definition, declaring_type, &overloads, "factory method")?;
            (
                chosen.parameters.iter().map(|p| p.type_.clone()).collect::<Vec<_>>(),
                arguments,
                chosen.visibility,
            )
        };
        let reflective = !self.member_accessible(declaring, visibility);
        if reflective {
            registry.request_reflection_method(
                declaring_type,
                MethodHint {
                    name: method.to_string(),
                    parameter_types: erased(&parameter_types),
                },
            );
        }
        Ok(Instantiation::FactoryMethod {
            declaring_type: declaring_type.to_string(),
            factory_bean: factory_bean.map(str::to_string),
            method: method.to_string(),
            parameter_types,
            arguments,
            reflective,
        })
    }

    /// Picks the executable to call: the only one, the marked one, or the one
    /// with the most parameters that all resolve. Ties are ambiguous.
    fn choose<'e, 'd>(
        &self,
        definition: &ComponentDefinition,
        type_name: &str,
        executables: &'e [Executable<'d>],
        kind: &str,
    ) -> Result<(&'e Executable<'d>, Vec<ValueSource>), GenerationError> {
        if let [single] = executables {
            return Ok((single, self.resolve_arguments(definition, single, kind)?));
        }
        let marked: Vec<&Executable<'_>> = executables.iter().filter(|e| e.autowired).collect();
        if let [single] = marked.as_slice() {
            return Ok((*single, self.resolve_arguments(definition, single, kind)?));
        }
        let pool: Vec<&Executable<'_>> = if marked.is_empty() {
            executables.iter().collect()
        } else {
            marked
        };

        let mut best: Vec<(&Executable<'_>, Vec<ValueSource>)> = Vec::new();
        let mut first_error = None;
        for executable in pool {
            match self.resolve_arguments(definition, executable, kind) {
                Ok(arguments) => {
                    let count = executable.parameters.len();
                    let best_count = best.first().map(|(e, _)| e.parameters.len());
                    match best_count {
                        Some(n) if count < n => {}
                        Some(n) if count == n => best.push((executable, arguments)),
                        _ => best = vec![(executable, arguments)],
                    }
                }
                Err(e) => {
                    let more = first_error
                        .as_ref()
                        .map_or(true, |(n, _)| executable.parameters.len() > *n);
                    if more {
                        first_error = Some((executable.parameters.len(), e));
                    }
                }
            }
        }
        match best.len() {
            0 => Err(first_error.map_or_else(
                || GenerationError::AmbiguousConstruction {
                    definition: definition.name.clone(),
                    type_name: type_name.to_string(),
                    candidates: Vec::new(),
                },
                |(_, e)| e,
            )),
            1 => Ok(best.remove(0)),
            _ => Err(GenerationError::AmbiguousConstruction {
                definition: definition.name.clone(),
                type_name: type_name.to_string(),
                candidates: best.iter().map(|(e, _)| e.signature.clone()).collect(),
            }),
        }
    }

    fn resolve_arguments(
        &self,
        definition: &ComponentDefinition,
        executable: &Executable<'_>,
        kind: &str,
    ) -> Result<Vec<ValueSource>, GenerationError> {
        executable
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let member = format!("{kind} parameter {i} of {}", executable.signature);
                let point = InjectionPoint {
                    member: &member,
                    name: &p.name,
                    type_: &p.type_,
                    qualifier: p.qualifier.as_deref(),
                    value: p.value.as_deref(),
                    required: p.required,
                };
                Ok(self.resolve_point(definition, &point)?.unwrap_or(ValueSource::Null))
            })
            .collect()
    }

    fn resolve_injections(
        &self,
        definition: &ComponentDefinition,
        desc: &TypeDescriptor,
        registry: &mut NativeConfigurationRegistry,
    ) -> Result<Vec<MemberInjection>, GenerationError> {
        let mut injections = Vec::new();
        for owner in self.class_hierarchy(desc) {
            for field in owner.fields.iter().filter(|f| f.inject || f.value.is_some()) {
                let member = format!("field '{}' of {}", field.name, owner.name);
                let point = InjectionPoint {
                    member: &member,
                    name: &field.name,
                    type_: &field.type_,
                    qualifier: field.qualifier.as_deref(),
                    value: field.value.as_deref(),
                    required: field.required,
                };
                let Some(value) = self.resolve_point(definition, &point)? else {
                    continue;
                };
                let reflective = !self.member_accessible(Some(owner), field.visibility);
                if reflective {
                    registry.request_reflection_field(
                        &owner.name,
                        FieldHint {
                            name: field.name.clone(),
                            allow_write: true,
                        },
                    );
                }
                injections.push(MemberInjection::Field {
                    declaring_type: owner.name.clone(),
                    name: field.name.clone(),
                    type_: field.type_.clone(),
                    value,
                    reflective,
                });
            }

            for method in owner.methods.iter().filter(|m| m.inject && m.bean.is_none()) {
                let signature = signature(&owner.name, &format!(".{}", method.name), &method.parameters);
                let mut arguments = Vec::with_capacity(method.parameters.len());
                for (i, p) in method.parameters.iter().enumerate() {
                    let member = format!("method parameter {i} of {signature}");
                    let point = InjectionPoint {
                        member: &member,
                        name: &p.name,
                        type_: &p.type_,
                        qualifier: p.qualifier.as_deref(),
                        value: p.value.as_deref(),
                        required: method.required && p.required,
                    };
                    match self.resolve_point(definition, &point)? {
                        Some(value) => arguments.push(value),
                        None => break,
                    }
                }
                if arguments.len() != method.parameters.len() {
                    // A missing optional argument skips the whole setter.
                    continue;
                }
                let parameter_types: Vec<ResolvableType> = method.parameter_types().into_iter().cloned().collect();
                let reflective = !self.member_accessible(Some(owner), method.visibility);
                if reflective {
                    registry.request_reflection_method(
                        &owner.name,
                        MethodHint {
                            name: method.name.clone(),
                            parameter_types: erased(&parameter_types),
                        },
                    );
                }
                injections.push(MemberInjection::Method {
                    declaring_type: owner.name.clone(),
                    name: method.name.clone(),
                    parameter_types,
                    arguments,
                    reflective,
                });
            }
        }
        Ok(injections)
    }

    /// The class and its indexed super classes, top-most first.
    fn class_hierarchy<'d>(&'d self, desc: &'d TypeDescriptor) -> Vec<&'d TypeDescriptor> {
        let mut chain = vec![desc];
        let mut current = desc;
        while let Some(parent) = current.super_type.as_deref().and_then(|s| self.index.get(s)) {
            if chain.iter().any(|d| d.name == parent.name) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Resolves one injection point. `Ok(None)` means an optional point
    /// without value.
    fn resolve_point(
        &self,
        definition: &ComponentDefinition,
        point: &InjectionPoint<'_>,
    ) -> Result<Option<ValueSource>, GenerationError> {
        let fail = |reason: ResolutionFailure| GenerationError::Resolution {
            definition: definition.name.clone(),
            member: point.member.to_string(),
            required_type: point.type_.to_string(),
            reason,
        };

        if let Some(expression) = point.value {
            let text = match self.environment.resolve_placeholders(expression) {
                Ok(text) => text,
                Err(_) if !point.required => return Ok(None),
                Err(e) => return Err(fail(ResolutionFailure::Placeholder(e))),
            };
            return self
                .literal(point.type_, &text)
                .map(|l| Some(ValueSource::Literal(l)))
                .ok_or_else(|| fail(ResolutionFailure::InvalidValue(text)));
        }

        if let Some(dependency) = ContainerDependency::for_type(&point.type_.name) {
            return Ok(Some(ValueSource::Container(dependency)));
        }

        if let Some((kind, element_type)) = collection_element(point.type_) {
            let names: Vec<String> = self
                .graph
                .candidates(self.index, element_type)
                .into_iter()
                .filter(|c| c.name != definition.name)
                .map(|c| c.name.clone())
                .collect();
            if names.is_empty() {
                return if point.required {
                    Err(fail(ResolutionFailure::NoCandidate))
                } else {
                    Ok(None)
                };
            }
            return Ok(Some(ValueSource::Beans {
                kind,
                element_type: element_type.clone(),
                names,
            }));
        }

        let mut candidates: Vec<&ComponentDefinition> = self
            .graph
            .candidates(self.index, point.type_)
            .into_iter()
            .filter(|c| c.name != definition.name)
            .collect();
        if let Some(qualifier) = point.qualifier {
            candidates.retain(|c| c.name == qualifier);
            if candidates.is_empty() {
                return if point.required {
                    Err(fail(ResolutionFailure::NoQualifiedCandidate(qualifier.to_string())))
                } else {
                    Ok(None)
                };
            }
        }
        if candidates.len() > 1 {
            let primary: Vec<_> = candidates.iter().copied().filter(|c| c.primary).collect();
            if primary.len() == 1 {
                candidates = primary;
            }
        }
        if candidates.len() > 1 {
            let named: Vec<_> = candidates
                .iter()
                .copied()
                .filter(|c| c.name == point.name)
                .collect();
            if named.len() == 1 {
                candidates = named;
            }
        }
        match candidates.as_slice() {
            [] if point.required => Err(fail(ResolutionFailure::NoCandidate)),
            [] => Ok(None),
            [single] => Ok(Some(ValueSource::Bean {
                name: single.name.clone(),
                type_: point.type_.clone(),
            })),
            several => Err(fail(ResolutionFailure::MultipleCandidates(
                several.iter().map(|c| c.name.clone()).collect(),
            ))),
        }
    }

    /// Converts resolved text to a literal of the required type.
    fn literal(&self, type_: &ResolvableType, text: &str) -> Option<Literal> {
        let trimmed = text.trim();
        match type_.name.as_str() {
            "java.lang.String" | "java.lang.Object" | "java.lang.CharSequence" => {
                Some(Literal::Str(text.to_string()))
            }
            "boolean" | "java.lang.Boolean" => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Some(Literal::Bool(true)),
                "false" | "no" | "off" => Some(Literal::Bool(false)),
                _ => None,
            },
            "int" | "java.lang.Integer" => trimmed.parse::<i32>().ok().map(|v| Literal::Int(v.into())),
            "short" | "java.lang.Short" => trimmed.parse::<i16>().ok().map(|v| Literal::Int(v.into())),
            "byte" | "java.lang.Byte" => trimmed.parse::<i8>().ok().map(|v| Literal::Int(v.into())),
            "long" | "java.lang.Long" => trimmed.parse::<i64>().ok().map(Literal::Long),
            "float" | "java.lang.Float" => trimmed
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|_| Literal::Float(trimmed.to_string())),
            "double" | "java.lang.Double" => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|_| Literal::Double(trimmed.to_string())),
            "char" | "java.lang.Character" => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Literal::Char(c)),
                    _ => None,
                }
            }
            name if self.index.kind_of(name) == Some(TypeKind::Enum) => {
                let valid = trimmed.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
                    && trimmed.chars().all(|c| c.is_alphanumeric() || c == '_');
                valid.then(|| Literal::Enum {
                    type_name: name.to_string(),
                    constant: trimmed.to_string(),
                })
            }
            _ => None,
        }
    }
}

struct InjectionPoint<'p> {
    member: &'p str,
    name: &'p str,
    type_: &'p ResolvableType,
    qualifier: Option<&'p str>,
    value: Option<&'p str>,
    required: bool,
}

fn collection_element(type_: &ResolvableType) -> Option<(CollectionKind, &ResolvableType)> {
    let kind = match type_.name.as_str() {
        "java.util.List" | "java.util.Collection" => CollectionKind::List,
        "java.util.Set" => CollectionKind::Set,
        _ => return None,
    };
    match type_.generics.as_slice() {
        [element] => Some((kind, element)),
        _ => None,
    }
}

fn signature(type_name: &str, member: &str, parameters: &[ParameterDescriptor]) -> String {
    let types: Vec<String> = parameters.iter().map(|p| p.type_.to_string()).collect();
    format!("{type_name}{member}({})", types.join(", "))
}

/// Raw parameter type names, as reflection metadata expects them.
fn erased(types: &[ResolvableType]) -> Vec<String> {
    types.iter().map(|t| t.name.clone()).collect()
}
