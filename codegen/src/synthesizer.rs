//! The code synthesizer: turns resolved definitions into Java units.
//!
//! Definitions are ordered so that every definition follows the ones it
//! references, then distributed over a tree of generation units. The root of
//! a context implements the container's initializer entry point; once a unit
//! holds the configured number of statements a fork is created and the
//! following statements go there. Each initializer invokes its forks in
//! creation order.

use std::collections::{BTreeSet, HashMap, HashSet};

use aot_model::{AccessBits, MethodHint, ResolvableType, TypeIndex};

use crate::definition::Role;
use crate::emit::{char_literal, string_literal, JavaFile};
use crate::error::GenerationError;
use crate::registry::NativeConfigurationRegistry;
use crate::resolver::{
    CollectionKind, ContainerDependency, Instantiation, Literal, MemberInjection,
    ResolvedDefinition, ValueSource,
};

const REGISTRAR: &str = "org.springframework.aot.beans.factory.BeanDefinitionRegistrar";
const CONTEXT: &str = "org.springframework.context.support.GenericApplicationContext";
const INITIALIZER: &str = "org.springframework.context.ApplicationContextInitializer";
const BEAN_DEFINITION: &str = "org.springframework.beans.factory.config.BeanDefinition";
const REFLECTION_UTILS: &str = "org.springframework.util.ReflectionUtils";
const CLASS_UTILS: &str = "org.springframework.util.ClassUtils";
const BEAN_UTILS: &str = "org.springframework.beans.BeanUtils";
const SUPPLIER: &str = "java.util.function.Supplier";
const CONTEXT_LOADER: &str = "org.springframework.test.context.SmartContextLoader";
const AOT_CONTEXT_LOADER: &str = "org.springframework.aot.test.context.bootstrap.SpringBootAotContextLoader";

/// Index of a unit in its [`UnitTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(usize);

/// What a unit renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// An `ApplicationContextInitializer` entry point.
    Initializer,
    /// An overflow unit with a static `registerBeans(context)` method.
    Fork,
    /// A static map of test classes to context loaders for their initializer.
    ContextLoaders {
        /// `(test class, initializer unit)` pairs, in order.
        entries: Vec<(String, UnitId)>,
    },
}

/// One generated class.
#[derive(Debug, Clone)]
pub struct UnitNode {
    /// Identifier in the tree.
    pub id: UnitId,
    /// Owning unit; `None` for roots.
    pub parent: Option<UnitId>,
    /// Simple class name.
    pub class_name: String,
    /// Unit kind.
    pub kind: UnitKind,
    /// Registration statements, in emission order.
    pub statements: Vec<ResolvedDefinition>,
    /// Child units, in creation order.
    pub children: Vec<UnitId>,
    /// Class-level documentation.
    pub javadoc: Option<String>,
}

/// Arena of generation units with parent links.
#[derive(Debug, Clone)]
pub struct UnitTree {
    package: String,
    nodes: Vec<UnitNode>,
}

impl UnitTree {
    /// Creates an empty tree whose classes live in `package`.
    #[must_use]
    pub fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            nodes: Vec::new(),
        }
    }

    /// Package of every unit.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Adds a unit, as a child of `parent` when given.
    pub fn add(&mut self, parent: Option<UnitId>, class_name: &str, kind: UnitKind) -> UnitId {
        let id = UnitId(self.nodes.len());
        self.nodes.push(UnitNode {
            id,
            parent,
            class_name: class_name.to_string(),
            kind,
            statements: Vec::new(),
            children: Vec::new(),
            javadoc: None,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    /// Looks up a unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> &UnitNode {
        &self.nodes[id.0]
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, id: UnitId) -> &mut UnitNode {
        &mut self.nodes[id.0]
    }

    /// Iterates in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitNode> {
        self.nodes.iter()
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree has no unit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of registration statements.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.nodes.iter().map(|n| n.statements.len()).sum()
    }

    /// Fully-qualified name of a unit's class.
    #[must_use]
    pub fn qualified_name(&self, id: UnitId) -> String {
        let class_name = &self.get(id).class_name;
        if self.package.is_empty() {
            class_name.clone()
        } else {
            format!("{}.{class_name}", self.package)
        }
    }
}

/// Orders definitions so that each follows its dependencies; independent
/// definitions keep their relative order.
///
/// # Errors
///
/// Returns [`GenerationError::DependencyCycle`] if definitions reference each
/// other in a cycle.
pub fn order(resolved: Vec<ResolvedDefinition>) -> Result<Vec<ResolvedDefinition>, GenerationError> {
    let position: HashMap<&str, usize> = resolved
        .iter()
        .enumerate()
        .map(|(i, r)| (r.definition.name.as_str(), i))
        .collect();
    let mut pending = vec![0usize; resolved.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); resolved.len()];
    for (i, r) in resolved.iter().enumerate() {
        for dependency in r.dependencies() {
            if let Some(&d) = position.get(dependency) {
                pending[i] += 1;
                dependents[d].push(i);
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..resolved.len()).filter(|&i| pending[i] == 0).collect();
    let mut sorted = Vec::with_capacity(resolved.len());
    while let Some(i) = ready.pop_first() {
        sorted.push(i);
        for &dependent in &dependents[i] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }
    if sorted.len() != resolved.len() {
        let definitions = (0..resolved.len())
            .filter(|i| pending[*i] > 0)
            .map(|i| resolved[i].definition.name.clone())
            .collect();
        return Err(GenerationError::DependencyCycle { definitions });
    }

    let mut slots: Vec<Option<ResolvedDefinition>> = resolved.into_iter().map(Some).collect();
    Ok(sorted.into_iter().filter_map(|i| slots[i].take()).collect())
}

/// Distributes statements over units and renders them.
pub struct CodeSynthesizer<'a> {
    index: &'a TypeIndex,
    package: &'a str,
    max_statements: usize,
}

impl<'a> CodeSynthesizer<'a> {
    /// Creates a synthesizer for units in `package`, forking after
    /// `max_statements` statements.
    #[must_use]
    pub fn new(index: &'a TypeIndex, package: &'a str, max_statements: usize) -> Self {
        Self {
            index,
            package,
            max_statements: max_statements.max(1),
        }
    }

    /// Adds an initializer named `class_name` under `parent`, holding the
    /// ordered definitions, forked as needed. Returns the initializer.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::DependencyCycle`] if the definitions cannot
    /// be ordered.
    pub fn synthesize(
        &self,
        tree: &mut UnitTree,
        parent: Option<UnitId>,
        class_name: &str,
        resolved: Vec<ResolvedDefinition>,
        registry: &mut NativeConfigurationRegistry,
    ) -> Result<UnitId, GenerationError> {
        let ordered = order(resolved)?;
        let root = tree.add(parent, class_name, UnitKind::Initializer);
        // The container instantiates initializers reflectively.
        let qualified = tree.qualified_name(root);
        registry.request_reflection(&qualified, AccessBits::CLASS);
        registry.request_reflection_method(
            &qualified,
            MethodHint {
                name: "<init>".to_string(),
                parameter_types: Vec::new(),
            },
        );

        let mut current = root;
        let mut forks = 0;
        for statement in ordered {
            if tree.get(current).statements.len() >= self.max_statements {
                forks += 1;
                current = tree.add(Some(root), &format!("{class_name}Fork{forks}"), UnitKind::Fork);
            }
            tree.get_mut(current).statements.push(statement);
        }
        Ok(root)
    }

    /// Renders every unit as `(class name, source)`, in creation order.
    #[must_use]
    pub fn render(&self, tree: &UnitTree) -> Vec<(String, String)> {
        tree.iter()
            .map(|node| (node.class_name.clone(), self.render_unit(tree, node)))
            .collect()
    }

    fn render_unit(&self, tree: &UnitTree, node: &UnitNode) -> String {
        let mut f = JavaFile::new(tree.package(), &node.class_name);
        if let Some(doc) = &node.javadoc {
            f.javadoc(doc);
        }
        match &node.kind {
            UnitKind::Initializer => {
                let initializer = f.type_name(INITIALIZER);
                let context = f.type_name(CONTEXT);
                f.open(&format!(
                    "public class {} implements {initializer}<{context}> {{",
                    node.class_name
                ));
                f.line("@Override");
                f.open(&format!("public void initialize({context} context) {{"));
                self.render_body(&mut f, tree, node);
                f.close("}");
                f.close("}");
            }
            UnitKind::Fork => {
                let context = f.type_name(CONTEXT);
                f.open(&format!("public final class {} {{", node.class_name));
                f.open(&format!("public static void registerBeans({context} context) {{"));
                self.render_body(&mut f, tree, node);
                f.close("}");
                f.close("}");
            }
            UnitKind::ContextLoaders { entries } => {
                let map = f.type_name("java.util.Map");
                let supplier = f.type_name(SUPPLIER);
                let loader = f.type_name(CONTEXT_LOADER);
                let hash_map = f.type_name("java.util.LinkedHashMap");
                let aot_loader = f.type_name(AOT_CONTEXT_LOADER);
                f.open(&format!("public final class {} {{", node.class_name));
                f.open(&format!(
                    "public static {map}<String, {supplier}<{loader}>> getContextLoaders() {{"
                ));
                f.line(&format!(
                    "{map}<String, {supplier}<{loader}>> entries = new {hash_map}<>();"
                ));
                for (test_class, initializer) in entries {
                    let initializer = f.type_name(&tree.qualified_name(*initializer));
                    f.line(&format!(
                        "entries.put({}, () -> new {aot_loader}({initializer}.class));",
                        string_literal(test_class)
                    ));
                }
                f.line("return entries;");
                f.close("}");
                f.close("}");
            }
        }
        f.finish()
    }

    fn render_body(&self, f: &mut JavaFile, tree: &UnitTree, node: &UnitNode) {
        for statement in &node.statements {
            self.render_statement(f, statement);
        }
        for child in &node.children {
            let child = tree.get(*child);
            if child.kind == UnitKind::Fork {
                f.line(&format!("{}.registerBeans(context);", child.class_name));
            }
        }
    }

    fn render_statement(&self, f: &mut JavaFile, resolved: &ResolvedDefinition) {
        let definition = &resolved.definition;
        let registrar = f.type_name(REGISTRAR);
        let bean_class = self.class_literal(f, &definition.bean_type.name, resolved.type_accessible);
        let mut head = format!(
            "{registrar}.of({}, {bean_class})",
            string_literal(&definition.name)
        );
        match &resolved.instantiation {
            Instantiation::Constructor {
                parameter_types, ..
            } if !parameter_types.is_empty() => {
                let types = self.class_literals(f, parameter_types);
                head.push_str(&format!(".withConstructor({types})"));
            }
            Instantiation::FactoryMethod {
                declaring_type,
                method,
                parameter_types,
                ..
            } => {
                let declaring = self.class_literal(f, declaring_type, self.accessible(declaring_type));
                let mut args = vec![declaring, string_literal(method)];
                if !parameter_types.is_empty() {
                    args.push(self.class_literals(f, parameter_types));
                }
                head.push_str(&format!(".withFactoryMethod({})", args.join(", ")));
            }
            _ => {}
        }

        f.line(&head);
        let customizations = customizations(f, resolved);
        let tail = match customizations.as_slice() {
            [] => ".register(context);".to_string(),
            [single] => format!(".customize((bd) -> {single}).register(context);"),
            several => format!(
                ".customize((bd) -> {{ {}; }}).register(context);",
                several.join("; ")
            ),
        };

        f.indent();
        match self.supplier_body(f, resolved) {
            SupplierBody::Expression(expr) => f.line(&format!(".instanceSupplier({expr}){tail}")),
            SupplierBody::Block(lines) => {
                f.open(".instanceSupplier(() -> {");
                for line in &lines {
                    f.line(line);
                }
                f.close(&format!("}}){tail}"));
            }
        }
        f.dedent();
    }

    fn supplier_body(&self, f: &mut JavaFile, resolved: &ResolvedDefinition) -> SupplierBody {
        let definition = &resolved.definition;
        let bean_type = if resolved.type_accessible {
            f.type_ref(&definition.bean_type)
        } else {
            "Object".to_string()
        };
        let mut lines = Vec::new();
        let mut locals = HashSet::new();
        let creation = match &resolved.instantiation {
            Instantiation::Supplier { expression } => expression.clone(),
            Instantiation::Constructor {
                parameter_types,
                arguments,
                reflective,
            } => {
                let args = self.values(f, arguments);
                if *reflective {
                    let bean_utils = f.type_name(BEAN_UTILS);
                    let reflection = f.type_name(REFLECTION_UTILS);
                    let class = self.class_literal(f, &definition.bean_type.name, resolved.type_accessible);
                    let mut lookup = vec![class];
                    lookup.extend(parameter_types.iter().map(|t| self.class_literal(f, &t.name, self.accessible(&t.name))));
                    let mut call = vec![format!("{reflection}.accessibleConstructor({})", lookup.join(", "))];
                    call.extend(args);
                    format!("{bean_utils}.instantiateClass({})", call.join(", "))
                } else if arguments.is_empty() && resolved.injections.is_empty() {
                    let raw = f.type_name(&definition.bean_type.name);
                    return SupplierBody::Expression(format!("{raw}::new"));
                } else {
                    let raw = f.type_name(&definition.bean_type.name);
                    let diamond = if definition.bean_type.has_generics() { "<>" } else { "" };
                    format!("new {raw}{diamond}({})", args.join(", "))
                }
            }
            Instantiation::FactoryMethod {
                declaring_type,
                factory_bean,
                method,
                parameter_types,
                arguments,
                reflective,
            } => {
                let args = self.values(f, arguments);
                let accessible = self.accessible(declaring_type);
                let target = match factory_bean {
                    Some(bean) => {
                        let class = self.class_literal(f, declaring_type, accessible);
                        if accessible {
                            format!("context.getBean({}, {class})", string_literal(bean))
                        } else {
                            format!("context.getBean({})", string_literal(bean))
                        }
                    }
                    None => f.type_name(declaring_type),
                };
                if *reflective {
                    let reflection = f.type_name(REFLECTION_UTILS);
                    let class = self.class_literal(f, declaring_type, accessible);
                    let mut lookup = vec![class, string_literal(method)];
                    lookup.extend(parameter_types.iter().map(|t| self.class_literal(f, &t.name, self.accessible(&t.name))));
                    let method_type = f.type_name("java.lang.reflect.Method");
                    let method_var = "factoryMethod";
                    locals.insert(method_var.to_string());
                    lines.push(format!(
                        "{method_type} {method_var} = {reflection}.findMethod({});",
                        lookup.join(", ")
                    ));
                    lines.push(format!("{reflection}.makeAccessible({method_var});"));
                    let receiver = if factory_bean.is_some() { target } else { "null".to_string() };
                    let mut call = vec![method_var.to_string(), receiver];
                    call.extend(args);
                    format!("({bean_type}) {reflection}.invokeMethod({})", call.join(", "))
                } else {
                    format!("{target}.{method}({})", args.join(", "))
                }
            }
        };

        if resolved.injections.is_empty() && lines.is_empty() {
            return SupplierBody::Expression(format!("() -> {creation}"));
        }
        lines.push(format!("{bean_type} bean = {creation};"));
        let mut target = Target {
            bean_accessible: resolved.type_accessible,
            locals: &mut locals,
        };
        for injection in &resolved.injections {
            self.render_injection(f, injection, &mut target, &mut lines);
        }
        lines.push("return bean;".to_string());
        SupplierBody::Block(lines)
    }

    fn render_injection(
        &self,
        f: &mut JavaFile,
        injection: &MemberInjection,
        target: &mut Target<'_>,
        lines: &mut Vec<String>,
    ) {
        match injection {
            MemberInjection::Field {
                declaring_type,
                name,
                value,
                reflective,
                ..
            } => {
                let value = self.value(f, value);
                if *reflective {
                    let reflection = f.type_name(REFLECTION_UTILS);
                    let class = self.class_literal(f, declaring_type, self.accessible(declaring_type));
                    let field_type = f.type_name("java.lang.reflect.Field");
                    let var = target.local(&format!("{name}Field"));
                    lines.push(format!(
                        "{field_type} {var} = {reflection}.findField({class}, {});",
                        string_literal(name)
                    ));
                    lines.push(format!("{reflection}.makeAccessible({var});"));
                    lines.push(format!("{reflection}.setField({var}, bean, {value});"));
                } else {
                    let bean = target.receiver(f, declaring_type);
                    lines.push(format!("{bean}.{name} = {value};"));
                }
            }
            MemberInjection::Method {
                declaring_type,
                name,
                parameter_types,
                arguments,
                reflective,
            } => {
                let args = self.values(f, arguments);
                if *reflective {
                    let reflection = f.type_name(REFLECTION_UTILS);
                    let class = self.class_literal(f, declaring_type, self.accessible(declaring_type));
                    let mut lookup = vec![class, string_literal(name)];
                    lookup.extend(parameter_types.iter().map(|t| self.class_literal(f, &t.name, self.accessible(&t.name))));
                    let method_type = f.type_name("java.lang.reflect.Method");
                    let var = target.local(&format!("{name}Method"));
                    lines.push(format!(
                        "{method_type} {var} = {reflection}.findMethod({});",
                        lookup.join(", ")
                    ));
                    lines.push(format!("{reflection}.makeAccessible({var});"));
                    let mut call = vec![var, "bean".to_string()];
                    call.extend(args);
                    lines.push(format!("{reflection}.invokeMethod({});", call.join(", ")));
                } else {
                    let bean = target.receiver(f, declaring_type);
                    lines.push(format!("{bean}.{name}({});", args.join(", ")));
                }
            }
        }
    }

    fn values(&self, f: &mut JavaFile, values: &[ValueSource]) -> Vec<String> {
        values.iter().map(|v| self.value(f, v)).collect()
    }

    fn value(&self, f: &mut JavaFile, value: &ValueSource) -> String {
        match value {
            ValueSource::Bean { name, type_ } => self.bean_reference(f, name, type_),
            ValueSource::Beans {
                kind,
                element_type,
                names,
            } => {
                let collection = f.type_name(match kind {
                    CollectionKind::List => "java.util.List",
                    CollectionKind::Set => "java.util.Set",
                });
                let refs: Vec<String> = names
                    .iter()
                    .map(|n| self.bean_reference(f, n, element_type))
                    .collect();
                format!("{collection}.of({})", refs.join(", "))
            }
            ValueSource::Container(ContainerDependency::Context) => "context".to_string(),
            ValueSource::Container(ContainerDependency::Environment) => {
                "context.getEnvironment()".to_string()
            }
            ValueSource::Container(ContainerDependency::BeanFactory) => {
                "context.getBeanFactory()".to_string()
            }
            ValueSource::Literal(literal) => match literal {
                Literal::Str(s) => string_literal(s),
                Literal::Bool(b) => b.to_string(),
                Literal::Int(i) => i.to_string(),
                Literal::Long(l) => format!("{l}L"),
                Literal::Float(v) => format!("{v}f"),
                Literal::Double(v) => format!("{v}d"),
                Literal::Char(c) => char_literal(*c),
                Literal::Enum {
                    type_name,
                    constant,
                } => format!("{}.{constant}", f.type_name(type_name)),
            },
            ValueSource::Null => "null".to_string(),
        }
    }

    fn bean_reference(&self, f: &mut JavaFile, name: &str, type_: &ResolvableType) -> String {
        if type_.is_primitive() || !self.accessible(&type_.name) {
            return format!("context.getBean({})", string_literal(name));
        }
        let class = f.type_name(&type_.name);
        format!("context.getBean({}, {class}.class)", string_literal(name))
    }

    fn class_literals(&self, f: &mut JavaFile, types: &[ResolvableType]) -> String {
        types
            .iter()
            .map(|t| self.class_literal(f, &t.name, self.accessible(&t.name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn class_literal(&self, f: &mut JavaFile, name: &str, accessible: bool) -> String {
        if accessible {
            format!("{}.class", f.type_name(name))
        } else {
            let class_utils = f.type_name(CLASS_UTILS);
            format!(
                "{class_utils}.resolveClassName({}, context.getClassLoader())",
                string_literal(name)
            )
        }
    }

    /// Whether generated code in the tree's package can name the type.
    fn accessible(&self, name: &str) -> bool {
        self.index
            .get(name)
            .map_or(true, |d| d.visibility.is_accessible_from(d.package(), self.package))
    }
}

/// The instance being injected inside one supplier body.
struct Target<'a> {
    bean_accessible: bool,
    locals: &'a mut HashSet<String>,
}

impl Target<'_> {
    /// A local variable name not yet declared in the body.
    fn local(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 1;
        while !self.locals.insert(name.clone()) {
            name = format!("{base}{n}");
            n += 1;
        }
        name
    }

    /// Expression for `bean` typed as `declaring_type`; `bean` is an
    /// `Object` when its own type cannot be named.
    fn receiver(&self, f: &mut JavaFile, declaring_type: &str) -> String {
        if self.bean_accessible {
            "bean".to_string()
        } else {
            format!("(({}) bean)", f.type_name(declaring_type))
        }
    }
}

enum SupplierBody {
    Expression(String),
    Block(Vec<String>),
}

fn customizations(f: &mut JavaFile, resolved: &ResolvedDefinition) -> Vec<String> {
    let definition = &resolved.definition;
    let mut out = Vec::new();
    if definition.primary {
        out.push("bd.setPrimary(true)".to_string());
    }
    if definition.synthetic {
        out.push("bd.setSynthetic(true)".to_string());
    }
    if definition.role == Role::Infrastructure {
        let bean_definition = f.type_name(BEAN_DEFINITION);
        out.push(format!("bd.setRole({bean_definition}.ROLE_INFRASTRUCTURE)"));
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::definition::ComponentDefinition;

    fn resolved(name: &str, type_: &str, arguments: Vec<ValueSource>) -> ResolvedDefinition {
        ResolvedDefinition {
            definition: ComponentDefinition::new(name, ResolvableType::of(type_)),
            type_accessible: true,
            instantiation: Instantiation::Constructor {
                parameter_types: arguments
                    .iter()
                    .map(|_| ResolvableType::of("com.example.Repo"))
                    .collect(),
                arguments,
                reflective: false,
            },
            injections: Vec::new(),
        }
    }

    fn bean(name: &str) -> ValueSource {
        ValueSource::Bean {
            name: name.into(),
            type_: ResolvableType::of("com.example.Repo"),
        }
    }

    fn names(ordered: &[ResolvedDefinition]) -> Vec<&str> {
        ordered.iter().map(|r| r.definition.name.as_str()).collect()
    }

    #[test]
    fn dependencies_come_first_and_independent_order_is_kept() {
        let ordered = order(vec![
            resolved("service", "com.example.Service", vec![bean("repo")]),
            resolved("clock", "com.example.Clock", Vec::new()),
            resolved("repo", "com.example.Repo", Vec::new()),
            resolved("unknown", "com.example.Unknown", vec![bean("notInGraph")]),
        ])
        .unwrap();
        assert_eq!(names(&ordered), ["clock", "repo", "service", "unknown"]);
    }

    #[test]
    fn cycles_are_reported_in_graph_order() {
        let err = order(vec![
            resolved("a", "com.example.A", vec![bean("b")]),
            resolved("c", "com.example.C", Vec::new()),
            resolved("b", "com.example.B", vec![bean("a")]),
        ])
        .unwrap_err();
        match err {
            GenerationError::DependencyCycle { definitions } => assert_eq!(definitions, ["a", "b"]),
            other => unreachable!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overflow_goes_to_numbered_forks() {
        let index = TypeIndex::new();
        let synthesizer = CodeSynthesizer::new(&index, "com.example", 2);
        let mut tree = UnitTree::new("com.example");
        let mut registry = NativeConfigurationRegistry::new();
        let definitions = (0..5)
            .map(|i| resolved(&format!("bean{i}"), "com.example.Bean", Vec::new()))
            .collect();
        let root = synthesizer
            .synthesize(&mut tree, None, "ContextBootstrapInitializer", definitions, &mut registry)
            .unwrap();

        let classes: Vec<_> = tree.iter().map(|n| n.class_name.as_str()).collect();
        assert_eq!(
            classes,
            [
                "ContextBootstrapInitializer",
                "ContextBootstrapInitializerFork1",
                "ContextBootstrapInitializerFork2"
            ]
        );
        assert_eq!(tree.statement_count(), 5);
        assert_eq!(tree.get(root).children.len(), 2);
        assert!(registry
            .reflection()
            .contains_key("com.example.ContextBootstrapInitializer"));

        let rendered = synthesizer.render(&tree);
        let root_source = &rendered[0].1;
        let first = root_source.find("ContextBootstrapInitializerFork1.registerBeans(context);").unwrap();
        let second = root_source.find("ContextBootstrapInitializerFork2.registerBeans(context);").unwrap();
        assert!(first < second);
        assert!(rendered[1].1.contains("public static void registerBeans(GenericApplicationContext context) {"));
    }

    #[test]
    fn statements_render_constructor_and_supplier() {
        let index = TypeIndex::new();
        let synthesizer = CodeSynthesizer::new(&index, "com.example", 200);
        let mut tree = UnitTree::new("com.example");
        let mut registry = NativeConfigurationRegistry::new();
        let mut repo = resolved("repo", "com.example.Repo", Vec::new());
        repo.definition.primary = true;
        let definitions = vec![
            resolved("service", "com.example.Service", vec![bean("repo")]),
            repo,
        ];
        synthesizer
            .synthesize(&mut tree, None, "ContextBootstrapInitializer", definitions, &mut registry)
            .unwrap();
        let source = &synthesizer.render(&tree)[0].1;
        assert!(source.starts_with(crate::emit::GENERATED_HEADER));
        assert!(source.contains(
            "BeanDefinitionRegistrar.of(\"repo\", Repo.class)\n      \
             .instanceSupplier(Repo::new).customize((bd) -> bd.setPrimary(true)).register(context);"
        ));
        assert!(source.contains(
            "BeanDefinitionRegistrar.of(\"service\", Service.class).withConstructor(Repo.class)\n      \
             .instanceSupplier(() -> new Service(context.getBean(\"repo\", Repo.class))).register(context);"
        ));
        assert!(source.find("\"repo\"").unwrap() < source.find("\"service\"").unwrap());
        assert!(source.contains("public class ContextBootstrapInitializer implements ApplicationContextInitializer<GenericApplicationContext> {"));
    }

    #[test]
    fn reflective_members_use_reflection_utilities() {
        let index = TypeIndex::new();
        let synthesizer = CodeSynthesizer::new(&index, "com.example", 200);
        let mut tree = UnitTree::new("com.example");
        let mut registry = NativeConfigurationRegistry::new();
        let mut service = resolved("service", "com.example.Service", Vec::new());
        service.injections = vec![
            MemberInjection::Field {
                declaring_type: "com.example.Service".into(),
                name: "repo".into(),
                type_: ResolvableType::of("com.example.Repo"),
                value: bean("repo"),
                reflective: true,
            },
            MemberInjection::Field {
                declaring_type: "com.example.Service".into(),
                name: "port".into(),
                type_: ResolvableType::of("long"),
                value: ValueSource::Literal(Literal::Long(8080)),
                reflective: false,
            },
        ];
        synthesizer
            .synthesize(&mut tree, None, "Init", vec![service], &mut registry)
            .unwrap();
        let source = &synthesizer.render(&tree)[0].1;
        assert!(source.contains("Field repoField = ReflectionUtils.findField(Service.class, \"repo\");"));
        assert!(source.contains("ReflectionUtils.setField(repoField, bean, context.getBean(\"repo\", Repo.class));"));
        assert!(source.contains("bean.port = 8080L;"));
        assert!(source.contains("import java.lang.reflect.Field;"));
        assert!(source.contains("return bean;"));
    }

    #[test]
    fn members_sharing_a_name_get_distinct_locals() {
        let index = TypeIndex::new();
        let synthesizer = CodeSynthesizer::new(&index, "com.example", 200);
        let mut tree = UnitTree::new("com.example");
        let mut registry = NativeConfigurationRegistry::new();
        let mut service = resolved("service", "com.example.Service", Vec::new());
        service.injections = ["com.example.Base", "com.example.Service"]
            .into_iter()
            .map(|owner| MemberInjection::Field {
                declaring_type: owner.into(),
                name: "repo".into(),
                type_: ResolvableType::of("com.example.Repo"),
                value: bean("repo"),
                reflective: true,
            })
            .collect();
        synthesizer
            .synthesize(&mut tree, None, "Init", vec![service], &mut registry)
            .unwrap();
        let source = &synthesizer.render(&tree)[0].1;
        assert_eq!(source.matches("Field repoField =").count(), 1);
        assert!(source.contains("Field repoField = ReflectionUtils.findField(Base.class, \"repo\");"));
        assert!(source.contains("Field repoField1 = ReflectionUtils.findField(Service.class, \"repo\");"));
        assert!(source.contains("ReflectionUtils.setField(repoField1, bean, context.getBean(\"repo\", Repo.class));"));
    }

    #[test]
    fn hidden_beans_are_cast_to_the_declaring_type() {
        let index = TypeIndex::new();
        let synthesizer = CodeSynthesizer::new(&index, "com.example", 200);
        let mut tree = UnitTree::new("com.example");
        let mut registry = NativeConfigurationRegistry::new();
        let mut service = resolved("service", "com.example.internal.Service", Vec::new());
        service.type_accessible = false;
        service.instantiation = Instantiation::Constructor {
            parameter_types: Vec::new(),
            arguments: Vec::new(),
            reflective: true,
        };
        service.injections = vec![
            MemberInjection::Field {
                declaring_type: "com.example.Base".into(),
                name: "name".into(),
                type_: ResolvableType::of("java.lang.String"),
                value: ValueSource::Literal(Literal::Str("demo".into())),
                reflective: false,
            },
            MemberInjection::Method {
                declaring_type: "com.example.Base".into(),
                name: "setRepo".into(),
                parameter_types: vec![ResolvableType::of("com.example.Repo")],
                arguments: vec![bean("repo")],
                reflective: false,
            },
        ];
        synthesizer
            .synthesize(&mut tree, None, "Init", vec![service], &mut registry)
            .unwrap();
        let source = &synthesizer.render(&tree)[0].1;
        assert!(source.contains("Object bean = BeanUtils.instantiateClass("));
        assert!(source.contains("((Base) bean).name = \"demo\";"));
        assert!(source.contains("((Base) bean).setRepo(context.getBean(\"repo\", Repo.class));"));
        assert!(!source.contains("bean.name"));
    }
}
