//! End-to-end generation runs over applications written to temporary
//! directories.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use aot_codegen::context::NATIVE_CONFIG_PATH;
use aot_codegen::error::ResolutionFailure;
use aot_codegen::{generate, ApplicationStructure, AotOptions, AotPhase, GenerationError, Mode};
use aot_model::annotations::{COMPONENT, SPRING_BOOT_APPLICATION};
use aot_model::properties::AUTO_CONFIGURATION_KEY;
use aot_model::{
    BeanDeclaration, Condition, ConstructorDescriptor, FieldDescriptor, MethodDescriptor,
    NativeHint, ParameterDescriptor, ResolvableType, ResourceHint, TestContextDeclaration,
    TypeDescriptor, TypeKind,
};
use tempfile::TempDir;

struct App {
    dir: TempDir,
    types: Vec<TypeDescriptor>,
}

impl App {
    fn new() -> Self {
        let mut app = TypeDescriptor::class("com.example.DemoApplication");
        app.annotations = vec![SPRING_BOOT_APPLICATION.to_string()];
        app.component_scan = Some(Vec::new());
        Self {
            dir: tempfile::tempdir().unwrap(),
            types: vec![app],
        }
    }

    fn with(mut self, desc: TypeDescriptor) -> Self {
        self.types.push(desc);
        self
    }

    fn resource(self, path: &str, content: &str) -> Self {
        let file = self.resources_dir().join(path);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, content).unwrap();
        self
    }

    fn classes_dir(&self) -> PathBuf {
        self.dir.path().join("classes")
    }

    fn resources_dir(&self) -> PathBuf {
        self.dir.path().join("resources")
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("generated")
    }

    fn structure(&self) -> ApplicationStructure {
        let classes = self.classes_dir();
        std::fs::create_dir_all(&classes).unwrap();
        let metadata = serde_json::json!({ "types": self.types });
        std::fs::write(classes.join("app.types.json"), metadata.to_string()).unwrap();
        std::fs::create_dir_all(self.resources_dir()).unwrap();
        ApplicationStructure {
            sources_path: self.out().join("sources"),
            resources_path: self.out().join("resources"),
            resource_folders: vec![self.resources_dir()],
            classes_folders: vec![classes],
            application_class: None,
        }
    }

    fn run(&self, options: AotOptions) -> Result<aot_codegen::GenerationReport, GenerationError> {
        generate(options, AotPhase::Main, &self.structure())
    }

    fn initializer(&self) -> String {
        read(&self.out().join("sources/com/example/ContextBootstrapInitializer.java"))
    }

    fn descriptor(&self, name: &str) -> serde_json::Value {
        let path = self.out().join("resources").join(NATIVE_CONFIG_PATH).join(name);
        serde_json::from_str(&read(&path)).unwrap()
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| unreachable!("{}: {e}", path.display()))
}

fn component(name: &str) -> TypeDescriptor {
    let mut desc = TypeDescriptor::class(name);
    desc.annotations = vec![COMPONENT.to_string()];
    desc
}

fn param(name: &str, type_: &str) -> ParameterDescriptor {
    ParameterDescriptor {
        name: name.into(),
        type_: type_.parse().unwrap(),
        ..ParameterDescriptor::default()
    }
}

fn with_constructor(mut desc: TypeDescriptor, params: Vec<ParameterDescriptor>) -> TypeDescriptor {
    desc.constructors.push(ConstructorDescriptor {
        parameters: params,
        ..ConstructorDescriptor::default()
    });
    desc
}

fn implementing(name: &str, interface: &str) -> TypeDescriptor {
    let mut desc = component(name);
    desc.interfaces = vec![interface.to_string()];
    desc
}

fn interface(name: &str) -> TypeDescriptor {
    let mut desc = TypeDescriptor::class(name);
    desc.kind = TypeKind::Interface;
    desc
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| (e.path().to_path_buf(), read(e.path())))
        .collect()
}

#[test]
fn single_component_is_registered_once_under_its_name() {
    let app = App::new().with(component("com.example.Greeter"));
    let report = app.run(AotOptions::default()).unwrap();

    let source = app.initializer();
    assert_eq!(source.matches("BeanDefinitionRegistrar.of(\"greeter\", Greeter.class)").count(), 1);
    assert!(source.contains(".instanceSupplier(Greeter::new).register(context);"));
    assert!(!source.contains("internalAutowiredAnnotationProcessor"));
    assert_eq!(report.definitions, 2);
    assert_eq!(report.units, 1);
    assert!(report
        .files
        .contains(&app.out().join("sources/com/example/ContextBootstrapInitializer.java")));
}

#[test]
fn single_candidate_is_wired_into_the_constructor() {
    let app = App::new()
        .with(with_constructor(
            component("com.example.Service"),
            vec![param("repo", "com.example.Repo")],
        ))
        .with(component("com.example.Repo"));
    app.run(AotOptions::default()).unwrap();

    let source = app.initializer();
    assert!(source.contains(
        ".instanceSupplier(() -> new Service(context.getBean(\"repo\", Repo.class))).register(context);"
    ));
    assert!(source.find("of(\"repo\"").unwrap() < source.find("of(\"service\"").unwrap());
}

#[test]
fn two_unqualified_candidates_fail_naming_definition_and_type() {
    let app = App::new()
        .with(with_constructor(
            component("com.example.Service"),
            vec![param("store", "com.example.Store")],
        ))
        .with(interface("com.example.Store"))
        .with(implementing("com.example.JdbcStore", "com.example.Store"))
        .with(implementing("com.example.MemoryStore", "com.example.Store"));

    let err = app.run(AotOptions::default()).unwrap_err();
    match &err {
        GenerationError::Resolution {
            definition,
            required_type,
            reason,
            ..
        } => {
            assert_eq!(definition, "service");
            assert_eq!(required_type, "com.example.Store");
            assert_eq!(
                reason,
                &ResolutionFailure::MultipleCandidates(vec!["jdbcStore".into(), "memoryStore".into()])
            );
        }
        other => unreachable!("unexpected {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("'service'"));
    assert!(message.contains("com.example.Store"));
}

#[test]
fn private_field_injection_goes_through_reflection() {
    let mut service = component("com.example.Service");
    service.fields = vec![FieldDescriptor {
        name: "repo".into(),
        type_: ResolvableType::of("com.example.Repo"),
        inject: true,
        ..FieldDescriptor::default()
    }];
    let app = App::new().with(service).with(component("com.example.Repo"));
    app.run(AotOptions::default()).unwrap();

    let source = app.initializer();
    assert!(source.contains("ReflectionUtils.findField(Service.class, \"repo\");"));
    assert!(source.contains("ReflectionUtils.setField(repoField, bean, context.getBean(\"repo\", Repo.class));"));

    let reflection = app.descriptor("reflect-config.json");
    let entries = reflection.as_array().unwrap();
    let service = entries
        .iter()
        .find(|e| e["name"] == "com.example.Service")
        .unwrap();
    assert_eq!(service["fields"], serde_json::json!([{"name": "repo", "allowWrite": true}]));
}

#[test]
fn equally_eligible_constructors_are_ambiguous() {
    let mut service = component("com.example.Service");
    service.constructors = vec![
        ConstructorDescriptor {
            parameters: vec![param("repo", "com.example.Repo")],
            ..ConstructorDescriptor::default()
        },
        ConstructorDescriptor {
            parameters: vec![param("clock", "com.example.Clock")],
            ..ConstructorDescriptor::default()
        },
    ];
    let app = App::new()
        .with(service)
        .with(component("com.example.Repo"))
        .with(component("com.example.Clock"));
    match app.run(AotOptions::default()).unwrap_err() {
        GenerationError::AmbiguousConstruction {
            type_name,
            candidates,
            ..
        } => {
            assert_eq!(type_name, "com.example.Service");
            assert_eq!(
                candidates,
                [
                    "com.example.Service(com.example.Repo)",
                    "com.example.Service(com.example.Clock)"
                ]
            );
        }
        other => unreachable!("unexpected {other:?}"),
    }
}

#[test]
fn generation_is_byte_identical_across_runs() {
    let app = App::new()
        .with(with_constructor(
            component("com.example.Service"),
            vec![param("repo", "com.example.Repo")],
        ))
        .with(component("com.example.Repo"))
        .resource("templates/index.html", "<html/>");

    app.run(AotOptions::default()).unwrap();
    let first = snapshot(&app.out());
    app.run(AotOptions::default()).unwrap();
    let second = snapshot(&app.out());
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn excluded_types_never_appear_in_generated_code() {
    let app = App::new()
        .with(component("com.example.Greeter"))
        .with(component("com.example.Repo"));
    let options = AotOptions {
        exclude_types: vec!["com.example.Greeter".into()],
        ..AotOptions::default()
    };
    app.run(options).unwrap();
    let source = app.initializer();
    assert!(!source.contains("\"greeter\""));
    assert!(source.contains("\"repo\""));
}

#[test]
fn excluding_a_configuration_drops_its_bean_methods() {
    let mut config = component("com.example.AppConfig");
    config.annotations.push(aot_model::annotations::CONFIGURATION.to_string());
    config.methods = vec![MethodDescriptor {
        name: "clock".into(),
        return_type: ResolvableType::of("java.time.Clock"),
        bean: Some(BeanDeclaration::default()),
        ..MethodDescriptor::default()
    }];
    let app = App::new().with(config).with(component("com.example.Repo"));
    let options = AotOptions {
        exclude_types: vec!["com.example.AppConfig".into()],
        ..AotOptions::default()
    };
    app.run(options).unwrap();
    let source = app.initializer();
    assert!(!source.contains("\"appConfig\""));
    assert!(!source.contains("\"clock\""));
    assert!(source.contains("\"repo\""));
}

#[test]
fn resources_covered_by_a_broad_pattern_are_not_added() {
    let mut hinted = component("com.example.WebConfig");
    hinted.hints = vec![NativeHint {
        resources: vec![ResourceHint {
            patterns: vec!["^static/.*".into()],
            bundles: Vec::new(),
        }],
        ..NativeHint::default()
    }];
    let app = App::new()
        .with(hinted)
        .resource("static/css/site.css", "body {}")
        .resource("templates/index.html", "<html/>")
        .resource("META-INF/native-image/extra/reflect-config.json", "[]");
    app.run(AotOptions::default()).unwrap();

    let resources = app.descriptor("resource-config.json");
    let patterns: Vec<&str> = resources["resources"]["includes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["pattern"].as_str().unwrap())
        .collect();
    assert!(patterns.contains(&"^static/.*"));
    assert!(patterns.contains(&"templates/index.html"));
    assert!(!patterns.contains(&"static/css/site.css"));
    assert!(!patterns.iter().any(|p| p.starts_with("META-INF/native-image")));
}

#[test]
fn large_contexts_are_split_into_forks() {
    let mut app = App::new();
    for name in ["Alpha", "Bravo", "Charlie", "Delta", "Echo"] {
        app = app.with(component(&format!("com.example.{name}")));
    }
    let options = AotOptions {
        max_statements_per_unit: 2,
        ..AotOptions::default()
    };
    let report = app.run(options).unwrap();
    assert_eq!(report.units, 3);
    let root = app.initializer();
    assert!(root.contains("ContextBootstrapInitializerFork1.registerBeans(context);"));
    assert!(root.contains("ContextBootstrapInitializerFork2.registerBeans(context);"));
    let fork = read(&app.out().join("sources/com/example/ContextBootstrapInitializerFork2.java"));
    assert!(fork.contains("public final class ContextBootstrapInitializerFork2 {"));
}

#[test]
fn native_agent_mode_writes_no_descriptor() {
    let app = App::new().with(component("com.example.Greeter"));
    let options = AotOptions {
        mode: Mode::NativeAgent,
        remove_xml_support: true,
        ..AotOptions::default()
    };
    let report = app.run(options).unwrap();
    let dir = app.out().join("resources").join(NATIVE_CONFIG_PATH);
    assert!(dir.is_dir());
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    assert!(report.files.iter().all(|f| f.extension().is_some_and(|e| e == "java")));
}

#[test]
fn removed_subsystems_become_build_arguments() {
    let app = App::new().with(component("com.example.Greeter"));
    let options = AotOptions {
        remove_jmx_support: true,
        ..AotOptions::default()
    };
    app.run(options).unwrap();
    let properties = read(
        &app.out()
            .join("resources")
            .join(NATIVE_CONFIG_PATH)
            .join("native-image.properties"),
    );
    assert_eq!(properties, "Args = -Dspring.native.remove-jmx-support=true\n");
}

#[test]
fn user_definitions_win_over_conditional_auto_configuration() {
    let mut user_config = component("com.example.JsonConfig");
    user_config.annotations.push(aot_model::annotations::CONFIGURATION.to_string());
    user_config.methods = vec![MethodDescriptor {
        name: "objectMapper".into(),
        return_type: ResolvableType::of("com.fasterxml.jackson.databind.ObjectMapper"),
        bean: Some(BeanDeclaration::default()),
        ..MethodDescriptor::default()
    }];

    let mut auto = TypeDescriptor::class("com.acme.JacksonAutoConfiguration");
    auto.annotations = vec![aot_model::annotations::AUTO_CONFIGURATION.to_string()];
    auto.methods = vec![
        MethodDescriptor {
            name: "jacksonObjectMapper".into(),
            return_type: ResolvableType::of("com.fasterxml.jackson.databind.ObjectMapper"),
            bean: Some(BeanDeclaration {
                conditions: vec![Condition::OnMissingBean(
                    "com.fasterxml.jackson.databind.ObjectMapper".into(),
                )],
                ..BeanDeclaration::default()
            }),
            ..MethodDescriptor::default()
        },
        MethodDescriptor {
            name: "jsonClock".into(),
            return_type: ResolvableType::of("java.time.Clock"),
            bean: Some(BeanDeclaration::default()),
            ..MethodDescriptor::default()
        },
    ];

    let app = App::new()
        .with(user_config)
        .with(auto)
        .resource(
            "META-INF/spring.factories",
            &format!("{AUTO_CONFIGURATION_KEY}=com.acme.JacksonAutoConfiguration\n"),
        );
    app.run(AotOptions::default()).unwrap();

    let source = app.initializer();
    assert!(source.contains("of(\"objectMapper\""));
    assert!(!source.contains("jacksonObjectMapper"));
    assert!(source.contains(
        ".withFactoryMethod(JacksonAutoConfiguration.class, \"jsonClock\")"
    ));
    assert!(source.contains("context.getBean(\"com.acme.JacksonAutoConfiguration\", JacksonAutoConfiguration.class).jsonClock()"));
}

#[test]
fn values_are_resolved_against_application_properties() {
    let mut port = param("port", "int");
    port.value = Some("${server.port:8080}".into());
    let mut name = param("name", "java.lang.String");
    name.value = Some("${app.name}".into());
    let app = App::new()
        .with(with_constructor(component("com.example.Server"), vec![port, name]))
        .resource("application.properties", "app.name=demo\nserver.port=9090\n");
    app.run(AotOptions::default()).unwrap();
    assert!(app
        .initializer()
        .contains(".instanceSupplier(() -> new Server(9090, \"demo\")).register(context);"));
}

#[test]
fn test_classes_get_one_context_per_declaration() {
    let test = |name: &str| {
        let mut desc = TypeDescriptor::class(name);
        desc.test_context = Some(TestContextDeclaration::default());
        desc
    };
    let app = App::new()
        .with(component("com.example.Greeter"))
        .with(test("com.example.GreeterTests"))
        .with(test("com.example.WebTests"));
    let structure = app.structure();
    let report = generate(AotOptions::default(), AotPhase::Test, &structure).unwrap();

    let sources = app.out().join("sources/org/springframework/aot");
    let root = read(&sources.join("TestContextBootstrapInitializer.java"));
    assert!(root.contains("public static Map<String, Supplier<SmartContextLoader>> getContextLoaders() {"));
    assert!(root.contains(
        "entries.put(\"com.example.GreeterTests\", () -> new SpringBootAotContextLoader(TestContextBootstrapInitializer0.class));"
    ));
    let context = read(&sources.join("TestContextBootstrapInitializer0.java"));
    assert!(context.contains("AOT generated context for {@code GreeterTests} and {@code WebTests}."));
    assert!(context.contains("of(\"greeter\", Greeter.class)"));
    assert_eq!(report.units, 2);
}

#[test]
fn test_profiles_bring_their_property_files() {
    let mut feature = component("com.example.Feature");
    feature.conditions = vec![Condition::OnProperty {
        name: "feature.enabled".into(),
        having_value: Some("true".into()),
        match_if_missing: false,
    }];
    let mut it = TypeDescriptor::class("com.example.ItTests");
    it.test_context = Some(TestContextDeclaration {
        active_profiles: vec!["it".into()],
        ..TestContextDeclaration::default()
    });
    let app = App::new()
        .with(feature)
        .with(it)
        .resource("application.properties", "feature.enabled=false\n")
        .resource("application-it.properties", "feature.enabled=true\n");
    let structure = app.structure();
    generate(AotOptions::default(), AotPhase::Test, &structure).unwrap();

    let context = read(&app.out().join("sources/org/springframework/aot/ItTestsContextInitializer.java"));
    assert!(context.contains("of(\"feature\", Feature.class)"));
}
