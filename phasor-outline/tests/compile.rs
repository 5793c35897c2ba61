use std::path::{Path, PathBuf};

use phasor_core::{CompilePolicy, CompilerConfig, ImplicitSourcePolicy, Phase};
use phasor_outline::{BuilderProcessor, OutlineBackend, OutlineFrontend};
use phasor_pipeline::{CompileOutcome, ExitStatus, Pipeline, Processor};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn source(&self, name: &str, content: &str) -> PathBuf {
        write(&self.dir.path().join("src"), name, content)
    }

    fn library(&self, name: &str, content: &str) -> PathBuf {
        write(&self.dir.path().join("lib"), name, content)
    }

    fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn compile(&self, config: CompilerConfig, sources: &[PathBuf]) -> CompileOutcome {
        self.compile_with(config, sources, Vec::new())
    }

    fn compile_with(
        &self,
        config: CompilerConfig,
        sources: &[PathBuf],
        processors: Vec<Box<dyn Processor>>,
    ) -> CompileOutcome {
        Pipeline::new(
            config,
            OutlineFrontend::new().with_sourcepath(vec![self.dir.path().join("lib")]),
            OutlineBackend::new().with_out_dir(self.out_dir()),
        )
        .compile(sources, &[], processors)
    }

    fn class_file(&self, class: &str) -> String {
        std::fs::read_to_string(self.out_dir().join(format!("{}.json", class))).unwrap()
    }
}

fn messages(outcome: &CompileOutcome) -> Vec<String> {
    outcome
        .diagnostics
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

const SHAPE: &str = r#"
[[type]]
name = "Shape"
members = ["name", "area()"]
"#;

const POINT: &str = r#"
[[type]]
name = "Point"
extends = "Shape"
members = ["x", "y", "area()"]
"#;

#[test]
fn test_compile_writes_class_files() {
    let project = Project::new();
    let point = project.source("Point.toml", POINT);
    let shape = project.source("Shape.toml", SHAPE);

    let outcome = project.compile(CompilerConfig::default(), &[point, shape]);

    assert_eq!(outcome.status, ExitStatus::Ok);
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(outcome.emitted_classes(), vec!["Point", "Shape"]);
    assert_eq!(outcome.emitted[0].path, project.out_dir().join("Point.json"));

    insta::assert_snapshot!(project.class_file("Point").trim_end(), @r#"
    {
      "class": "Point",
      "extends": "Shape",
      "members": [
        "x",
        "y",
        "area()",
        "x()",
        "y()",
        "bridge name() -> Shape"
      ]
    }
    "#);
    insta::assert_snapshot!(project.class_file("Shape").trim_end(), @r#"
    {
      "class": "Shape",
      "members": [
        "name",
        "area()",
        "name()"
      ]
    }
    "#);
}

#[test]
fn test_every_generating_policy_writes_the_same_classes() {
    for policy in [
        CompilePolicy::Simple,
        CompilePolicy::ByFile,
        CompilePolicy::ByTodo,
    ] {
        let project = Project::new();
        let point = project.source("Point.toml", POINT);
        let shape = project.source("Shape.toml", SHAPE);

        let outcome = project.compile(CompilerConfig::default().with_policy(policy), &[point, shape]);

        assert_eq!(outcome.status, ExitStatus::Ok, "{policy}");
        let mut classes = outcome.emitted_classes();
        classes.sort();
        assert_eq!(classes, vec!["Point", "Shape"], "{policy}");
    }
}

#[test]
fn test_check_policy_writes_nothing() {
    let project = Project::new();
    let point = project.source("Point.toml", POINT);
    let shape = project.source("Shape.toml", SHAPE);

    let outcome = project.compile(
        CompilerConfig::default().with_policy(CompilePolicy::CheckOnly),
        &[point, shape],
    );

    assert_eq!(outcome.status, ExitStatus::Ok);
    assert!(outcome.emitted.is_empty());
    assert!(!project.out_dir().exists());
}

#[test]
fn test_supertype_found_on_sourcepath() {
    let cases = [
        (ImplicitSourcePolicy::Class, vec!["Point", "Shape"]),
        (ImplicitSourcePolicy::None, vec!["Point"]),
    ];
    for (implicit, expected) in cases {
        let project = Project::new();
        let point = project.source("Point.toml", POINT);
        project.library("Shape.toml", SHAPE);

        let outcome = project.compile(CompilerConfig::default().with_implicit(implicit), &[point]);

        assert_eq!(outcome.status, ExitStatus::Ok, "{implicit:?}");
        assert_eq!(outcome.emitted_classes(), expected, "{implicit:?}");
        // the bridge needs the implicit supertype flowed either way
        assert!(project.class_file("Point").contains("bridge name() -> Shape"));
    }
}

#[test]
fn test_unknown_supertype() {
    let project = Project::new();
    let orphan = project.source(
        "Orphan.toml",
        "[[type]]\nname = \"Orphan\"\nextends = \"Missing\"\n",
    );

    let outcome = project.compile(CompilerConfig::default(), &[orphan.clone()]);

    assert_eq!(outcome.status, ExitStatus::Error);
    let diag = outcome.diagnostics.errors().next().unwrap();
    assert_eq!(diag.message, "cannot find symbol: class Missing");
    assert_eq!(diag.phase, Some(Phase::Attr));
    assert_eq!(diag.location.as_deref(), Some(orphan.display().to_string().as_str()));
    assert!(outcome.emitted.is_empty());
}

#[test]
fn test_builtin_supertype_needs_no_declaration() {
    let project = Project::new();
    let plain = project.source("Plain.toml", "[[type]]\nname = \"Plain\"\nextends = \"Object\"\n");

    let outcome = project.compile(CompilerConfig::default(), &[plain]);

    assert_eq!(outcome.status, ExitStatus::Ok);
    assert!(project.class_file("Plain").contains("\"extends\": \"Object\""));
}

#[test]
fn test_attribution_diagnostics() {
    let project = Project::new();
    let legacy = project.source(
        "Legacy.toml",
        "[[type]]\nname = \"Legacy\"\ndeprecated = true\n",
    );
    let modern = project.source(
        "Modern.toml",
        "[[type]]\nname = \"Modern\"\nextends = \"Legacy\"\nmembers = [\"id\", \"id\"]\n",
    );

    let outcome = project.compile(
        CompilerConfig::default().with_stop_after(Phase::Generate),
        &[legacy, modern],
    );

    assert_eq!(outcome.status, ExitStatus::Error);
    assert_eq!(
        messages(&outcome),
        vec![
            "Modern extends deprecated type Legacy",
            "id is already defined in Modern"
        ]
    );
}

#[test]
fn test_self_extension_is_an_error() {
    let project = Project::new();
    let looped = project.source("Loop.toml", "[[type]]\nname = \"Loop\"\nextends = \"Loop\"\n");

    let outcome = project.compile(CompilerConfig::default(), &[looped]);

    assert_eq!(outcome.status, ExitStatus::Error);
    assert!(messages(&outcome).contains(&"Loop cannot extend itself".to_string()));
}

#[test]
fn test_nested_types_are_flattened() {
    let project = Project::new();
    let outer = project.source(
        "Outer.toml",
        r#"
[[type]]
name = "Outer"

[[type.nested]]
name = "Inner"
members = ["value"]

[[type.nested]]
name = "Derived"
extends = "Inner"
"#,
    );

    let outcome = project.compile(CompilerConfig::default(), &[outer]);

    assert_eq!(outcome.status, ExitStatus::Ok);
    assert_eq!(
        outcome.emitted_classes(),
        vec!["Outer", "Outer$Inner", "Outer$Derived"]
    );
    insta::assert_snapshot!(project.class_file("Outer$Derived").trim_end(), @r#"
    {
      "class": "Outer$Derived",
      "extends": "Outer$Inner",
      "members": [
        "bridge value() -> Outer$Inner"
      ]
    }
    "#);
}

#[test]
fn test_nested_type_extending_later_file() {
    for policy in [CompilePolicy::ByTodo, CompilePolicy::ByFile, CompilePolicy::Simple] {
        let project = Project::new();
        let outer = project.source(
            "Outer.toml",
            r#"
[[type]]
name = "Outer"

[[type.nested]]
name = "Inner"
extends = "Base"
"#,
        );
        let base = project.source("Base.toml", "[[type]]\nname = \"Base\"\nmembers = [\"id\"]\n");

        let outcome = project.compile(CompilerConfig::default().with_policy(policy), &[outer, base]);

        assert_eq!(outcome.status, ExitStatus::Ok, "{policy}: {:?}", outcome.fault);
        let mut classes = outcome.emitted_classes();
        classes.sort();
        assert_eq!(classes, vec!["Base", "Outer", "Outer$Inner"], "{policy}");
        assert!(project.class_file("Outer$Inner").contains("bridge id() -> Base"));
    }
}

#[test]
fn test_parse_error_is_reported_with_location() {
    let project = Project::new();
    let broken = project.source("Broken.toml", "[[type]]\nname = \n");
    let shape = project.source("Shape.toml", SHAPE);

    let frontend = OutlineFrontend::new();
    let failures = frontend.failures();
    let outcome = Pipeline::new(
        CompilerConfig::default(),
        frontend,
        OutlineBackend::new().with_out_dir(project.out_dir()),
    )
    .compile(&[broken.clone(), shape], &[], Vec::new());

    assert_eq!(outcome.status, ExitStatus::Error);
    assert_eq!(outcome.error_count(), 1);
    let diag = outcome.diagnostics.errors().next().unwrap();
    assert_eq!(diag.phase, Some(Phase::Parse));
    let location = diag.location.as_deref().unwrap();
    assert!(location.starts_with(&format!("{}:2:", broken.display())));
    assert_eq!(failures.len(), 1);
    assert!(outcome.emitted.is_empty());
}

#[test]
fn test_missing_source_file() {
    let project = Project::new();
    let missing = project.dir.path().join("src/Missing.toml");

    let outcome = project.compile(CompilerConfig::default(), &[missing.clone()]);

    assert_eq!(outcome.status, ExitStatus::Error);
    let diag = outcome.diagnostics.errors().next().unwrap();
    assert!(diag.message.starts_with("failed to read"));
    assert_eq!(diag.location.as_deref(), Some(missing.display().to_string().as_str()));
}

#[test]
fn test_builder_processor_generates_compiled_builders() {
    let project = Project::new();
    let point = project.source(
        "Point.toml",
        "[[type]]\nname = \"Point\"\nannotations = [\"builder\"]\nmembers = [\"x\", \"y\", \"norm()\"]\n",
    );

    let outcome = project.compile_with(
        CompilerConfig::default(),
        &[point],
        vec![Box::new(BuilderProcessor::default())],
    );

    assert_eq!(outcome.status, ExitStatus::Ok);
    assert_eq!(outcome.emitted_classes(), vec!["Point", "PointBuilder"]);
    insta::assert_snapshot!(project.class_file("PointBuilder").trim_end(), @r#"
    {
      "class": "PointBuilder",
      "members": [
        "with_x()",
        "with_y()",
        "build()"
      ]
    }
    "#);
}

#[test]
fn test_builder_processor_with_proc_only() {
    let project = Project::new();
    let point = project.source(
        "Point.toml",
        "[[type]]\nname = \"Point\"\nannotations = [\"builder\"]\nmembers = [\"x\"]\n",
    );

    let outcome = project.compile_with(
        CompilerConfig::default().with_proc(phasor_core::ProcMode::Only),
        &[point],
        vec![Box::new(BuilderProcessor::default())],
    );

    assert_eq!(outcome.status, ExitStatus::Ok);
    assert!(outcome.emitted.is_empty());
}
