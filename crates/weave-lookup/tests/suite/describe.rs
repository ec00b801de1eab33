use std::path::PathBuf;
use std::sync::Arc;

use weave_lookup::{
    ClasspathEntryKind, DefaultProjectDescriber, Dependency, DescriberRegistry, JavaProject,
    OutputBinding, ProjectDescribeError, ProjectDescriber, RegisterError, SourceSearchDirective,
};

#[derive(Default)]
struct FakeProject {
    source_project: bool,
    dependencies: Vec<Result<Dependency, ProjectDescribeError>>,
    bindings: Vec<Result<OutputBinding, ProjectDescribeError>>,
    source_roots: Vec<PathBuf>,
}

impl JavaProject for FakeProject {
    fn name(&self) -> &str {
        "app"
    }

    fn is_source_project(&self) -> bool {
        self.source_project
    }

    fn dependencies(&self) -> Vec<Result<Dependency, ProjectDescribeError>> {
        self.dependencies.clone()
    }

    fn output_bindings(&self) -> Vec<Result<OutputBinding, ProjectDescribeError>> {
        self.bindings.clone()
    }

    fn source_roots(&self) -> Vec<PathBuf> {
        self.source_roots.clone()
    }
}

fn jar(path: &str) -> Dependency {
    Dependency {
        kind: ClasspathEntryKind::Jar,
        location: PathBuf::from(path),
        sources: None,
    }
}

fn binding(out: &str, src: &str) -> OutputBinding {
    OutputBinding {
        output_dir: PathBuf::from(out),
        source_root: PathBuf::from(src),
    }
}

fn two_deps_one_binding() -> FakeProject {
    FakeProject {
        source_project: true,
        dependencies: vec![Ok(jar("/repo/a.jar")), Ok(jar("/repo/b.jar"))],
        bindings: vec![Ok(binding("/work/app/out1", "/work/app/src1"))],
        source_roots: vec![PathBuf::from("/work/app/src1")],
    }
}

#[test]
fn dependencies_then_bindings_then_fallback() {
    let directives = DefaultProjectDescriber.describe(&two_deps_one_binding());
    assert_eq!(
        directives,
        vec![
            SourceSearchDirective::Dependency {
                entry_kind: ClasspathEntryKind::Jar,
                location: PathBuf::from("/repo/a.jar"),
                sources: None,
            },
            SourceSearchDirective::Dependency {
                entry_kind: ClasspathEntryKind::Jar,
                location: PathBuf::from("/repo/b.jar"),
                sources: None,
            },
            SourceSearchDirective::OutputBinding {
                output_dir: PathBuf::from("/work/app/out1"),
                source_root: PathBuf::from("/work/app/src1"),
            },
            SourceSearchDirective::ProjectFallback {
                project: "app".to_owned(),
                source_roots: vec![PathBuf::from("/work/app/src1")],
            },
        ]
    );
}

#[test]
fn non_source_project_yields_nothing() {
    let project = FakeProject {
        source_project: false,
        ..two_deps_one_binding()
    };
    assert!(DefaultProjectDescriber.describe(&project).is_empty());
    assert!(DescriberRegistry::default().describe_all(&project).is_empty());
}

#[test]
fn empty_source_project_still_gets_a_fallback() {
    let project = FakeProject {
        source_project: true,
        ..FakeProject::default()
    };
    assert_eq!(
        DefaultProjectDescriber.describe(&project),
        vec![SourceSearchDirective::ProjectFallback {
            project: "app".to_owned(),
            source_roots: Vec::new(),
        }]
    );
}

#[test]
fn unresolvable_entries_are_skipped() {
    let project = FakeProject {
        source_project: true,
        dependencies: vec![
            Ok(jar("/repo/a.jar")),
            Err(ProjectDescribeError::MissingPath {
                section: "classpath",
                index: 1,
            }),
            Ok(jar("/repo/c.jar")),
        ],
        bindings: vec![
            Err(ProjectDescribeError::MissingPath {
                section: "output_dirs",
                index: 0,
            }),
            Ok(binding("/work/app/out1", "/work/app/src1")),
        ],
        source_roots: Vec::new(),
    };

    let directives = DefaultProjectDescriber.describe(&project);
    assert_eq!(directives.len(), 4);
    assert!(matches!(
        &directives[1],
        SourceSearchDirective::Dependency { location, .. } if location == &PathBuf::from("/repo/c.jar")
    ));
    assert!(matches!(
        &directives[2],
        SourceSearchDirective::OutputBinding { .. }
    ));
}

#[test]
fn describing_twice_gives_the_same_answer() {
    let project = two_deps_one_binding();
    let registry = DescriberRegistry::default();
    assert_eq!(registry.describe_all(&project), registry.describe_all(&project));
}

struct Generated;

impl ProjectDescriber for Generated {
    fn id(&self) -> &str {
        "generated"
    }

    fn describe(&self, project: &dyn JavaProject) -> Vec<SourceSearchDirective> {
        vec![SourceSearchDirective::ProjectFallback {
            project: format!("{}-generated", project.name()),
            source_roots: vec![PathBuf::from("/work/app/target/generated-sources")],
        }]
    }
}

struct Exploding;

impl ProjectDescriber for Exploding {
    fn id(&self) -> &str {
        "exploding"
    }

    fn describe(&self, _: &dyn JavaProject) -> Vec<SourceSearchDirective> {
        panic!("describer bug")
    }
}

#[test]
fn registry_concatenates_in_registration_order() {
    let mut registry = DescriberRegistry::default();
    registry.register(Arc::new(Generated)).unwrap();
    assert_eq!(
        registry.register(Arc::new(Generated)),
        Err(RegisterError::DuplicateId {
            id: "generated".to_owned()
        })
    );
    assert_eq!(registry.ids().collect::<Vec<_>>(), ["default", "generated"]);

    let directives = registry.describe_all(&two_deps_one_binding());
    assert_eq!(directives.len(), 5);
    assert_eq!(
        directives.last(),
        Some(&SourceSearchDirective::ProjectFallback {
            project: "app-generated".to_owned(),
            source_roots: vec![PathBuf::from("/work/app/target/generated-sources")],
        })
    );
}

#[test]
fn panicking_describer_is_ignored() {
    let mut registry = DescriberRegistry::empty();
    registry.register(Arc::new(Exploding)).unwrap();
    registry.register(Arc::new(DefaultProjectDescriber)).unwrap();

    let directives = registry.describe_all(&two_deps_one_binding());
    assert_eq!(directives, DefaultProjectDescriber.describe(&two_deps_one_binding()));
}
