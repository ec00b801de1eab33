use std::io::Write;
use std::path::PathBuf;

use weave_lookup::{find_source, ClasspathEntryKind, SourceMatch, SourceSearchDirective};
use zip::write::FileOptions;

#[test]
fn first_matching_directive_wins() {
    let tmp = tempfile::tempdir().unwrap();
    let generated = tmp.path().join("generated");
    let main = tmp.path().join("src/main/java");
    for root in [&generated, &main] {
        std::fs::create_dir_all(root.join("com/example")).unwrap();
        std::fs::write(root.join("com/example/A.java"), "class A {}").unwrap();
    }

    let directives = vec![
        SourceSearchDirective::Dependency {
            entry_kind: ClasspathEntryKind::Jar,
            location: tmp.path().join("missing.jar"),
            sources: None,
        },
        SourceSearchDirective::OutputBinding {
            output_dir: tmp.path().join("target/classes"),
            source_root: main.clone(),
        },
        SourceSearchDirective::ProjectFallback {
            project: "app".to_owned(),
            source_roots: vec![generated.clone(), main.clone()],
        },
    ];

    assert_eq!(
        find_source(&directives, "com/example/A.java"),
        Some(SourceMatch::File {
            path: main.join("com/example/A.java")
        })
    );
    assert_eq!(find_source(&directives, "com/example/B.java"), None);
    assert_eq!(find_source(&directives, ""), None);
}

#[test]
fn source_jars_are_searched_by_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let sources = tmp.path().join("dep-1.0-sources.jar");
    let mut jar = zip::ZipWriter::new(std::fs::File::create(&sources).unwrap());
    jar.start_file("org/dep/Util.java", FileOptions::<()>::default())
        .unwrap();
    jar.write_all(b"class Util {}").unwrap();
    jar.finish().unwrap();

    let directives = vec![SourceSearchDirective::Dependency {
        entry_kind: ClasspathEntryKind::Jar,
        location: PathBuf::from("/repo/dep-1.0.jar"),
        sources: Some(sources.clone()),
    }];

    assert_eq!(
        find_source(&directives, "org/dep/Util.java"),
        Some(SourceMatch::ArchiveEntry {
            archive: sources,
            entry: "org/dep/Util.java".to_owned(),
        })
    );
    assert_eq!(find_source(&directives, "org/dep/Other.java"), None);
}

#[test]
fn corrupt_archives_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let bogus = tmp.path().join("bogus.jar");
    std::fs::write(&bogus, b"not a zip").unwrap();
    let src = tmp.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("A.java"), "class A {}").unwrap();

    let directives = vec![
        SourceSearchDirective::Dependency {
            entry_kind: ClasspathEntryKind::Jar,
            location: bogus,
            sources: None,
        },
        SourceSearchDirective::ProjectFallback {
            project: "app".to_owned(),
            source_roots: vec![src.clone()],
        },
    ];
    assert_eq!(
        find_source(&directives, "A.java"),
        Some(SourceMatch::File {
            path: src.join("A.java")
        })
    );
}

#[test]
fn entry_kind_decides_how_a_dependency_is_searched() {
    let tmp = tempfile::tempdir().unwrap();
    let classes = tmp.path().join("dep/classes");
    std::fs::create_dir_all(classes.join("org/dep")).unwrap();
    std::fs::write(classes.join("org/dep/Util.java"), "class Util {}").unwrap();

    let as_kind = |entry_kind| {
        vec![SourceSearchDirective::Dependency {
            entry_kind,
            location: classes.clone(),
            sources: None,
        }]
    };

    assert_eq!(
        find_source(&as_kind(ClasspathEntryKind::Directory), "org/dep/Util.java"),
        Some(SourceMatch::File {
            path: classes.join("org/dep/Util.java")
        })
    );
    // A directory is never opened as an archive.
    assert_eq!(
        find_source(&as_kind(ClasspathEntryKind::Jar), "org/dep/Util.java"),
        None
    );
}

#[test]
fn attached_source_directory_is_searched_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let sources = tmp.path().join("dep-src");
    std::fs::create_dir_all(sources.join("org/dep")).unwrap();
    std::fs::write(sources.join("org/dep/Util.java"), "class Util {}").unwrap();

    let directives = vec![SourceSearchDirective::Dependency {
        entry_kind: ClasspathEntryKind::Jar,
        location: tmp.path().join("dep.jar"),
        sources: Some(sources.clone()),
    }];
    assert_eq!(
        find_source(&directives, "org/dep/Util.java"),
        Some(SourceMatch::File {
            path: sources.join("org/dep/Util.java")
        })
    );
}
