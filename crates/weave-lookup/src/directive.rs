use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::model::ClasspathEntryKind;

/// One place a debugger should look for sources, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSearchDirective {
    /// A classpath entry (jar or class directory), with its attached sources if known.
    Dependency {
        entry_kind: ClasspathEntryKind,
        location: PathBuf,
        sources: Option<PathBuf>,
    },
    /// A compiled-output directory and the source root it is built from.
    OutputBinding {
        output_dir: PathBuf,
        source_root: PathBuf,
    },
    /// The project itself, searched through all its source roots.
    ProjectFallback {
        project: String,
        source_roots: Vec<PathBuf>,
    },
}

impl SourceSearchDirective {
    /// Directories or archives that may contain source files for this
    /// directive, each with how it should be searched.
    ///
    /// Attached sources are classified by file name; a dependency without
    /// sources is searched as the kind of classpath entry it is.
    pub fn candidate_roots(&self) -> Vec<(&Path, ClasspathEntryKind)> {
        match self {
            SourceSearchDirective::Dependency {
                sources: Some(sources),
                ..
            } => vec![(sources.as_path(), ClasspathEntryKind::infer(sources))],
            SourceSearchDirective::Dependency {
                entry_kind,
                location,
                sources: None,
            } => vec![(location.as_path(), *entry_kind)],
            SourceSearchDirective::OutputBinding { source_root, .. } => {
                vec![(source_root.as_path(), ClasspathEntryKind::Directory)]
            }
            SourceSearchDirective::ProjectFallback { source_roots, .. } => source_roots
                .iter()
                .map(|root| (root.as_path(), ClasspathEntryKind::Directory))
                .collect(),
        }
    }
}
