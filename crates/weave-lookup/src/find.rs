use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;
use zip::ZipArchive;

use crate::directive::SourceSearchDirective;
use crate::model::ClasspathEntryKind;

/// Where a source file was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceMatch {
    File { path: PathBuf },
    ArchiveEntry { archive: PathBuf, entry: String },
}

/// Resolves `relative` (e.g. `com/example/A.java`) against the directives in
/// order; the first root that contains it wins.
///
/// Directory roots are checked on disk, jar roots by entry name. Roots that
/// don't exist or can't be opened are skipped.
pub fn find_source(directives: &[SourceSearchDirective], relative: &str) -> Option<SourceMatch> {
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }

    directives
        .iter()
        .flat_map(SourceSearchDirective::candidate_roots)
        .find_map(|(root, kind)| lookup(root, kind, relative))
}

fn lookup(root: &Path, kind: ClasspathEntryKind, relative: &str) -> Option<SourceMatch> {
    match kind {
        ClasspathEntryKind::Directory => {
            let candidate = root.join(relative);
            candidate
                .is_file()
                .then_some(SourceMatch::File { path: candidate })
        }
        ClasspathEntryKind::Jar => {
            (root.is_file() && archive_contains(root, relative)).then(|| SourceMatch::ArchiveEntry {
                archive: root.to_path_buf(),
                entry: relative.to_owned(),
            })
        }
    }
}

fn archive_contains(archive: &Path, entry: &str) -> bool {
    let opened = File::open(archive)
        .map_err(|err| err.to_string())
        .and_then(|file| ZipArchive::new(file).map_err(|err| err.to_string()));
    match opened {
        Ok(mut zip) => zip.by_name(entry).is_ok(),
        Err(err) => {
            tracing::debug!(
                target: "weave.lookup",
                archive = %archive.display(),
                error = %err,
                "skipping unreadable source archive"
            );
            false
        }
    }
}
