use std::path::{Component, Path, PathBuf};

use url::Url;
use weave_config::PathPolicy;

/// Where a class's bytes came from, derived from the loader's code source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CodeLocation {
    /// An exploded class directory (`file:/work/app/target/classes/`).
    Directory(PathBuf),
    /// A jar or zip file (`file:/repo/lib.jar`, `jar:file:/repo/lib.jar!/`).
    Archive(PathBuf),
    /// No code source, or one that does not map to the filesystem (`jrt:/java.base`).
    Unknown,
}

impl CodeLocation {
    /// Interprets a code-source URL.
    ///
    /// Purely syntactic: the filesystem is never consulted. A `file:` URL with a
    /// trailing `/` is a directory, anything else an archive.
    pub fn from_code_source(location: Option<&str>) -> Self {
        location
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .and_then(parse_location)
            .unwrap_or(CodeLocation::Unknown)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            CodeLocation::Directory(path) | CodeLocation::Archive(path) => Some(path),
            CodeLocation::Unknown => None,
        }
    }

    pub fn is_resolvable(&self) -> bool {
        self.path().is_some()
    }

    /// The string recorded in the class for this location.
    pub fn canonical_path(&self, policy: &PathPolicy) -> Option<String> {
        let path = self.path()?;
        let rendered = match policy {
            PathPolicy::Absolute => path.to_string_lossy().into_owned(),
            PathPolicy::ProjectRelative { root } => match path.strip_prefix(root) {
                Ok(relative) if relative.as_os_str().is_empty() => ".".to_owned(),
                Ok(relative) => slash_joined(relative),
                Err(_) => path.to_string_lossy().into_owned(),
            },
        };
        Some(rendered)
    }
}

fn parse_location(text: &str) -> Option<CodeLocation> {
    if let Some(inner) = text.strip_prefix("jar:") {
        // `jar:<archive-url>!/<entry>`; for nested jars the outermost archive is
        // the one on disk.
        let archive = inner.split_once("!/").map_or(inner, |(archive, _)| archive);
        let path = match parse_location(archive)? {
            CodeLocation::Directory(path) | CodeLocation::Archive(path) => path,
            CodeLocation::Unknown => return None,
        };
        return Some(CodeLocation::Archive(path));
    }

    let url = Url::parse(text).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    let is_dir = url.path().ends_with('/');
    let path = normalize(&url.to_file_path().ok()?);
    Some(if is_dir {
        CodeLocation::Directory(path)
    } else {
        CodeLocation::Archive(path)
    })
}

/// Drops trailing separators and `.` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn slash_joined(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
