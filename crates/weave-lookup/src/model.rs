use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, ProjectDescribeError};

/// The view of a build project the describers need.
///
/// Entry lists return one `Result` per declared entry so a describer can skip
/// the entries that fail to resolve and still describe the rest.
pub trait JavaProject {
    fn name(&self) -> &str;

    /// Whether the project carries Java sources at all. Describers emit nothing
    /// for projects that don't.
    fn is_source_project(&self) -> bool;

    /// Classpath entries in declared order.
    fn dependencies(&self) -> Vec<Result<Dependency, ProjectDescribeError>>;

    /// Output directories paired with the source root compiled into each, in
    /// declared order.
    fn output_bindings(&self) -> Vec<Result<OutputBinding, ProjectDescribeError>>;

    fn source_roots(&self) -> Vec<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClasspathEntryKind {
    Directory,
    Jar,
}

impl ClasspathEntryKind {
    /// Guesses the kind from the file name alone.
    pub fn infer(path: &Path) -> Self {
        let is_archive = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"));
        if is_archive {
            ClasspathEntryKind::Jar
        } else {
            ClasspathEntryKind::Directory
        }
    }
}

/// A resolved classpath entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub kind: ClasspathEntryKind,
    pub location: PathBuf,
    pub sources: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputBinding {
    pub output_dir: PathBuf,
    pub source_root: PathBuf,
}

/// On-disk project description (`weave-project.toml` or `.json`).
///
/// ```toml
/// name = "app"
/// source_roots = ["src/main/java"]
///
/// [[classpath]]
/// path = "lib/dep-1.0.jar"
/// sources = "lib/dep-1.0-sources.jar"
///
/// [[output_dirs]]
/// path = "target/classes"
/// source_root = "src/main/java"
/// ```
///
/// Relative paths are resolved against `root`, which itself defaults to the
/// manifest's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    pub name: String,

    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default = "ProjectManifest::default_source_project")]
    pub source_project: bool,

    #[serde(default)]
    pub source_roots: Vec<PathBuf>,

    #[serde(default)]
    pub classpath: Vec<ClasspathEntry>,

    /// A file holding extra classpath entries, one per line or separated by the
    /// platform path separator (the output of `mvn dependency:build-classpath`).
    #[serde(default)]
    pub classpath_file: Option<PathBuf>,

    #[serde(default)]
    pub output_dirs: Vec<OutputDir>,
}

impl ProjectManifest {
    fn default_source_project() -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClasspathEntry {
    pub path: PathBuf,
    /// Inferred from the extension when absent.
    #[serde(default)]
    pub kind: Option<ClasspathEntryKind>,
    #[serde(default)]
    pub sources: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDir {
    pub path: PathBuf,
    pub source_root: PathBuf,
}

/// A [`ProjectManifest`] anchored at a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectModel {
    manifest: ProjectManifest,
    root: PathBuf,
}

impl ProjectModel {
    pub fn new(manifest: ProjectManifest, base_dir: &Path) -> Self {
        let root = match &manifest.root {
            Some(root) => base_dir.join(root),
            None => base_dir.to_path_buf(),
        };
        Self { manifest, root }
    }

    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self, ManifestError> {
        let manifest: ProjectManifest = toml::from_str(text)?;
        Ok(Self::new(manifest, base_dir))
    }

    pub fn from_json_str(text: &str, base_dir: &Path) -> Result<Self, ManifestError> {
        let manifest: ProjectManifest = serde_json::from_str(text)?;
        Ok(Self::new(manifest, base_dir))
    }

    /// Loads a manifest; `.json` files are read as JSON, everything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text, base_dir)
        } else {
            Self::from_toml_str(&text, base_dir)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn classpath_file_entries(&self, file: &Path) -> Result<Vec<PathBuf>, ProjectDescribeError> {
        let file = self.resolve(file);
        let text = std::fs::read_to_string(&file).map_err(|err| ProjectDescribeError::Unreadable {
            path: file.clone(),
            reason: err.to_string(),
        })?;

        let mut entries = Vec::new();
        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            entries.extend(
                std::env::split_paths(line)
                    .filter(|path| !path.as_os_str().is_empty())
                    .map(|path| self.resolve(&path)),
            );
        }
        Ok(entries)
    }
}

impl JavaProject for ProjectModel {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn is_source_project(&self) -> bool {
        self.manifest.source_project
    }

    fn dependencies(&self) -> Vec<Result<Dependency, ProjectDescribeError>> {
        let mut out: Vec<_> = self
            .manifest
            .classpath
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                if entry.path.as_os_str().is_empty() {
                    return Err(ProjectDescribeError::MissingPath {
                        section: "classpath",
                        index,
                    });
                }
                Ok(Dependency {
                    kind: entry
                        .kind
                        .unwrap_or_else(|| ClasspathEntryKind::infer(&entry.path)),
                    location: self.resolve(&entry.path),
                    sources: entry
                        .sources
                        .as_deref()
                        .filter(|path| !path.as_os_str().is_empty())
                        .map(|path| self.resolve(path)),
                })
            })
            .collect();

        if let Some(file) = &self.manifest.classpath_file {
            match self.classpath_file_entries(file) {
                Ok(entries) => out.extend(entries.into_iter().map(|location| {
                    Ok(Dependency {
                        kind: ClasspathEntryKind::infer(&location),
                        location,
                        sources: None,
                    })
                })),
                Err(err) => out.push(Err(err)),
            }
        }
        out
    }

    fn output_bindings(&self) -> Vec<Result<OutputBinding, ProjectDescribeError>> {
        self.manifest
            .output_dirs
            .iter()
            .enumerate()
            .map(|(index, dir)| {
                if dir.path.as_os_str().is_empty() || dir.source_root.as_os_str().is_empty() {
                    return Err(ProjectDescribeError::MissingPath {
                        section: "output_dirs",
                        index,
                    });
                }
                Ok(OutputBinding {
                    output_dir: self.resolve(&dir.path),
                    source_root: self.resolve(&dir.source_root),
                })
            })
            .collect()
    }

    /// Declared roots first, then roots only named by an output directory.
    fn source_roots(&self) -> Vec<PathBuf> {
        let declared = self.manifest.source_roots.iter();
        let bound = self.manifest.output_dirs.iter().map(|dir| &dir.source_root);

        let mut roots: Vec<PathBuf> = Vec::new();
        for root in declared.chain(bound) {
            if root.as_os_str().is_empty() {
                continue;
            }
            let root = self.resolve(root);
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        roots
    }
}
