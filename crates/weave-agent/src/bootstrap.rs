//! Access to the runtime's own classes, used by the capability probe.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use zip::ZipArchive;

/// Reads class files from the runtime's bootstrap class path.
pub trait BootstrapClasses {
    /// Returns the bytes of `internal_name` (e.g. `java/lang/Object`), or
    /// `Ok(None)` when the class is not present.
    fn read_class(&self, internal_name: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

impl<F> BootstrapClasses for F
where
    F: Fn(&str) -> anyhow::Result<Option<Vec<u8>>>,
{
    fn read_class(&self, internal_name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        self(internal_name)
    }
}

/// Bootstrap classes stored in an exploded directory, a jar (`rt.jar`) or a
/// jmod (`java.base.jmod`, which keeps classes under `classes/`).
#[derive(Clone, Debug)]
pub struct BootstrapArchive {
    path: PathBuf,
}

impl BootstrapArchive {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads one entry. Returns `Ok(None)` when it isn't present.
    pub fn read(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        if self.path.is_dir() {
            self.read_exploded(name)
        } else {
            self.read_zipped(name)
        }
    }

    fn read_exploded(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let file = self.path.join(name);
        if !file.is_file() {
            return Ok(None);
        }
        std::fs::read(&file)
            .map(Some)
            .with_context(|| format!("cannot read bootstrap class {}", file.display()))
    }

    fn read_zipped(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let archive = self.path.display();
        let file =
            File::open(&self.path).with_context(|| format!("cannot open {archive}"))?;
        let mut zip =
            ZipArchive::new(file).with_context(|| format!("{archive} is not a zip archive"))?;

        let mut entry = match zip.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("cannot locate {name} in {archive}")),
        };
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("cannot inflate {name} from {archive}"))?;
        Ok(Some(bytes))
    }
}

impl BootstrapClasses for BootstrapArchive {
    fn read_class(&self, internal_name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let entry = format!("{internal_name}.class");
        if let Some(bytes) = self.read(&entry)? {
            return Ok(Some(bytes));
        }
        self.read(&format!("classes/{entry}"))
    }
}
