//! Where to look for a project's sources.
//!
//! A [`ProjectDescriber`] walks a [`JavaProject`] and emits
//! [`SourceSearchDirective`]s in priority order; [`DescriberRegistry`] runs
//! every registered describer and concatenates their output. [`find_source`]
//! resolves a source path against a directive list.

mod describer;
mod directive;
mod error;
mod find;
mod model;

pub use crate::describer::{DefaultProjectDescriber, DescriberRegistry, ProjectDescriber};
pub use crate::directive::SourceSearchDirective;
pub use crate::error::{ManifestError, ProjectDescribeError, RegisterError};
pub use crate::find::{find_source, SourceMatch};
pub use crate::model::{
    ClasspathEntry, ClasspathEntryKind, Dependency, JavaProject, OutputBinding, OutputDir,
    ProjectManifest, ProjectModel,
};
