use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::directive::SourceSearchDirective;
use crate::error::RegisterError;
use crate::model::JavaProject;

/// Turns a project into source-search directives.
pub trait ProjectDescriber: Send + Sync {
    /// Stable identifier, used to deduplicate registrations.
    fn id(&self) -> &str;

    fn describe(&self, project: &dyn JavaProject) -> Vec<SourceSearchDirective>;
}

/// Dependencies first, then output bindings, then the project itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProjectDescriber;

impl DefaultProjectDescriber {
    pub const ID: &'static str = "default";
}

impl ProjectDescriber for DefaultProjectDescriber {
    fn id(&self) -> &str {
        Self::ID
    }

    fn describe(&self, project: &dyn JavaProject) -> Vec<SourceSearchDirective> {
        let name = project.name();
        if !project.is_source_project() {
            tracing::debug!(
                target: "weave.lookup",
                project = name,
                "not a source project; nothing to describe"
            );
            return Vec::new();
        }

        let mut directives = Vec::new();

        for dependency in project.dependencies() {
            match dependency {
                Ok(dependency) => directives.push(SourceSearchDirective::Dependency {
                    entry_kind: dependency.kind,
                    location: dependency.location,
                    sources: dependency.sources,
                }),
                Err(err) => tracing::debug!(
                    target: "weave.lookup",
                    project = name,
                    error = %err,
                    "skipping classpath entry"
                ),
            }
        }

        for binding in project.output_bindings() {
            match binding {
                Ok(binding) => directives.push(SourceSearchDirective::OutputBinding {
                    output_dir: binding.output_dir,
                    source_root: binding.source_root,
                }),
                Err(err) => tracing::debug!(
                    target: "weave.lookup",
                    project = name,
                    error = %err,
                    "skipping output directory"
                ),
            }
        }

        directives.push(SourceSearchDirective::ProjectFallback {
            project: name.to_owned(),
            source_roots: project.source_roots(),
        });
        directives
    }
}

/// The set of describers consulted for every project.
///
/// Describers run in registration order and their directives are
/// concatenated. A describer that panics contributes nothing.
#[derive(Clone)]
pub struct DescriberRegistry {
    describers: Vec<Arc<dyn ProjectDescriber>>,
}

impl DescriberRegistry {
    pub fn empty() -> Self {
        Self {
            describers: Vec::new(),
        }
    }

    /// Adds a describer after the ones already registered. Ids must be unique.
    pub fn register(&mut self, describer: Arc<dyn ProjectDescriber>) -> Result<(), RegisterError> {
        if self.describers.iter().any(|d| d.id() == describer.id()) {
            return Err(RegisterError::DuplicateId {
                id: describer.id().to_owned(),
            });
        }
        self.describers.push(describer);
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.describers.iter().map(|d| d.id())
    }

    pub fn describe_all(&self, project: &dyn JavaProject) -> Vec<SourceSearchDirective> {
        let mut out = Vec::new();
        for describer in &self.describers {
            match panic::catch_unwind(AssertUnwindSafe(|| describer.describe(project))) {
                Ok(directives) => out.extend(directives),
                Err(_) => tracing::warn!(
                    target: "weave.lookup",
                    describer = describer.id(),
                    project = project.name(),
                    "project describer panicked; its directives are ignored"
                ),
            }
        }
        out
    }
}

impl Default for DescriberRegistry {
    /// A registry holding only [`DefaultProjectDescriber`].
    fn default() -> Self {
        let default: Arc<dyn ProjectDescriber> = Arc::new(DefaultProjectDescriber);
        Self {
            describers: vec![default],
        }
    }
}

impl std::fmt::Debug for DescriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
