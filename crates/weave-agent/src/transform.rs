use weave_classfile::{ClassFile, SourceLocationUpdate};
use weave_config::PathPolicy;

use crate::error::TransformError;
use crate::location::CodeLocation;

/// Records each class's code location in a `SourceLocation` attribute.
///
/// Stateless apart from the path policy, so one instance can serve every
/// class-loading thread.
#[derive(Debug, Clone, Default)]
pub struct SourceMetadataTransformer {
    policy: PathPolicy,
}

impl SourceMetadataTransformer {
    pub fn new(policy: PathPolicy) -> Self {
        Self { policy }
    }

    /// Returns the rewritten class, or `None` to keep the original bytes.
    ///
    /// `None` covers both "nothing to do" (already annotated with this
    /// location) and every failure; failures are logged at `debug`.
    pub fn transform(&self, class_bytes: &[u8], location: &CodeLocation) -> Option<Vec<u8>> {
        match self.try_transform(class_bytes, location) {
            Ok(out) => out,
            Err(err) => {
                tracing::debug!(
                    target: "weave.agent",
                    error = %err,
                    "class left unchanged"
                );
                None
            }
        }
    }

    /// Like [`Self::transform`], but reports why a class was not rewritten.
    pub fn try_transform(
        &self,
        class_bytes: &[u8],
        location: &CodeLocation,
    ) -> Result<Option<Vec<u8>>, TransformError> {
        let path = location
            .canonical_path(&self.policy)
            .ok_or(TransformError::UnresolvableLocation)?;

        let mut class = ClassFile::parse(class_bytes)?;
        match class.set_source_location(&path)? {
            SourceLocationUpdate::Unchanged => Ok(None),
            SourceLocationUpdate::Inserted | SourceLocationUpdate::Replaced => {
                Ok(Some(class.to_bytes()))
            }
        }
    }
}
