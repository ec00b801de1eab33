use thiserror::Error;

/// Why a class was left untouched.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("code location does not resolve to a filesystem path")]
    UnresolvableLocation,
    #[error("malformed classfile: {0}")]
    Format(#[from] weave_classfile::Error),
}

/// Why the capability probe refused to enable the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to read bootstrap class {class}: {reason}")]
    BootstrapUnavailable { class: &'static str, reason: String },
    #[error("bootstrap class {class} not found")]
    BootstrapMissing { class: &'static str },
    #[error("cannot parse bootstrap class {class}: {source}")]
    UnsupportedRuntime {
        class: &'static str,
        #[source]
        source: weave_classfile::Error,
    },
    #[error("capability probe panicked: {0}")]
    ProbePanicked(String),
}
