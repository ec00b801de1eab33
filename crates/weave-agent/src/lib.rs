//! Load-time weaving agent that stamps every loaded class with the filesystem
//! location it was loaded from.
//!
//! [`Agent::attach`] probes the runtime once; if its class files can be read,
//! a [`SourceLocationHook`] is registered with the runtime's
//! [`Instrumentation`]. From then on every class defined from a directory or
//! archive gets a `SourceLocation` attribute naming that directory or archive,
//! which debuggers use to pick the right source file when several projects
//! contain the same class name.

mod agent;
mod bootstrap;
mod error;
mod location;
mod transform;

pub use crate::agent::{
    probe, Agent, AgentOptions, AgentState, ClassLoadHook, Instrumentation, LoadEvent,
    SourceLocationHook, TransformerChain, PROBE_CLASS,
};
pub use crate::bootstrap::{BootstrapArchive, BootstrapClasses};
pub use crate::error::{AgentError, TransformError};
pub use crate::location::CodeLocation;
pub use crate::transform::SourceMetadataTransformer;
