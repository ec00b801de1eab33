//! Agent lifecycle: probe the runtime once, then install the class-load hook.
//!
//! ```text
//! Unattached --attach--> ProbeRunning --ok--> Active
//!                                     \--err-> Disabled
//! ```
//!
//! `Active` and `Disabled` are terminal. A disabled agent never registers its
//! hook, so the runtime keeps running without source-location weaving.

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use weave_classfile::ClassFile;
use weave_config::{AgentConfig, PathPolicy};

use crate::bootstrap::BootstrapClasses;
use crate::error::{AgentError, TransformError};
use crate::location::CodeLocation;
use crate::transform::SourceMetadataTransformer;

/// The class loaded by the capability probe. Every runtime has it, and its
/// class-file version tracks the runtime's.
pub const PROBE_CLASS: &str = "java/lang/Object";

/// Options passed on the agent command line (`-javaagent:weave.jar=<options>`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentOptions {
    pub debuglog: bool,
}

impl AgentOptions {
    /// Only the exact string `debuglog` is recognised; anything else is ignored.
    pub fn parse(args: Option<&str>) -> Self {
        Self {
            debuglog: args == Some("debuglog"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Unattached,
    ProbeRunning,
    Active,
    Disabled,
}

/// One class-definition event as seen by a hook.
#[derive(Debug, Clone, Copy)]
pub struct LoadEvent<'a> {
    /// Internal name (`com/example/A`). Absent for hidden and lambda classes.
    pub class_name: Option<&'a str>,
    /// Code-source URL of the defining class's protection domain, if any.
    pub code_source: Option<&'a str>,
    pub class_bytes: &'a [u8],
}

/// Observes class definitions and may replace the bytes being defined.
pub trait ClassLoadHook: Send + Sync {
    /// `None` keeps the current bytes.
    fn on_load(&self, event: &LoadEvent<'_>) -> Option<Vec<u8>>;
}

/// The runtime's instrumentation facility.
pub trait Instrumentation {
    fn add_transformer(&mut self, hook: Arc<dyn ClassLoadHook>);
}

/// In-process stand-in for the runtime's transformer chain: hooks run in
/// registration order and each one sees the previous hook's output.
#[derive(Default)]
pub struct TransformerChain {
    hooks: Vec<Arc<dyn ClassLoadHook>>,
}

impl TransformerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook over a class being defined and returns the bytes the
    /// runtime would define.
    pub fn define_class<'a>(&self, event: LoadEvent<'a>) -> Cow<'a, [u8]> {
        let mut current = Cow::Borrowed(event.class_bytes);
        for hook in &self.hooks {
            let seen = LoadEvent {
                class_bytes: &current,
                ..event
            };
            if let Some(replaced) = hook.on_load(&seen) {
                current = Cow::Owned(replaced);
            }
        }
        current
    }
}

impl Instrumentation for TransformerChain {
    fn add_transformer(&mut self, hook: Arc<dyn ClassLoadHook>) {
        self.hooks.push(hook);
    }
}

impl std::fmt::Debug for TransformerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerChain")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// The hook the agent installs.
///
/// Failures of any kind, including panics, are contained here: the class is
/// defined with its original bytes and loading continues.
#[derive(Debug, Clone)]
pub struct SourceLocationHook {
    transformer: Arc<SourceMetadataTransformer>,
    debuglog: bool,
}

impl SourceLocationHook {
    pub fn new(transformer: Arc<SourceMetadataTransformer>, debuglog: bool) -> Self {
        Self {
            transformer,
            debuglog,
        }
    }
}

impl ClassLoadHook for SourceLocationHook {
    fn on_load(&self, event: &LoadEvent<'_>) -> Option<Vec<u8>> {
        let class_name = event.class_name?;
        let code_source = event.code_source?;
        isolated(class_name, self.debuglog, || {
            let location = CodeLocation::from_code_source(Some(code_source));
            self.transformer.try_transform(event.class_bytes, &location)
        })
    }
}

/// Runs one transformation, turning errors and panics into "no change".
pub(crate) fn isolated<F>(class_name: &str, debuglog: bool, transform: F) -> Option<Vec<u8>>
where
    F: FnOnce() -> Result<Option<Vec<u8>>, TransformError>,
{
    match panic::catch_unwind(AssertUnwindSafe(transform)) {
        Ok(Ok(Some(bytes))) => {
            if debuglog {
                tracing::debug!(
                    target: "weave.agent",
                    class = class_name,
                    "recorded source location"
                );
            }
            Some(bytes)
        }
        Ok(Ok(None)) => None,
        // Runtime-image and network code sources land here for every JDK class.
        Ok(Err(TransformError::UnresolvableLocation)) => {
            if debuglog {
                tracing::debug!(
                    target: "weave.agent",
                    class = class_name,
                    "code source has no filesystem path"
                );
            }
            None
        }
        Ok(Err(err)) => {
            tracing::warn!(
                target: "weave.agent",
                class = class_name,
                error = %err,
                "could not instrument class"
            );
            None
        }
        Err(payload) => {
            tracing::warn!(
                target: "weave.agent",
                class = class_name,
                panic = %panic_message(payload.as_ref()),
                "could not instrument class: transformer panicked"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_owned()
    }
}

/// Checks that this runtime's class files are ones the agent can rewrite.
pub fn probe(bootstrap: &dyn BootstrapClasses) -> Result<(), AgentError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), AgentError> {
        let bytes = bootstrap
            .read_class(PROBE_CLASS)
            .map_err(|err| AgentError::BootstrapUnavailable {
                class: PROBE_CLASS,
                reason: format!("{err:#}"),
            })?
            .ok_or(AgentError::BootstrapMissing { class: PROBE_CLASS })?;
        ClassFile::parse(&bytes)
            .map(|_| ())
            .map_err(|source| AgentError::UnsupportedRuntime {
                class: PROBE_CLASS,
                source,
            })
    }));
    outcome.unwrap_or_else(|payload| {
        Err(AgentError::ProbePanicked(panic_message(payload.as_ref())))
    })
}

/// Entry point of the agent, created once per process.
#[derive(Debug)]
pub struct Agent {
    options: AgentOptions,
    policy: PathPolicy,
    state: AgentState,
}

impl Agent {
    pub fn new(options: AgentOptions) -> Self {
        Self {
            options,
            policy: PathPolicy::default(),
            state: AgentState::Unattached,
        }
    }

    /// Builds an agent from `[agent]` settings in `weave.toml`.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(AgentOptions {
            debuglog: config.debuglog,
        })
        .with_path_policy(config.path_policy.clone())
    }

    pub fn with_path_policy(mut self, policy: PathPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn options(&self) -> AgentOptions {
        self.options
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Probes the runtime and, if it is supported, registers the hook.
    ///
    /// Never fails: an unsupported runtime disables the agent with a single
    /// warning. Calling it again after the first attach returns the settled
    /// state without probing or registering again.
    pub fn attach(
        &mut self,
        bootstrap: &dyn BootstrapClasses,
        instrumentation: &mut dyn Instrumentation,
    ) -> AgentState {
        if self.state != AgentState::Unattached {
            return self.state;
        }
        self.state = AgentState::ProbeRunning;

        self.state = match probe(bootstrap) {
            Ok(()) => {
                let transformer = Arc::new(SourceMetadataTransformer::new(self.policy.clone()));
                instrumentation.add_transformer(Arc::new(SourceLocationHook::new(
                    transformer,
                    self.options.debuglog,
                )));
                if self.options.debuglog {
                    tracing::info!(
                        target: "weave.agent",
                        policy = ?self.policy,
                        "source location weaving enabled"
                    );
                }
                AgentState::Active
            }
            Err(err) => {
                tracing::warn!(
                    target: "weave.agent",
                    error = %err,
                    "runtime is not supported; source location weaving disabled"
                );
                if self.options.debuglog {
                    tracing::debug!(target: "weave.agent", error = ?err, "probe failure details");
                }
                AgentState::Disabled
            }
        };
        self.state
    }
}
