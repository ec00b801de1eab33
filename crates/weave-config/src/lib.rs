//! Configuration for the weave tools (`weave.toml`) and process-wide tracing setup.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt, TestWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Top-level `weave.toml` contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeaveConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` embeds a snippet of the input; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl WeaveConfig {
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }
}

/// Settings for the load-time weaving agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Verbose diagnostics, the equivalent of the `debuglog` agent option.
    #[serde(default)]
    pub debuglog: bool,

    /// How code locations are turned into the path recorded in each class.
    #[serde(default)]
    pub path_policy: PathPolicy,
}

/// How the recorded source path is derived from a class's code location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathPolicy {
    /// Record the location's absolute filesystem path.
    #[default]
    Absolute,
    /// Record the path relative to `root` with `/` separators. Locations outside
    /// `root` are recorded as absolute paths.
    ProjectRelative { root: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A simple level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file. If it cannot be opened, file logging is
    /// disabled and the other sinks stay active.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// The same sinks at `debug`, used under `debuglog` or `--verbose`.
    pub fn verbose(&self) -> Self {
        Self {
            level: "debug".to_owned(),
            ..self.clone()
        }
    }

    /// Maps the simple level aliases onto `EnvFilter` syntax. Anything that is
    /// not a bare level passes through untouched.
    pub(crate) fn level_directives(&self) -> String {
        let level = self.level.trim();
        match level.to_ascii_lowercase().as_str() {
            "" => Self::default_level(),
            "warning" => "warn".to_owned(),
            simple @ ("trace" | "debug" | "info" | "warn" | "error") => simple.to_owned(),
            _ => level.to_owned(),
        }
    }

    /// The effective filter: the configured level, with `RUST_LOG` layered on top.
    ///
    /// An unparseable `RUST_LOG` is ignored, and an unparseable configured level
    /// falls back to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        let configured = self.level_directives();
        let from_config = || {
            EnvFilter::try_new(&configured)
                .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into()))
        };

        match std::env::var("RUST_LOG") {
            Ok(env) if !env.trim().is_empty() => {
                EnvFilter::try_new(format!("{configured},{}", env.trim()))
                    .unwrap_or_else(|_| from_config())
            }
            _ => from_config(),
        }
    }

    /// Opens every configured sink. The file status is `None` without a log
    /// file and `Err(path)` when the file could not be opened.
    fn sinks(&self) -> (BoxMakeWriter, Option<Result<(), PathBuf>>) {
        let mut writer = BoxMakeWriter::new(std::io::sink);
        if self.stderr {
            writer = if cfg!(debug_assertions) {
                // Keeps test output captured.
                BoxMakeWriter::new(writer.and(TestWriter::with_stderr))
            } else {
                BoxMakeWriter::new(writer.and(std::io::stderr))
            };
        }

        let mut file_status = None;
        if let Some(path) = &self.file {
            let opened = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path);
            file_status = Some(match opened {
                Ok(file) => {
                    writer = BoxMakeWriter::new(writer.and(Mutex::new(file)));
                    Ok(())
                }
                Err(_) => Err(path.clone()),
            });
        }
        (writer, file_status)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber.
///
/// Only the first call in a process does anything. Returns whether this call
/// installed the subscriber.
pub fn init_tracing(logging: &LoggingConfig) -> bool {
    let mut installed = false;
    TRACING_INIT.call_once(|| {
        let (writer, file_status) = logging.sinks();
        let format = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        let layer: Box<dyn Layer<Registry> + Send + Sync> = if logging.json {
            Box::new(format.json())
        } else {
            Box::new(format)
        };

        let subscriber = tracing_subscriber::registry()
            .with(layer)
            .with(logging.env_filter());
        installed = tracing::subscriber::set_global_default(subscriber).is_ok();

        if let (true, Some(Err(path))) = (installed, file_status) {
            tracing::warn!(
                target: "weave.config",
                path = %path.display(),
                "log file could not be opened; logging to the remaining sinks"
            );
        }
    });
    installed
}
