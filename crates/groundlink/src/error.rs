//! CLI error types with miette diagnostics.

use std::path::PathBuf;

use groundlink_config::ConfigError;
use groundlink_engine::EngineError;
use miette::Diagnostic;
use thiserror::Error;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Script ───────────────────────────────────────────────────────

    #[error("Cannot read script {path}")]
    #[diagnostic(code(groundlink::script_read))]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid session script {path}: {source}")]
    #[diagnostic(
        code(groundlink::script_format),
        help("Each step needs an \"op\" field; see `groundlink replay --help`.")
    )]
    ScriptFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Step {step}: device '{uid}' not found")]
    #[diagnostic(
        code(groundlink::not_found),
        help("Devices exist once a `discover` step has introduced them.")
    )]
    DeviceNotFound { step: usize, uid: String },

    #[error("Step {step}: {reason}")]
    #[diagnostic(code(groundlink::step))]
    Step { step: usize, reason: String },

    // ── Engine / configuration ───────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(groundlink::engine))]
    Engine(#[from] EngineError),

    #[error(transparent)]
    #[diagnostic(
        code(groundlink::config),
        help("Check the config file shown by `groundlink config path`.")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Cannot render configuration: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DeviceNotFound { .. } | Self::Engine(EngineError::DeviceNotFound { .. }) => {
                exit_code::NOT_FOUND
            }
            Self::ScriptFormat { .. } | Self::Step { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attaches the failing step to an engine error.
    pub fn at_step(step: usize, err: EngineError) -> Self {
        match err {
            EngineError::DeviceNotFound { uid } => Self::DeviceNotFound { step, uid },
            other => Self::Engine(other),
        }
    }
}
