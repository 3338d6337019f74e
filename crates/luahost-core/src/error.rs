//! Error types for luahost-core
//!
//! [`Error`] covers host-level failures only. Script failures never surface
//! as `Error`: they are reported through [`crate::report::ErrorReporter`]
//! and the triggering operation falls back to its pass-through value.
//! [`ScriptFailure`] describes such a failure to callers that want it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for luahost-core
#[derive(Error, Debug)]
pub enum Error {
    /// `start` was called while an engine handle is live
    #[error("Lua host is already running")]
    AlreadyRunning,

    /// Engine construction or limit installation failed
    #[error("Lua engine error: {0}")]
    Lua(#[from] mlua::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Reading a script from disk failed
    #[error("failed to read script {path}: {source}")]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a script call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFailureKind {
    /// The chunk did not compile
    Compile,
    /// The script raised an error while running
    Runtime,
    /// The call ran past its instruction budget
    BudgetExceeded,
}

/// A contained script failure. It has already been reported by the time a
/// caller sees it; callers use it only to pick a fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ScriptFailure {
    pub kind: ScriptFailureKind,
    pub message: String,
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid agent_id {0:?}")]
    InvalidAgentId(String),
}
