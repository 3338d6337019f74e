//! Configuration management for luahost
//!
//! Handles loading and validation of luahost.toml configuration files.

use crate::codec::CodecLimits;
use crate::error::ConfigError;
use crate::logging::LogConfig;
use luahost_llsd::Uuid;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Lua engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Value codec settings
    #[serde(default)]
    pub codec: CodecLimits,

    /// Identity used for bridge notices
    #[serde(default)]
    pub agent: AgentConfig,
}

impl Config {
    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.agent.parse_id().map(|_| ())
    }

    /// Logging settings derived from `[general]`.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.general.log_level.clone(),
            format: self.general.log_format,
            file: self.general.log_file.clone(),
        }
    }
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format (pretty or json)
    #[serde(default)]
    pub log_format: LogFormat,

    /// Optional log file, appended to
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON lines
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format: {s}. Expected pretty or json")),
        }
    }
}

/// Lua engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// VM instructions a single protected call may execute; 0 disables the budget
    #[serde(default = "default_instruction_limit")]
    pub instruction_limit: u64,

    /// Lua heap limit in bytes; 0 disables the limit
    #[serde(default)]
    pub memory_limit_bytes: usize,

    /// Script evaluated right after the engine starts
    #[serde(default)]
    pub startup_script: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instruction_limit: default_instruction_limit(),
            memory_limit_bytes: 0,
            startup_script: None,
        }
    }
}

fn default_instruction_limit() -> u64 {
    100_000_000
}

/// Agent identity configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    /// Local agent id stamped on bridge notices; empty means nil
    #[serde(default)]
    pub agent_id: String,
}

impl AgentConfig {
    pub fn parse_id(&self) -> Result<Uuid, ConfigError> {
        if self.agent_id.trim().is_empty() {
            return Ok(Uuid::nil());
        }
        Uuid::parse_str(self.agent_id.trim())
            .map_err(|_| ConfigError::InvalidAgentId(self.agent_id.clone()))
    }

    /// The configured agent id, nil when unset or invalid.
    pub fn id(&self) -> Uuid {
        self.parse_id().unwrap_or_else(|_| Uuid::nil())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, LogFormat::Pretty);
        assert_eq!(config.engine.instruction_limit, 100_000_000);
        assert_eq!(config.engine.memory_limit_bytes, 0);
        assert!(config.engine.startup_script.is_none());
        assert_eq!(config.codec.max_array_index, CodecLimits::default().max_array_index);
        assert_eq!(config.agent.id(), Uuid::nil());
    }

    #[test]
    fn full_document_parses() {
        let config = Config::from_toml_str(
            r#"
[general]
log_level = "debug"
log_format = "json"
log_file = "/tmp/luahost.log"

[engine]
instruction_limit = 5000
memory_limit_bytes = 1048576
startup_script = "autorun.lua"

[codec]
max_array_index = 64
max_depth = 32

[agent]
agent_id = "a2e76fcd-9360-4f6d-a924-000000000003"
"#,
        )
        .unwrap();
        assert_eq!(config.general.log_format, LogFormat::Json);
        assert_eq!(config.engine.instruction_limit, 5000);
        assert_eq!(config.engine.memory_limit_bytes, 1_048_576);
        assert_eq!(
            config.engine.startup_script.as_deref(),
            Some(Path::new("autorun.lua"))
        );
        assert_eq!(config.codec.max_array_index, 64);
        assert_eq!(config.codec.max_depth, 32);
        assert_eq!(
            config.agent.id().to_string(),
            "a2e76fcd-9360-4f6d-a924-000000000003"
        );

        let log = config.log_config();
        assert_eq!(log.level, "debug");
        assert_eq!(log.file.as_deref(), Some(Path::new("/tmp/luahost.log")));
    }

    #[test]
    fn invalid_agent_id_is_rejected() {
        let err = Config::from_toml_str("[agent]\nagent_id = \"nope\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAgentId(ref id) if id == "nope"));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = Config::from_toml_str("[engine\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("luahost.toml");
        std::fs::write(&path, "[engine]\ninstruction_limit = 0\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.engine.instruction_limit, 0);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
