//! Configuration and data-directory resolution.
//!
//! Precedence, highest to lowest:
//! 1. CLI flags (`--data-dir`, `-H`)
//! 2. Environment (`TD_DATA_DIR`)
//! 3. `config.toml` in the data directory (output format only)
//! 4. Built-in defaults (`~/.local/share/taskdeck`, JSON output)
//!
//! Resolved values carry their source so `td whoami`-style diagnostics can
//! say where a setting came from.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TD_DATA_DIR";

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Output format preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Machine-readable JSON (default)
    #[default]
    Json,
    /// Human-readable text
    Human,
}

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.toml
    ConfigFile,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// On-disk configuration (`config.toml` in the data directory).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// "json" or "human"
    pub output_format: Option<String>,
}

impl ConfigFile {
    /// Load the config file; a missing file is the empty default.
    pub fn load(data_dir: &std::path::Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(body) => toml::from_str(&body)
                .map_err(|e| crate::Error::Validation(format!("bad {CONFIG_FILE}: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolve the data directory: flag > env > XDG default.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> Resolved<PathBuf> {
    if let Some(path) = flag {
        return Resolved::new(path, ValueSource::CliFlag);
    }
    if let Ok(path) = std::env::var(DATA_DIR_ENV)
        && !path.is_empty()
    {
        return Resolved::new(PathBuf::from(path), ValueSource::EnvVar(DATA_DIR_ENV.into()));
    }
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    Resolved::new(base.join("taskdeck"), ValueSource::Default)
}

/// Resolve the output format: flag > config file > JSON default.
pub fn resolve_output_format(human_flag: bool, file: &ConfigFile) -> Resolved<OutputFormat> {
    if human_flag {
        return Resolved::new(OutputFormat::Human, ValueSource::CliFlag);
    }
    match file.output_format.as_deref() {
        Some("human") => Resolved::new(OutputFormat::Human, ValueSource::ConfigFile),
        Some("json") => Resolved::new(OutputFormat::Json, ValueSource::ConfigFile),
        _ => Resolved::new(OutputFormat::Json, ValueSource::Default),
    }
}
