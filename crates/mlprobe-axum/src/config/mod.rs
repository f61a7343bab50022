//! Config loading.
//!
//! YAML is parsed strictly and validated before it is handed out, so a loaded
//! [`ProbeConfig`] always yields valid [`Settings`](mlprobe_core::Settings).
//! Errors read from a file are prefixed with its path.

pub mod schema;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use mlprobe_core::error::{InstrumentError, Result};

pub use schema::{InstrumentationSection, ProbeConfig, ServerSection};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MLPROBE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "mlprobe.yaml";

/// `$MLPROBE_CONFIG`, or `mlprobe.yaml` in the working directory.
pub fn config_path() -> PathBuf {
    env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ProbeConfig> {
    let path = path.as_ref();
    let at = |msg: String| InstrumentError::Config(format!("{}: {msg}", path.display()));
    let text = fs::read_to_string(path).map_err(|e| at(e.to_string()))?;
    load_from_str(&text).map_err(|e| match e {
        InstrumentError::Config(msg) => at(msg),
        other => other,
    })
}

pub fn load_from_str(text: &str) -> Result<ProbeConfig> {
    let cfg: ProbeConfig =
        serde_yaml::from_str(text).map_err(|e| InstrumentError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
