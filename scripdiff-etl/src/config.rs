//! Pipeline configuration (TOML).
//!
//! Connection strings and paths are external configuration; nothing in the
//! reconciliation core reads this. Defaults embed the real provider
//! endpoints, so `scripdiff run` works with no config file at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upstox NSE instrument file (gzipped CSV).
pub const UPSTOX_URL: &str = "https://assets.upstox.com/market-quote/instruments/exchange/NSE.csv.gz";
/// Dhan scrip master (plain CSV).
pub const DHAN_URL: &str = "https://images.dhan.co/api-data/api-scrip-master.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Read(String),

    #[error("parse config TOML: {0}")]
    Parse(String),
}

/// Everything a run needs to know about the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub upstox_url: String,
    pub dhan_url: String,
    /// Fetched raw snapshots are persisted here before parsing.
    pub snapshot_dir: PathBuf,
    /// The three partition CSVs and the run report land here.
    pub output_dir: PathBuf,
    /// JSON document store for the Upstox canonical table.
    pub doc_store_dir: PathBuf,
    /// SQLite database for the Dhan canonical table.
    pub sqlite_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upstox_url: UPSTOX_URL.into(),
            dhan_url: DHAN_URL.into(),
            snapshot_dir: PathBuf::from("output/snapshots"),
            output_dir: PathBuf::from("output"),
            doc_store_dir: PathBuf::from("output/docstore"),
            sqlite_path: PathBuf::from("nse_instruments.db"),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string. Missing fields take defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_real_endpoints() {
        let config = PipelineConfig::default();
        assert!(config.upstox_url.ends_with("NSE.csv.gz"));
        assert!(config.dhan_url.ends_with("api-scrip-master.csv"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn toml_roundtrip() {
        let config = PipelineConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let parsed = PipelineConfig::from_toml(r#"output_dir = "artifacts""#).unwrap();
        assert_eq!(parsed.output_dir, PathBuf::from("artifacts"));
        assert_eq!(parsed.upstox_url, UPSTOX_URL);
        assert_eq!(parsed.sqlite_path, PathBuf::from("nse_instruments.db"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = PipelineConfig::from_toml("output_dir = [nonsense").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
