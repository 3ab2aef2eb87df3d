use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for one pipeline run.
///
/// Resolution order: built-in defaults, then an optional `roster.toml` in
/// the working directory, then `ROSTER_*` environment variables, then the
/// CLI source-path argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path to the delimited source file.
    pub source_path: PathBuf,
    /// Path to the SQLite database holding both tables.
    pub database_path: PathBuf,
    /// Staging table, written once per run with the raw rows.
    pub staging_table: String,
    /// Destination table, written once per run with the cleaned records.
    pub clean_table: String,
    /// Minimum number of complete rows required to fit an imputation model.
    pub min_training_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("data/employee_data_source.csv"),
            database_path: PathBuf::from("employees.db"),
            staging_table: "employee_data_source".to_string(),
            clean_table: "employee_data".to_string(),
            min_training_rows: 10,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from defaults, the optional config file, and the
    /// environment.
    pub fn load() -> Result<Self> {
        let mut config = match Self::from_file(Path::new("roster.toml"))? {
            Some(config) => config,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(Some(config))
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("ROSTER_SOURCE_PATH") {
            self.source_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("ROSTER_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_two_named_tables() {
        let config = PipelineConfig::default();
        assert_eq!(config.staging_table, "employee_data_source");
        assert_eq!(config.clean_table, "employee_data");
        assert_eq!(config.min_training_rows, 10);
    }

    #[test]
    fn config_file_round_trip() {
        let config = PipelineConfig::default();
        let raw = toml::to_string(&config).unwrap();
        let parsed: PipelineConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.clean_table, config.clean_table);
    }

    #[test]
    fn partial_config_file_falls_back_to_defaults() {
        let parsed: PipelineConfig = toml::from_str("source_path = \"input.csv\"").unwrap();
        assert_eq!(parsed.source_path, PathBuf::from("input.csv"));
        assert_eq!(parsed.clean_table, "employee_data");
    }
}
