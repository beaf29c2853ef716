//! Configuration for the appraisal scoring engine
//!
//! Settings are layered: defaults, then an optional TOML file, then
//! `APPRAISE_*` environment variables (e.g. `APPRAISE_DATABASE__PATH`).

use crate::error::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,

    /// Create the database file if it does not exist
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "appraise.db".to_string(),
            create_if_missing: false,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
}

impl EngineConfig {
    /// Load configuration from an optional file plus environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("database.path", DatabaseConfig::default().path)?
            .set_default("database.create_if_missing", false)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }

        let settings = builder
            .add_source(Environment::with_prefix("APPRAISE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.database.path, "appraise.db");
        assert!(!config.database.create_if_missing);
    }
}
