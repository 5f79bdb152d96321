//! Configuration file loading.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

use kapply_core::ApplicatorConfig;

use crate::logging::LoggingConfig;

/// Top-level configuration file.
///
/// ```json
/// { "applicator": { "max_attempts": 3 }, "logging": { "level": "debug", "format": "json" } }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub applicator: ApplicatorConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Command-line flags win over the file.
    pub fn override_logging(&mut self, level: Option<String>, format: Option<String>) {
        if let Some(level) = level {
            self.logging.level = level;
        }
        if let Some(format) = format {
            self.logging.format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_optional() {
        let config = Config::parse(r#"{ "logging": { "level": "debug" } }"#).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.applicator, ApplicatorConfig::default());
    }

    #[test]
    fn flags_override_file() {
        let mut config = Config::parse(r#"{ "applicator": { "max_attempts": 2 } }"#).unwrap();
        config.override_logging(None, Some("json".into()));
        assert_eq!(config.applicator.max_attempts, 2);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn non_object_config_is_rejected() {
        assert!(Config::parse("[]").is_err());
    }
}
