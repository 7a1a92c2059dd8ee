//! Front-end configuration.
//!
//! Every field has a default so a configuration file only needs to name the
//! settings it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label returned by the first call to the label allocator.
pub const DEFAULT_START_LABEL: &str = "Program Start";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Naming and reporting policy for one compilation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Sentinel returned by the first label allocation.
    pub start_label: String,
    pub label_prefix: String,
    pub temp_prefix: String,
    /// Echo diagnostics to standard error as they are recorded.
    pub echo_diagnostics: bool,
    /// Record a diagnostic when a name is declared twice in one scope.
    pub report_redeclarations: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            start_label: DEFAULT_START_LABEL.to_string(),
            label_prefix: "label".to_string(),
            temp_prefix: "t".to_string(),
            echo_diagnostics: true,
            report_redeclarations: false,
        }
    }
}

impl FrontendConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = FrontendConfig::from_json_str(r#"{ "temp_prefix": "tmp" }"#).unwrap();
        assert_eq!(config.temp_prefix, "tmp");
        assert_eq!(config.start_label, DEFAULT_START_LABEL);
        assert_eq!(config.label_prefix, "label");
        assert!(config.echo_diagnostics);
        assert!(!config.report_redeclarations);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = FrontendConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "start_label": "main", "report_redeclarations": true }}"#
        )
        .unwrap();

        let config = FrontendConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.start_label, "main");
        assert!(config.report_redeclarations);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = FrontendConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
