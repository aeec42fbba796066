//! World configuration, loadable from RON, TOML or JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors from loading a [`WorldConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// Parse failure for text that did not come from a file.
    #[error("parse error: {detail}")]
    ParseText { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Behavior switches for a [`MechanicalWorld`](crate::MechanicalWorld).
///
/// Every field is optional in config files; missing fields take their
/// default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Re-check every network after each mutation and log violations.
    pub verify_invariants: bool,
    /// Buffer network events for `drain_events`.
    pub record_events: bool,
}

impl WorldConfig {
    /// Read a config file, picking the parser from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        deserialize(&content, format).map_err(|detail| ConfigError::Parse {
            file: path.to_path_buf(),
            detail,
        })
    }

    /// Parse config text in the given format.
    pub fn parse(content: &str, format: Format) -> Result<Self, ConfigError> {
        deserialize(content, format).map_err(|detail| ConfigError::ParseText { detail })
    }
}

fn deserialize(content: &str, format: Format) -> Result<WorldConfig, String> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "millwork_config_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("world.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("world.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("world.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("world.yaml")),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
        assert!(detect_format(Path::new("world")).is_err());
    }

    #[test]
    fn defaults_are_all_off() {
        let config = WorldConfig::default();
        assert!(!config.verify_invariants);
        assert!(!config.record_events);
    }

    #[test]
    fn parse_each_format() {
        let expected = WorldConfig {
            verify_invariants: true,
            record_events: false,
        };
        assert_eq!(
            WorldConfig::parse("(verify_invariants: true)", Format::Ron).unwrap(),
            expected
        );
        assert_eq!(
            WorldConfig::parse("verify_invariants = true", Format::Toml).unwrap(),
            expected
        );
        assert_eq!(
            WorldConfig::parse(r#"{"verify_invariants": true}"#, Format::Json).unwrap(),
            expected
        );
    }

    #[test]
    fn parse_reports_typed_error() {
        match WorldConfig::parse("verify_invariants = ", Format::Toml) {
            Err(ConfigError::ParseText { detail }) => assert!(!detail.is_empty()),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(matches!(
            WorldConfig::parse("(record_events: maybe)", Format::Ron),
            Err(ConfigError::ParseText { .. })
        ));
    }

    #[test]
    fn load_toml_file() {
        let dir = make_test_dir("load_toml");
        let path = dir.join("world.toml");
        fs::write(&path, "verify_invariants = true\nrecord_events = true\n").unwrap();

        let config = WorldConfig::load(&path).unwrap();
        assert!(config.verify_invariants);
        assert!(config.record_events);

        cleanup(&dir);
    }

    #[test]
    fn load_reports_parse_errors_with_file() {
        let dir = make_test_dir("load_bad_json");
        let path = dir.join("world.json");
        fs::write(&path, "{ not json").unwrap();

        match WorldConfig::load(&path) {
            Err(ConfigError::Parse { file, .. }) => assert_eq!(file, path),
            other => panic!("expected parse error, got {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = WorldConfig::load(Path::new("/nonexistent/millwork/world.ron"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
