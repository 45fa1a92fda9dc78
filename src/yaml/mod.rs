//! YAML reading and writing for entity files
//!
//! Syntax errors come back as [`YamlSyntaxError`] diagnostics with the
//! offending source location, so the CLI can render them with context.

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read and deserialize a YAML file
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    parse_yaml_str(&content, &filename)
}

/// Deserialize YAML content, attaching the source location on syntax errors
pub fn parse_yaml_str<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, content, filename).into())
}

/// Serialize a value and write it as a YAML file
///
/// Rewrites are machine-generated: scaffold comments do not survive them.
pub fn write_yaml_file<T: Serialize>(path: &Path, value: &T) -> Result<(), YamlError> {
    let yaml = serde_yml::to_string(value)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        value: f64,
    }

    #[test]
    fn test_parse_valid_yaml() {
        let sample: Sample = parse_yaml_str("name: pump\nvalue: 2.5\n", "sample.yaml").unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "pump".to_string(),
                value: 2.5
            }
        );
    }

    #[test]
    fn test_parse_reports_syntax_error() {
        let result: Result<Sample, _> = parse_yaml_str("name: [unclosed\n", "broken.yaml");
        assert!(matches!(result, Err(YamlError::Syntax(_))));
    }

    #[test]
    fn test_write_then_parse_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.yaml");
        let sample = Sample {
            name: "motor".to_string(),
            value: 4.5,
        };

        write_yaml_file(&path, &sample).unwrap();
        let loaded: Sample = parse_yaml_file(&path).unwrap();
        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result: Result<Sample, _> = parse_yaml_file(Path::new("/nonexistent/sample.yaml"));
        assert!(matches!(result, Err(YamlError::Io(_))));
    }
}
