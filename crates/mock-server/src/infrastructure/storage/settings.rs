//! JSON settings: the nodes the address space is populated with.
//!
//! ```json
//! {
//!   "NodesToCreate": [
//!     { "Name": "Line4.Speed", "NodeType": "Variable", "DataType": "Double", "Value": 12.5 }
//!   ]
//! }
//! ```
//!
//! Node entries are carried through to the endpoint host as-is; only `Name`
//! is required.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AppSettings {
    #[serde(default)]
    pub nodes_to_create: Vec<NodeToCreate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct NodeToCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: serde_json::Value,
}

/// Parses settings text.
pub fn parse_settings(content: &str) -> Result<AppSettings, SettingsError> {
    Ok(serde_json::from_str(content)?)
}

/// Loads settings from `path`.  A missing file yields empty settings.
///
/// # Errors
///
/// [`SettingsError::Io`] for other file-system failures,
/// [`SettingsError::Parse`] for malformed JSON.
pub fn load_settings(path: &Path) -> Result<AppSettings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_settings(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppSettings::default()),
        Err(e) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pascal_case_nodes() {
        // Arrange
        let text = r#"{
            "NodesToCreate": [
                { "Name": "Line4.Speed", "NodeType": "Variable", "DataType": "Double", "Value": 12.5 },
                { "Name": "Line4" }
            ]
        }"#;

        // Act
        let settings = parse_settings(text).unwrap();

        // Assert
        assert_eq!(settings.nodes_to_create.len(), 2);
        let speed = &settings.nodes_to_create[0];
        assert_eq!(speed.name, "Line4.Speed");
        assert_eq!(speed.data_type.as_deref(), Some("Double"));
        assert_eq!(speed.value, json!(12.5));
        let folder = &settings.nodes_to_create[1];
        assert_eq!(folder.node_type, None);
        assert!(folder.value.is_null());
    }

    #[test]
    fn test_missing_nodes_key_is_empty() {
        assert!(parse_settings("{}").unwrap().nodes_to_create.is_empty());
    }

    #[test]
    fn test_node_without_name_is_a_parse_error() {
        let err = parse_settings(r#"{ "NodesToCreate": [ { "DataType": "Int32" } ] }"#);
        assert!(matches!(err, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_load_settings_missing_file_is_empty() {
        let path = std::env::temp_dir().join("opcua-mock-settings-does-not-exist.json");
        assert_eq!(load_settings(&path).unwrap(), AppSettings::default());
    }

    #[test]
    fn test_serialized_settings_use_pascal_case_keys() {
        let settings = AppSettings {
            nodes_to_create: vec![NodeToCreate {
                name: "Tank.Level".to_string(),
                node_type: None,
                data_type: Some("Float".to_string()),
                value: json!(0.0),
            }],
        };

        let value = serde_json::to_value(&settings).unwrap();

        assert_eq!(
            value,
            json!({ "NodesToCreate": [ { "Name": "Tank.Level", "DataType": "Float", "Value": 0.0 } ] })
        );
    }
}
