use std::path::Path;

use scaffold_core::types::AiOutput;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::AiDocumentError;

/// One pending request for generated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub key: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    pub step: String,
    pub recipe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<AiOutput>,
}

/// Everything a collect pass asked for, in step execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptManifest {
    pub entries: Vec<ManifestEntry>,
}

impl PromptManifest {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn to_json_string(&self) -> Result<String, AiDocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write as YAML for `.yml`/`.yaml` paths, JSON otherwise.
    pub fn write_to(&self, path: &Path) -> Result<(), AiDocumentError> {
        let body = match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => serde_yaml::to_string(self)?,
            _ => self.to_json_string()?,
        };
        std::fs::write(path, body).map_err(|source| AiDocumentError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, AiDocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| AiDocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }
}
