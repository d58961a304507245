use std::collections::BTreeMap;
use std::path::Path;

use scaffold_core::expressions::value_to_string;
use serde_json::Value;

use crate::ai::AiDocumentError;

/// Generated text keyed by manifest key.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Answers(BTreeMap<String, String>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON or YAML mapping. Non-string values are stringified.
    pub fn parse(input: &str) -> Result<Self, AiDocumentError> {
        let trimmed = input.trim_start();
        let raw: Value = if trimmed.starts_with('{') {
            serde_json::from_str(input)?
        } else {
            serde_yaml::from_str(input)?
        };
        let Value::Object(map) = raw else {
            return Err(AiDocumentError::NotAMapping);
        };
        Ok(Self(
            map.into_iter()
                .map(|(k, v)| {
                    let text = match v {
                        Value::String(s) => s,
                        other => value_to_string(&other),
                    };
                    (k, text)
                })
                .collect(),
        ))
    }

    pub fn load(path: &Path) -> Result<Self, AiDocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| AiDocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.0.insert(key.into(), text.into());
    }

    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, String)> for Answers {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_and_json() {
        let a = Answers::parse("intro: Hello\ncount: 3\n").unwrap();
        assert_eq!(a.get("intro"), Some("Hello"));
        assert_eq!(a.get("count"), Some("3"));
        let a = Answers::parse(r#"{"intro": "Hi"}"#).unwrap();
        assert_eq!(a.get("intro"), Some("Hi"));
    }

    #[test]
    fn rejects_non_mapping() {
        assert!(matches!(Answers::parse("- a\n- b\n"), Err(AiDocumentError::NotAMapping)));
    }
}
