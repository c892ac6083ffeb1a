//! Default Configuration Source
//!
//! The immutable key/value map reconciled into the store at startup.

use crate::entries::mask::has_wildcard;
use anyhow::{bail, Context};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Built-in default values, fixed for the life of the process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultConfig {
    values: BTreeMap<String, Value>,
}

impl DefaultConfig {
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Load a flat key/value map, picking the format from the file extension
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        tracing::info!("Loading default configuration from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read defaults file: {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let values: BTreeMap<String, Value> = match extension.as_str() {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON defaults: {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML defaults: {}", path.display()))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML defaults: {}", path.display()))?,
            other => bail!(
                "Unsupported defaults file extension '{}' (expected json, yaml, yml or toml)",
                other
            ),
        };

        let defaults = Self::new(values);
        defaults.validate()?;
        Ok(defaults)
    }

    /// Combine with another source; keys from `other` win
    pub fn merged_with(mut self, other: DefaultConfig) -> Self {
        self.values.extend(other.values);
        self
    }

    /// Every key must be usable as an exact lookup
    pub fn validate(&self) -> crate::Result<()> {
        for key in self.values.keys() {
            if key.is_empty() {
                bail!("Default configuration contains an empty key");
            }
            if has_wildcard(key) {
                bail!("Default configuration key '{}' contains a wildcard character", key);
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_each_format() {
        let dir = TempDir::new().unwrap();

        let json_path = dir.path().join("defaults.json");
        fs::write(&json_path, r#"{"mail.enabled": true, "site.name": "demo"}"#).unwrap();
        let yaml_path = dir.path().join("defaults.yml");
        fs::write(&yaml_path, "mail.enabled: true\nsite.name: demo\n").unwrap();
        let toml_path = dir.path().join("defaults.toml");
        fs::write(&toml_path, "\"mail.enabled\" = true\n\"site.name\" = \"demo\"\n").unwrap();

        let expected = DefaultConfig::from_pairs([
            ("mail.enabled", json!(true)),
            ("site.name", json!("demo")),
        ]);
        for path in [json_path, yaml_path, toml_path] {
            assert_eq!(DefaultConfig::load_from_file(&path).unwrap(), expected);
        }
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("defaults.ini");
        fs::write(&path, "a=1").unwrap();
        assert!(DefaultConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn test_wildcard_key_rejected() {
        let defaults = DefaultConfig::from_pairs([("svc.*", json!(1))]);
        assert!(defaults.validate().is_err());
        let empty = DefaultConfig::from_pairs([("", json!(1))]);
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_merge_prefers_other() {
        let inline = DefaultConfig::from_pairs([("a", json!(1)), ("b", json!(2))]);
        let file = DefaultConfig::from_pairs([("b", json!(3))]);
        let merged = inline.merged_with(file);
        assert_eq!(merged.get("a"), Some(&json!(1)));
        assert_eq!(merged.get("b"), Some(&json!(3)));
        assert_eq!(merged.len(), 2);
    }
}
