//! Application configuration file

use anyhow::{Context, Result, bail};
use confed_store::StoreConfig;
use confed_validation::ValidationConfig;
use serde::Deserialize;
use std::path::Path;

/// Contents of the `--config` file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub validation: ValidationConfig,
}

impl AppConfig {
    /// Load from a YAML or JSON file, chosen by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("parsing config {}", path.display())),
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("parsing config {}", path.display())),
            other => bail!(
                "unsupported config format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confed_validation::ValidationMode;
    use std::path::PathBuf;

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("confed.yaml");
        std::fs::write(
            &path,
            "store:\n  data_dir: docs\n  pretty: false\nvalidation:\n  mode: fail-fast\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.store.data_dir, PathBuf::from("docs"));
        assert!(!config.store.pretty);
        assert_eq!(config.validation.mode, ValidationMode::FailFast);
    }

    #[test]
    fn test_load_json_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("confed.json");
        std::fs::write(&path, r#"{"validation": {"max_issues": 3}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.validation.max_issues, 3);
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("confed.toml");
        std::fs::write(&path, "").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
