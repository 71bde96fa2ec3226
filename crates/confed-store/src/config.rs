//! Store configuration options

use serde::Deserialize;
use std::path::PathBuf;

/// Configuration for a [`DocumentStore`](crate::DocumentStore)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the document files (default: current directory)
    pub data_dir: PathBuf,
    /// Create `data_dir` when generating (default: true)
    pub create_dirs: bool,
    /// Pretty-print data files (default: true)
    pub pretty: bool,
    /// Extension of every file (default: `json`)
    pub data_extension: String,
    /// Marker between the document name and the extension of schema files
    /// (default: `definition`)
    pub definition_suffix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            create_dirs: true,
            pretty: true,
            data_extension: "json".to_string(),
            definition_suffix: "definition".to_string(),
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data directory
    #[must_use]
    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set whether missing directories are created
    #[must_use]
    pub fn create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    /// Set whether data files are pretty-printed
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set the file extension
    #[must_use]
    pub fn data_extension(mut self, extension: impl Into<String>) -> Self {
        self.data_extension = extension.into();
        self
    }

    /// Set the schema file marker
    #[must_use]
    pub fn definition_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.definition_suffix = suffix.into();
        self
    }

    /// Path of the data file for `name`
    #[must_use]
    pub fn data_path(&self, name: &str) -> PathBuf {
        self.data_dir
            .join(format!("{name}.{}", self.data_extension))
    }

    /// Path of the schema file for `name`
    #[must_use]
    pub fn definition_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!(
            "{name}.{}.{}",
            self.definition_suffix, self.data_extension
        ))
    }
}
