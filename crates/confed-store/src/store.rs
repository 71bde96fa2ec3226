//! Document store: generate, read and write named documents

use crate::config::StoreConfig;
use crate::{Error, Result};
use confed_schema::{Configurable, SchemaDocument, TypeRegistry, extract};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Reads and writes schema/data file pairs in one directory
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    config: StoreConfig,
}

impl DocumentStore {
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// A store over `data_dir` with default settings
    #[must_use]
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(StoreConfig::new().data_dir(data_dir))
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn data_path(&self, name: &str) -> PathBuf {
        self.config.data_path(name)
    }

    #[must_use]
    pub fn definition_path(&self, name: &str) -> PathBuf {
        self.config.definition_path(name)
    }

    /// Whether the data file of `name` exists
    pub async fn exists(&self, name: &str) -> bool {
        fs::try_exists(self.data_path(name)).await.unwrap_or(false)
    }

    /// Write the schema of `type_name` and, when missing, a default data file.
    ///
    /// The schema is always rewritten; existing data is never touched.
    ///
    /// # Errors
    ///
    /// Fails when extraction fails or a file cannot be written.
    pub async fn generate(
        &self,
        registry: &TypeRegistry,
        type_name: &str,
        name: &str,
    ) -> Result<SchemaDocument> {
        let schema = extract(registry, type_name)?;
        self.generate_with(&schema, name, || registry.default_instance(type_name))
            .await?;
        Ok(schema)
    }

    /// [`generate`](Self::generate) for a [`Configurable`] type, whose
    /// `Default` value becomes the initial data
    ///
    /// # Errors
    ///
    /// Fails when extraction fails or a file cannot be written.
    pub async fn generate_for<T: Configurable>(&self, name: &str) -> Result<SchemaDocument> {
        let registry = TypeRegistry::for_type::<T>();
        let schema = extract(&registry, T::TYPE_NAME)?;
        self.generate_with(&schema, name, || Ok(strip_nulls(to_value(&T::default())?)))
            .await?;
        Ok(schema)
    }

    /// Load the data of `name`, generating both files first if the data
    /// file is missing. Empty or `null` content yields the default instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDocument`] when the file is not valid JSON.
    pub async fn read(&self, registry: &TypeRegistry, type_name: &str, name: &str) -> Result<Value> {
        if !self.exists(name).await {
            self.generate(registry, type_name, name).await?;
        }
        match self.read_data(name).await? {
            Some(value) => Ok(value),
            None => Ok(registry.default_instance(type_name)?),
        }
    }

    /// Load the data of `name` as `T`, generating it first if missing
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDocument`] when the file is not valid JSON
    /// or does not match `T`.
    pub async fn read_as<T: Configurable>(&self, name: &str) -> Result<T> {
        if !self.exists(name).await {
            self.generate_for::<T>(name).await?;
        }
        match self.read_data(name).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| Error::malformed(self.data_path(name), e.to_string())),
            None => Ok(T::default()),
        }
    }

    /// Load the data of `name` without generating anything. `None` when the
    /// file is missing, blank or holds `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDocument`] when the file is not valid JSON.
    pub async fn read_existing(&self, name: &str) -> Result<Option<Value>> {
        if !self.exists(name).await {
            debug!(name, "no data file");
            return Ok(None);
        }
        self.read_data(name).await
    }

    /// Load the schema of `name`. It is never synthesized on read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSchema`] when the schema file does not exist,
    /// [`Error::MalformedDocument`] when it cannot be parsed, and
    /// [`Error::Schema`] when it violates the schema invariants.
    pub async fn read_definition(&self, name: &str) -> Result<SchemaDocument> {
        let path = self.definition_path(name);
        if !fs::try_exists(&path).await? {
            return Err(Error::MissingSchema { path });
        }

        let content = fs::read_to_string(&path).await?;
        let schema: SchemaDocument = serde_json::from_str(&content)
            .map_err(|e| Error::malformed(&path, e.to_string()))?;
        schema.validate()?;
        info!(path = %path.display(), types = schema.len(), "read definition");
        Ok(schema)
    }

    /// Replace the data of `name` with `document` in one step: the new
    /// content goes to a sibling temporary file that is then renamed over
    /// the data file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub async fn write(&self, name: &str, document: &Value) -> Result<()> {
        let path = self.data_path(name);
        let content = self.render(document, self.config.pretty)?;
        write_atomic(&path, &content).await?;
        info!(path = %path.display(), bytes = content.len(), "wrote document");
        Ok(())
    }

    async fn generate_with<F>(&self, schema: &SchemaDocument, name: &str, default: F) -> Result<()>
    where
        F: FnOnce() -> confed_schema::Result<Value>,
    {
        if self.config.create_dirs {
            fs::create_dir_all(&self.config.data_dir).await?;
        }

        let definition_path = self.definition_path(name);
        write_atomic(&definition_path, &self.render(&to_value(schema)?, true)?).await?;
        info!(path = %definition_path.display(), types = schema.len(), "wrote definition");

        let data_path = self.data_path(name);
        if fs::try_exists(&data_path).await? {
            debug!(path = %data_path.display(), "data file exists, keeping it");
            return Ok(());
        }
        let document = default()?;
        fs::write(&data_path, self.render(&document, self.config.pretty)?).await?;
        info!(path = %data_path.display(), "wrote default document");
        Ok(())
    }

    /// Parsed data, `None` when the file is blank or holds `null`
    async fn read_data(&self, name: &str) -> Result<Option<Value>> {
        let path = self.data_path(name);
        let content = fs::read_to_string(&path).await?;
        if content.trim().is_empty() {
            debug!(path = %path.display(), "document is empty");
            return Ok(None);
        }

        let value: Value =
            serde_json::from_str(&content).map_err(|e| Error::malformed(&path, e.to_string()))?;
        info!(path = %path.display(), "read document");
        Ok((!value.is_null()).then_some(value))
    }

    fn render(&self, value: &Value, pretty: bool) -> Result<String> {
        let rendered = if pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.map_err(|e| Error::malformed(&self.config.data_dir, e.to_string()))
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> confed_schema::Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| confed_schema::Error::InvalidFormat(format!("cannot serialize: {e}")))
}

/// Drop null members of objects, recursively
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&temp, content).await?;
    fs::rename(&temp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use confed_schema::{FieldDescriptor, FieldType, TypeDescriptor};
    use serde_json::json;
    use tempfile::TempDir;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("Settings")
                .field(FieldDescriptor::new("Port", FieldType::U16))
                .field(FieldDescriptor::new("Host", FieldType::String)),
        );
        registry
    }

    #[tokio::test]
    async fn test_generate_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path());

        let schema = store.generate(&registry(), "Settings", "App").await.unwrap();
        assert_eq!(schema.len(), 1);

        let data = std::fs::read_to_string(store.data_path("App")).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&data).unwrap(), json!({"Port": 0}));
        assert!(data.contains('\n'));
        assert!(store.definition_path("App").exists());
    }

    #[tokio::test]
    async fn test_generate_keeps_existing_data() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path());
        store.generate(&registry(), "Settings", "App").await.unwrap();
        store.write("App", &json!({"Port": 8080})).await.unwrap();

        store.generate(&registry(), "Settings", "App").await.unwrap();
        let value = store.read(&registry(), "Settings", "App").await.unwrap();
        assert_eq!(value, json!({"Port": 8080}));
    }

    #[tokio::test]
    async fn test_read_generates_missing_document() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path().join("nested"));

        let value = store.read(&registry(), "Settings", "App").await.unwrap();
        assert_eq!(value, json!({"Port": 0}));
        assert!(store.definition_path("App").exists());
    }

    #[tokio::test]
    async fn test_empty_or_null_document_yields_default() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path());
        store.generate(&registry(), "Settings", "App").await.unwrap();

        for content in ["", "  \n", "null"] {
            std::fs::write(store.data_path("App"), content).unwrap();
            let value = store.read(&registry(), "Settings", "App").await.unwrap();
            assert_eq!(value, json!({"Port": 0}));
        }
    }

    #[tokio::test]
    async fn test_malformed_document() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path());
        store.generate(&registry(), "Settings", "App").await.unwrap();
        std::fs::write(store.data_path("App"), "{ nope").unwrap();

        let err = store.read(&registry(), "Settings", "App").await.unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }

    #[tokio::test]
    async fn test_read_definition_missing() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path());

        let err = store.read_definition("App").await.unwrap_err();
        assert!(matches!(err, Error::MissingSchema { .. }));
        assert!(!store.exists("App").await);
    }

    #[tokio::test]
    async fn test_read_existing_never_generates() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path());

        assert_eq!(store.read_existing("App").await.unwrap(), None);
        assert!(!store.definition_path("App").exists());

        store.write("App", &json!({"Port": 2})).await.unwrap();
        assert_eq!(
            store.read_existing("App").await.unwrap(),
            Some(json!({"Port": 2}))
        );
    }

    #[tokio::test]
    async fn test_read_definition_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path());
        let written = store.generate(&registry(), "Settings", "App").await.unwrap();

        let read = store.read_definition("App").await.unwrap();
        assert_eq!(read, written);
    }

    #[tokio::test]
    async fn test_read_definition_rejects_invalid_schema() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path());
        std::fs::write(
            store.definition_path("App"),
            r#"[{"TypeName": "A", "MainType": false}]"#,
        )
        .unwrap();

        let err = store.read_definition("App").await.unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[tokio::test]
    async fn test_write_compact() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(StoreConfig::new().data_dir(dir.path()).pretty(false));
        store.write("App", &json!({"Port": 1})).await.unwrap();

        let data = std::fs::read_to_string(store.data_path("App")).unwrap();
        assert_eq!(data, r#"{"Port":1}"#);
        assert!(!dir.path().join(".App.json.tmp").exists());
    }

    #[test]
    fn test_strip_nulls() {
        assert_eq!(
            strip_nulls(json!({"a": null, "b": {"c": null, "d": 1}, "e": [null]})),
            json!({"b": {"d": 1}, "e": [null]})
        );
    }
}
