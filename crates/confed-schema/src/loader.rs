//! Descriptor loader: builds a [`TypeRegistry`] from YAML or JSON files

use crate::descriptor::{Annotation, EnumDescriptor, FieldDescriptor, FieldType, TypeDescriptor};
use crate::registry::TypeRegistry;
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Serializable descriptor format for loading from files
#[derive(Debug, Deserialize)]
struct DescriptorFile {
    #[serde(default)]
    enums: Vec<EnumFile>,
    #[serde(default)]
    types: Vec<TypeFile>,
}

#[derive(Debug, Deserialize)]
struct EnumFile {
    name: String,
    members: Vec<MemberFile>,
}

/// Enum members may be bare names (numbered by ordinal) or name/value pairs
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MemberFile {
    Name(String),
    Valued { name: String, value: i64 },
}

#[derive(Debug, Deserialize)]
struct TypeFile {
    name: String,
    #[serde(default)]
    fields: Vec<FieldFile>,
}

#[derive(Debug, Deserialize)]
struct FieldFile {
    name: String,
    #[serde(rename = "type")]
    type_expr: String,
    #[serde(default)]
    display: Option<DisplayFile>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    range: Option<RangeFile>,
    #[serde(default)]
    length: Option<LengthFile>,
    #[serde(default)]
    min_length: Option<usize>,
    #[serde(default)]
    max_length: Option<usize>,
    #[serde(default)]
    allowed_values: Option<Vec<String>>,
    #[serde(default)]
    denied_values: Option<Vec<String>>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    options: Vec<OptionFile>,
    #[serde(default)]
    dim_length: Option<Vec<usize>>,
    #[serde(default)]
    default: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DisplayFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    order: Option<i32>,
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RangeFile {
    min: Decimal,
    max: Decimal,
}

#[derive(Debug, Deserialize)]
struct LengthFile {
    min: usize,
    max: usize,
}

#[derive(Debug, Deserialize)]
struct OptionFile {
    label: String,
    value: String,
}

impl From<FieldFile> for FieldDescriptor {
    fn from(file: FieldFile) -> Self {
        let mut field = FieldDescriptor::new(file.name, FieldType::parse(&file.type_expr));

        if let Some(display) = file.display {
            field = field.with(Annotation::Display {
                name: display.name,
                description: display.description,
                group: display.group,
                order: display.order,
                prompt: display.prompt,
            });
        }
        if let Some(range) = file.range {
            field = field.with(Annotation::Range {
                min: range.min,
                max: range.max,
            });
        }
        if file.required {
            field = field.with(Annotation::Required);
        }
        if let Some(values) = file.allowed_values {
            field = field.with(Annotation::AllowedValues(values));
        }
        if let Some(values) = file.denied_values {
            field = field.with(Annotation::DeniedValues(values));
        }
        if let Some(length) = file.length {
            field = field.with(Annotation::Length {
                min: length.min,
                max: length.max,
            });
        }
        if let Some(min) = file.min_length {
            field = field.with(Annotation::MinLength(min));
        }
        if let Some(max) = file.max_length {
            field = field.with(Annotation::MaxLength(max));
        }
        if let Some(pattern) = file.pattern {
            field = field.with(Annotation::RegularExpression(pattern));
        }
        for option in file.options {
            field = field.with(Annotation::Option {
                label: option.label,
                value: option.value,
            });
        }
        if let Some(lengths) = file.dim_length {
            field = field.with(Annotation::DimLength(lengths));
        }
        if let Some(value) = file.default {
            field = field.with(Annotation::Default(value));
        }
        field
    }
}

impl From<EnumFile> for EnumDescriptor {
    fn from(file: EnumFile) -> Self {
        let mut descriptor = EnumDescriptor::new(file.name);
        for (ordinal, member) in (0_i64..).zip(file.members) {
            descriptor = match member {
                MemberFile::Name(name) => descriptor.member(name, ordinal),
                MemberFile::Valued { name, value } => descriptor.member(name, value),
            };
        }
        descriptor
    }
}

/// Loads descriptor files into a registry
pub struct DescriptorLoader {
    search_paths: Vec<PathBuf>,
}

impl DescriptorLoader {
    /// Create a new loader with the given search paths
    #[must_use]
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Add a search path
    pub fn add_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }

    /// Find `<name>.yaml`, `<name>.yml` or `<name>.json` in the search paths and load it
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] when no file matches, or any error of
    /// [`DescriptorLoader::load_from_file`].
    pub fn load(&self, name: &str) -> Result<TypeRegistry> {
        let variations = [
            format!("{name}.yaml"),
            format!("{name}.yml"),
            format!("{name}.json"),
        ];

        for path in &self.search_paths {
            for variation in &variations {
                let file_path = path.join(variation);
                if file_path.exists() {
                    debug!("Found descriptor file: {:?}", file_path);
                    return self.load_from_file(&file_path);
                }
            }
        }

        Err(Error::UnknownType(name.to_string()))
    }

    /// Load descriptors from a specific file; the format follows the extension
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::InvalidFormat`] when it cannot be parsed.
    pub fn load_from_file(&self, path: &Path) -> Result<TypeRegistry> {
        trace!("Loading descriptors from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.load_from_yaml(&content)
        } else {
            self.load_from_json(&content)
        }
    }

    /// Load descriptors from a JSON string
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] on parse failure.
    pub fn load_from_json(&self, json: &str) -> Result<TypeRegistry> {
        let file: DescriptorFile = serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))?;
        Ok(Self::convert(file))
    }

    /// Load descriptors from a YAML string
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] on parse failure.
    pub fn load_from_yaml(&self, yaml: &str) -> Result<TypeRegistry> {
        let file: DescriptorFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))?;
        Ok(Self::convert(file))
    }

    fn convert(file: DescriptorFile) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for e in file.enums {
            registry.register_enum(e.into());
        }
        for t in file.types {
            let descriptor = t
                .fields
                .into_iter()
                .fold(TypeDescriptor::new(t.name), |d, f| d.field(f.into()));
            registry.register(descriptor);
        }
        debug!(entries = registry.len(), "loaded descriptors");
        registry
    }
}

impl Default for DescriptorLoader {
    fn default() -> Self {
        Self::new(vec![PathBuf::from(".")])
    }
}
