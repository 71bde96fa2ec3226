#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # confed-schema
//!
//! Schema model, type-descriptor registry, and schema extraction.
//!
//! A type is described once through a [`TypeRegistry`] (by manual
//! registration or a descriptor file), then turned into a portable
//! [`SchemaDocument`] by the [`SchemaExtractor`]:
//!
//! ```rust
//! use confed_schema::{FieldDescriptor, FieldType, TypeDescriptor, TypeRegistry, extract};
//!
//! let mut registry = TypeRegistry::new();
//! registry.register(
//!     TypeDescriptor::new("Settings")
//!         .field(FieldDescriptor::new("Port", FieldType::U16))
//!         .field(FieldDescriptor::new("Host", FieldType::String)),
//! );
//!
//! let schema = extract(&registry, "Settings").unwrap();
//! assert_eq!(schema.main().unwrap().properties.len(), 2);
//! ```

/// Type descriptors and constraint annotations.
pub mod descriptor;
/// Descriptor → schema extraction.
pub mod extractor;
/// Descriptor file loading (YAML/JSON).
pub mod loader;
/// Schema document data model.
pub mod model;
/// Registry of type and enumeration descriptors.
pub mod registry;

pub use descriptor::{Annotation, EnumDescriptor, FieldDescriptor, FieldType, TypeDescriptor};
pub use extractor::{SchemaExtractor, extract};
pub use loader::DescriptorLoader;
pub use model::{
    Constraints, Kind, OptionItem, Presentation, PropertyNode, SchemaDocument, SchemaNode,
};
pub use registry::{Configurable, TypeRegistry};

use thiserror::Error;

/// Errors that can occur when working with schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot extract field '{field}' of type '{type_name}': {reason}")]
    Extraction {
        type_name: String,
        field: String,
        reason: String,
    },

    #[error("Type not registered: {0}")]
    UnknownType(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid descriptor format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an extraction error naming the offending type and field.
    pub fn extraction(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Extraction {
            type_name: type_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build a schema invariant violation.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema(message.into())
    }
}

/// Crate-local result type for schema operations.
pub type Result<T> = std::result::Result<T, Error>;
