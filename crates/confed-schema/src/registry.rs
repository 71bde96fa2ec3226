//! Type-descriptor registry

use crate::descriptor::{EnumDescriptor, FieldType, TypeDescriptor};
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A Rust type that registers its own descriptors.
///
/// The registered descriptors must mirror the type's serde shape so that
/// documents produced from the schema deserialize back into the type.
pub trait Configurable: Serialize + DeserializeOwned + Default {
    /// Name of the root descriptor registered by [`Configurable::register`]
    const TYPE_NAME: &'static str;

    /// Register this type and every type it reaches
    fn register(registry: &mut TypeRegistry);
}

/// Registry of type and enumeration descriptors, built once before extraction
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
    enums: HashMap<String, EnumDescriptor>,
}

impl TypeRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry populated by a [`Configurable`] type
    #[must_use]
    pub fn for_type<T: Configurable>() -> Self {
        let mut registry = Self::new();
        T::register(&mut registry);
        registry
    }

    /// Register a class-like type
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        self.types.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Register an enumeration
    pub fn register_enum(&mut self, descriptor: EnumDescriptor) -> &mut Self {
        self.enums.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Get a type by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// Get an enumeration by name
    #[must_use]
    pub fn get_enum(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name)
    }

    /// Check if a type or enumeration exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name) || self.enums.contains_key(name)
    }

    /// Number of registered types and enumerations
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len() + self.enums.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the default instance of a registered type.
    ///
    /// Explicit `Default` annotations win. Otherwise numbers are 0, booleans
    /// false, dates and times their minimum, enumerations their first member,
    /// lists empty; strings and nested objects are null and left out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] when `type_name` is not registered.
    pub fn default_instance(&self, type_name: &str) -> Result<Value> {
        let descriptor = self
            .get(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;

        let mut object = Map::new();
        for field in &descriptor.fields {
            let value = match field.default_value() {
                Some(value) => value.clone(),
                None => self.default_for(&field.field_type),
            };
            if !value.is_null() {
                object.insert(field.name.clone(), value);
            }
        }
        Ok(Value::Object(object))
    }

    fn default_for(&self, field_type: &FieldType) -> Value {
        match field_type {
            FieldType::Bool => Value::Bool(false),
            FieldType::I8
            | FieldType::I16
            | FieldType::I32
            | FieldType::I64
            | FieldType::U8
            | FieldType::U16
            | FieldType::U32
            | FieldType::U64
            | FieldType::F32
            | FieldType::F64
            | FieldType::Decimal => Value::from(0),
            FieldType::DateTime => Value::from("0001-01-01T00:00:00"),
            FieldType::DateOnly => Value::from("0001-01-01"),
            FieldType::TimeOnly => Value::from("00:00:00"),
            FieldType::List(_) => Value::Array(Vec::new()),
            FieldType::Named(name) => self
                .get_enum(name)
                .and_then(|e| e.members.first())
                .map_or(Value::Null, |(_, value)| Value::from(*value)),
            FieldType::String | FieldType::Char | FieldType::Unsupported(_) => Value::Null,
        }
    }
}
