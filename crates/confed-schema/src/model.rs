//! Schema model definitions
#![allow(clippy::must_use_candidate)] // Accessors are clear at call sites without #[must_use].
#![allow(clippy::return_self_not_must_use)] // Fluent setters are designed for chaining.

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Value kind of a property or an editable node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    String,
    Number,
    Boolean,
    DateTime,
    DateOnly,
    TimeOnly,
    Object,
    Array,
}

impl Kind {
    /// Object and Array nodes hold children instead of a value.
    pub fn is_composite(self) -> bool {
        matches!(self, Kind::Object | Kind::Array)
    }

    /// Stable lowercase name used in messages
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::DateTime => "date-time",
            Kind::DateOnly => "date",
            Kind::TimeOnly => "time",
            Kind::Object => "object",
            Kind::Array => "array",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value constraints attached to a property or to the elements of an array.
///
/// `minimum`/`maximum` bound the numeric value of a Number, the character
/// count of a String, and the element count of an Array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "bound")]
    pub minimum: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "bound")]
    pub maximum: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub denied_values: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_expression: Option<String>,
}

/// `Minimum`/`Maximum` as JSON numbers.
///
/// Integral bounds are written exactly; others go through `f64`. Reading
/// accepts numbers and numeric strings, and saturates numbers beyond the
/// decimal range to `Decimal::MIN`/`Decimal::MAX`.
mod bound {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;
    use std::str::FromStr;

    #[allow(clippy::ref_option)] // serde passes the field by reference
    pub fn serialize<S: Serializer>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(value) = value else {
            return serializer.serialize_none();
        };
        if value.fract().is_zero() {
            if let Some(i) = value.to_i64() {
                return serializer.serialize_i64(i);
            }
            if let Some(u) = value.to_u64() {
                return serializer.serialize_u64(u);
            }
        }
        match value.to_f64() {
            Some(f) => serializer.serialize_f64(f),
            None => serializer.serialize_str(&value.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
        deserializer.deserialize_any(BoundVisitor)
    }

    struct BoundVisitor;

    impl<'de> Visitor<'de> for BoundVisitor {
        type Value = Option<Decimal>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(self)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(Decimal::from(v)))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(Decimal::from(v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v.is_nan() {
                return Err(E::custom("bound is not a number"));
            }
            Ok(Some(Decimal::try_from(v).unwrap_or(if v.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            })))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Decimal::from_str(v.trim())
                .or_else(|_| Decimal::from_scientific(v.trim()))
                .map(Some)
                .map_err(|_| E::custom(format!("invalid bound: {v}")))
        }
    }
}

impl Constraints {
    /// Create an unconstrained set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both bounds
    pub fn bounds(mut self, minimum: Decimal, maximum: Decimal) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// True when no rule is configured
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A label/value pair offered as an enumerated choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OptionItem {
    pub label: String,
    pub value: String,
}

impl OptionItem {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Presentation metadata carried through to editors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Presentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(default)]
    pub order: i32,
}

/// One field's shape and constraints within a [`SchemaNode`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyNode {
    pub name: String,

    pub kind: Kind,

    /// Kind of the innermost elements (Array only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_kind: Option<Kind>,

    /// Name of the node describing Object / Array-of-Object structure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type_name: Option<String>,

    /// Array nesting depth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,

    /// Fixed per-dimension sizes, used when creating a new array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim_length: Option<Vec<usize>>,

    #[serde(flatten)]
    pub presentation: Presentation,

    #[serde(flatten)]
    pub constraints: Constraints,

    /// Constraints copied into every element of an Array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_constraints: Option<Constraints>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionItem>,
}

impl PropertyNode {
    /// Create a property with no constraints
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            element_kind: None,
            sub_type_name: None,
            dim: None,
            dim_length: None,
            presentation: Presentation::default(),
            constraints: Constraints::default(),
            element_constraints: None,
            options: Vec::new(),
        }
    }

    /// Create an Array property over `dim` nested levels of `element_kind`
    pub fn array(name: impl Into<String>, element_kind: Kind, dim: usize) -> Self {
        let mut property = Self::new(name, Kind::Array);
        property.element_kind = Some(element_kind);
        property.dim = Some(dim);
        property
    }

    /// Set the referenced sub type
    pub fn with_sub_type(mut self, sub_type_name: impl Into<String>) -> Self {
        self.sub_type_name = Some(sub_type_name.into());
        self
    }

    /// Set the constraints
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Set the fixed per-dimension sizes
    pub fn with_dim_length(mut self, dim_length: Vec<usize>) -> Self {
        self.dim_length = Some(dim_length);
        self
    }

    /// Label shown to users: the display name, falling back to the field name
    pub fn label(&self) -> &str {
        self.presentation
            .display_name
            .as_deref()
            .unwrap_or(&self.name)
    }

    /// Nesting depth, at least 1 for arrays and 0 otherwise
    pub fn depth(&self) -> usize {
        match self.kind {
            Kind::Array => self.dim.unwrap_or(1).max(1),
            _ => 0,
        }
    }
}

/// One type's shape within a schema document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchemaNode {
    pub type_name: String,

    #[serde(default)]
    pub main_type: bool,

    #[serde(default)]
    pub properties: Vec<PropertyNode>,
}

impl SchemaNode {
    /// Create a node with no properties
    pub fn new(type_name: impl Into<String>, main_type: bool) -> Self {
        Self {
            type_name: type_name.into(),
            main_type,
            properties: Vec::new(),
        }
    }

    /// Add a property
    pub fn property(mut self, property: PropertyNode) -> Self {
        self.properties.push(property);
        self
    }

    /// Find a property by name
    pub fn find_property(&self, name: &str) -> Option<&PropertyNode> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A complete schema: the ordered node list stored in `X.definition.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDocument {
    nodes: Vec<SchemaNode>,
}

impl SchemaDocument {
    pub fn new(nodes: Vec<SchemaNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[SchemaNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root type of the document
    pub fn main(&self) -> Option<&SchemaNode> {
        self.nodes.iter().find(|n| n.main_type)
    }

    /// Find any node by type name
    pub fn find(&self, type_name: &str) -> Option<&SchemaNode> {
        self.nodes.iter().find(|n| n.type_name == type_name)
    }

    /// Find a non-root node by type name; sub types never resolve to the main type
    pub fn find_sub_type(&self, type_name: &str) -> Option<&SchemaNode> {
        self.nodes
            .iter()
            .find(|n| !n.main_type && n.type_name == type_name)
    }

    /// Check the document invariants: unique type names, exactly one main
    /// type, and every referenced sub type present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.type_name.as_str()) {
                return Err(Error::invalid_schema(format!(
                    "duplicate type name '{}'",
                    node.type_name
                )));
            }
        }

        let main_count = self.nodes.iter().filter(|n| n.main_type).count();
        if main_count != 1 {
            return Err(Error::invalid_schema(format!(
                "expected exactly one main type, found {main_count}"
            )));
        }

        for node in &self.nodes {
            for property in &node.properties {
                if let Some(sub) = &property.sub_type_name {
                    if !seen.contains(sub.as_str()) {
                        return Err(Error::invalid_schema(format!(
                            "property '{}.{}' references unknown type '{sub}'",
                            node.type_name, property.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

impl From<Vec<SchemaNode>> for SchemaDocument {
    fn from(nodes: Vec<SchemaNode>) -> Self {
        Self::new(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SchemaDocument {
        SchemaDocument::new(vec![
            SchemaNode::new("Root", true)
                .property(PropertyNode::new("Child", Kind::Object).with_sub_type("Child")),
            SchemaNode::new("Child", false).property(PropertyNode::new("Name", Kind::String)),
        ])
    }

    #[test]
    fn test_lookup() {
        let schema = sample();
        assert_eq!(schema.main().unwrap().type_name, "Root");
        assert!(schema.find_sub_type("Child").is_some());
        assert!(schema.find_sub_type("Root").is_none());
        assert!(schema.find("Root").is_some());
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_duplicate_names() {
        let schema = SchemaDocument::new(vec![
            SchemaNode::new("Root", true),
            SchemaNode::new("Root", false),
        ]);
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate type name"));
    }

    #[test]
    fn test_validate_main_count() {
        let none = SchemaDocument::new(vec![SchemaNode::new("A", false)]);
        assert!(none.validate().is_err());

        let two = SchemaDocument::new(vec![SchemaNode::new("A", true), SchemaNode::new("B", true)]);
        assert!(two.validate().is_err());
    }

    #[test]
    fn test_validate_dangling_sub_type() {
        let schema = SchemaDocument::new(vec![
            SchemaNode::new("Root", true)
                .property(PropertyNode::new("Missing", Kind::Object).with_sub_type("Nope")),
        ]);
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn test_definition_json_shape() {
        let mut property = PropertyNode::new("Port", Kind::Number)
            .with_constraints(Constraints::new().bounds(Decimal::ZERO, Decimal::from(65535)));
        property.presentation.display_name = Some("Port number".to_string());

        let schema = SchemaDocument::new(vec![SchemaNode::new("Settings", true).property(property)]);
        let json = serde_json::to_value(&schema).unwrap();

        let first = &json[0];
        assert_eq!(first["TypeName"], "Settings");
        assert_eq!(first["MainType"], true);
        let prop = &first["Properties"][0];
        assert_eq!(prop["Name"], "Port");
        assert_eq!(prop["Kind"], "Number");
        assert_eq!(prop["DisplayName"], "Port number");
        assert!(prop.get("Required").is_none());
        assert!(prop.get("AllowedValues").is_none());
        assert_eq!(prop["Minimum"], serde_json::json!(0));
        assert_eq!(prop["Maximum"], serde_json::json!(65535));

        let back: SchemaDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_bounds_are_json_numbers() {
        let fraction = Constraints::new().bounds(Decimal::new(-15, 1), Decimal::new(25, 1));
        let json = serde_json::to_value(&fraction).unwrap();
        assert_eq!(json, serde_json::json!({"Minimum": -1.5, "Maximum": 2.5}));
        assert_eq!(serde_json::from_value::<Constraints>(json).unwrap(), fraction);

        let full = Constraints::new().bounds(Decimal::MIN, Decimal::MAX);
        let text = serde_json::to_string(&full).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(json["Maximum"].is_number());
        assert!(json["Minimum"].is_number());
        assert_eq!(serde_json::from_str::<Constraints>(&text).unwrap(), full);

        let legacy: Constraints = serde_json::from_str(r#"{"Minimum": "1", "Maximum": "10"}"#).unwrap();
        assert_eq!(legacy, Constraints::new().bounds(Decimal::ONE, Decimal::TEN));
    }

    #[test]
    fn test_label_falls_back_to_name() {
        let property = PropertyNode::new("Host", Kind::String);
        assert_eq!(property.label(), "Host");
    }
}
