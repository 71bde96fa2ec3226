//! Schema extraction: type descriptors → schema document
//!
//! The extractor walks a registered type and every distinct type reachable
//! through Object or Array edges. Each type name is expanded once; a type
//! that reaches itself (directly or through a list of itself) is referenced
//! by name afterwards, which bounds the walk by the number of registered
//! types.

use crate::descriptor::{Annotation, FieldDescriptor, FieldType};
use crate::model::{Constraints, Kind, OptionItem, PropertyNode, SchemaDocument, SchemaNode};
use crate::registry::TypeRegistry;
use crate::{Error, Result};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

/// Extract the schema of `root` from `registry`.
///
/// # Errors
///
/// Returns [`Error::UnknownType`] when `root` is not registered and
/// [`Error::Extraction`] for the first field that cannot be classified.
pub fn extract(registry: &TypeRegistry, root: &str) -> Result<SchemaDocument> {
    SchemaExtractor::new(registry).extract(root)
}

/// Classification of a non-list field type
struct Leaf {
    kind: Kind,
    bounds: Option<(Decimal, Decimal)>,
    options: Vec<OptionItem>,
    sub_type: Option<String>,
}

impl Leaf {
    fn scalar(kind: Kind) -> Self {
        Self {
            kind,
            bounds: None,
            options: Vec::new(),
            sub_type: None,
        }
    }

    fn number(min: impl Into<Decimal>, max: impl Into<Decimal>) -> Self {
        Self {
            bounds: Some((min.into(), max.into())),
            ..Self::scalar(Kind::Number)
        }
    }
}

/// Walks type descriptors into an ordered list of schema nodes
pub struct SchemaExtractor<'a> {
    registry: &'a TypeRegistry,
    nodes: Vec<SchemaNode>,
}

impl<'a> SchemaExtractor<'a> {
    #[must_use]
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
        }
    }

    /// Run the extraction. The root node is marked as the main type.
    ///
    /// # Errors
    ///
    /// See [`extract`].
    pub fn extract(mut self, root: &str) -> Result<SchemaDocument> {
        if self.registry.get(root).is_none() {
            return Err(Error::UnknownType(root.to_string()));
        }
        self.expand(root, true)?;
        debug!(root, types = self.nodes.len(), "extracted schema");
        Ok(SchemaDocument::new(self.nodes))
    }

    fn expand(&mut self, type_name: &str, main_type: bool) -> Result<()> {
        if self.nodes.iter().any(|n| n.type_name == type_name) {
            trace!(type_name, "type already expanded");
            return Ok(());
        }

        let registry = self.registry;
        let Some(descriptor) = registry.get(type_name) else {
            return Err(Error::UnknownType(type_name.to_string()));
        };

        // Register the node before its fields so self references stop here.
        let index = self.nodes.len();
        self.nodes.push(SchemaNode::new(type_name, main_type));

        let mut properties = Vec::with_capacity(descriptor.fields.len());
        for field in &descriptor.fields {
            properties.push(self.property(type_name, field)?);
        }
        self.nodes[index].properties = properties;
        Ok(())
    }

    fn property(&mut self, owner: &str, field: &FieldDescriptor) -> Result<PropertyNode> {
        trace!(owner, field = %field.name, ty = %field.field_type, "classifying field");

        let mut property = if let FieldType::List(_) = field.field_type {
            self.array_property(owner, field)?
        } else {
            let leaf = self.classify(owner, field, &field.field_type)?;
            let mut property = PropertyNode::new(&field.name, leaf.kind);
            if let Some((min, max)) = leaf.bounds {
                property.constraints = property.constraints.bounds(min, max);
            }
            property.options = leaf.options;
            property.sub_type_name = leaf.sub_type;
            property
        };

        apply_annotations(owner, field, &mut property)?;
        Ok(property)
    }

    fn array_property(&mut self, owner: &str, field: &FieldDescriptor) -> Result<PropertyNode> {
        let mut dim = 0;
        let mut inner = &field.field_type;
        while let FieldType::List(element) = inner {
            dim += 1;
            inner = element;
        }

        let leaf = self.classify(owner, field, inner)?;
        let mut property = PropertyNode::array(&field.name, leaf.kind, dim);
        property.sub_type_name = leaf.sub_type;
        property.options = leaf.options;
        if let Some((min, max)) = leaf.bounds {
            property.element_constraints = Some(Constraints::new().bounds(min, max));
        }
        Ok(property)
    }

    fn classify(&mut self, owner: &str, field: &FieldDescriptor, ty: &FieldType) -> Result<Leaf> {
        let registry = self.registry;
        let leaf = match ty {
            FieldType::String => Leaf::scalar(Kind::String),
            FieldType::Char => Leaf {
                bounds: Some((Decimal::ONE, Decimal::ONE)),
                ..Leaf::scalar(Kind::String)
            },
            FieldType::Bool => Leaf::scalar(Kind::Boolean),
            FieldType::I8 => Leaf::number(i8::MIN, i8::MAX),
            FieldType::I16 => Leaf::number(i16::MIN, i16::MAX),
            FieldType::I32 => Leaf::number(i32::MIN, i32::MAX),
            FieldType::I64 => Leaf::number(i64::MIN, i64::MAX),
            FieldType::U8 => Leaf::number(u8::MIN, u8::MAX),
            FieldType::U16 => Leaf::number(u16::MIN, u16::MAX),
            FieldType::U32 => Leaf::number(u32::MIN, u32::MAX),
            FieldType::U64 => Leaf::number(u64::MIN, u64::MAX),
            FieldType::F32 | FieldType::F64 | FieldType::Decimal => {
                Leaf::number(Decimal::MIN, Decimal::MAX)
            }
            FieldType::DateTime => Leaf::scalar(Kind::DateTime),
            FieldType::DateOnly => Leaf::scalar(Kind::DateOnly),
            FieldType::TimeOnly => Leaf::scalar(Kind::TimeOnly),
            FieldType::Named(name) => {
                if let Some(members) = registry.get_enum(name) {
                    Leaf {
                        options: members
                            .members
                            .iter()
                            .map(|(label, value)| OptionItem::new(label, value.to_string()))
                            .collect(),
                        ..Leaf::scalar(Kind::Number)
                    }
                } else if registry.get(name).is_some() {
                    self.expand(name, false)?;
                    Leaf {
                        sub_type: Some(name.clone()),
                        ..Leaf::scalar(Kind::Object)
                    }
                } else {
                    return Err(Error::extraction(
                        owner,
                        &field.name,
                        format!("type '{name}' is not registered"),
                    ));
                }
            }
            FieldType::List(_) => {
                return Err(Error::extraction(
                    owner,
                    &field.name,
                    "nested list outside of an array field",
                ));
            }
            FieldType::Unsupported(expr) => {
                return Err(Error::extraction(
                    owner,
                    &field.name,
                    format!("unsupported type '{expr}'"),
                ));
            }
        };
        Ok(leaf)
    }
}

/// Apply a field's annotations in declaration order.
///
/// On arrays, length tags bound the element count while value tags
/// (range, allow/deny lists, pattern) constrain every element.
fn apply_annotations(
    owner: &str,
    field: &FieldDescriptor,
    property: &mut PropertyNode,
) -> Result<()> {
    let is_array = property.kind == Kind::Array;

    for annotation in &field.annotations {
        match annotation {
            Annotation::Display {
                name,
                description,
                group,
                order,
                prompt,
            } => {
                let presentation = &mut property.presentation;
                presentation.display_name.clone_from(name);
                presentation.description.clone_from(description);
                presentation.group_name.clone_from(group);
                presentation.order = order.unwrap_or(0);
                presentation.prompt.clone_from(prompt);
            }
            Annotation::Range { min, max } => {
                if min > max {
                    return Err(Error::extraction(
                        owner,
                        &field.name,
                        format!("range minimum {min} exceeds maximum {max}"),
                    ));
                }
                let target = value_constraints(property, is_array);
                target.minimum = Some(*min);
                target.maximum = Some(*max);
            }
            Annotation::Required => property.constraints.required = true,
            Annotation::AllowedValues(values) => {
                value_constraints(property, is_array).allowed_values.clone_from(values);
            }
            Annotation::DeniedValues(values) => {
                value_constraints(property, is_array).denied_values.clone_from(values);
            }
            Annotation::Length { min, max } => {
                property.constraints.minimum = Some(Decimal::from(*min));
                property.constraints.maximum = Some(Decimal::from(*max));
            }
            Annotation::MinLength(min) => {
                property.constraints.minimum = Some(Decimal::from(*min));
            }
            Annotation::MaxLength(max) => {
                property.constraints.maximum = Some(Decimal::from(*max));
            }
            Annotation::RegularExpression(pattern) => {
                if let Err(e) = Regex::new(pattern) {
                    return Err(Error::extraction(
                        owner,
                        &field.name,
                        format!("invalid regular expression '{pattern}': {e}"),
                    ));
                }
                value_constraints(property, is_array).regular_expression = Some(pattern.clone());
            }
            Annotation::Option { label, value } => {
                property.options.push(OptionItem::new(label, value));
            }
            Annotation::DimLength(lengths) => {
                if is_array {
                    property.dim_length = Some(lengths.clone());
                } else {
                    warn!(owner, field = %field.name, "dim length ignored on non-array field");
                }
            }
            Annotation::Default(_) => {}
        }
    }

    Ok(())
}

fn value_constraints(property: &mut PropertyNode, is_array: bool) -> &mut Constraints {
    if is_array {
        property
            .element_constraints
            .get_or_insert_with(Constraints::default)
    } else {
        &mut property.constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{EnumDescriptor, TypeDescriptor};

    fn demo_registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register_enum(EnumDescriptor::ordinal("DemoEnum", ["Value1", "Value2", "Value3"]))
            .register(
                TypeDescriptor::new("DemoConfig")
                    .field(
                        FieldDescriptor::new("String", FieldType::String)
                            .with(Annotation::allowed(["123"]))
                            .with(Annotation::Required)
                            .with(Annotation::Length { min: 1, max: 10 }),
                    )
                    .field(
                        FieldDescriptor::new("Int", FieldType::I32)
                            .with(Annotation::range(1, 10))
                            .with(Annotation::Required)
                            .with(Annotation::display_name("Number"))
                            .with(Annotation::denied(["1", "2"])),
                    )
                    .field(FieldDescriptor::new("Byte", FieldType::U8))
                    .field(FieldDescriptor::new("Char", FieldType::Char))
                    .field(FieldDescriptor::new("Double", FieldType::F64))
                    .field(FieldDescriptor::new("Enum", FieldType::named("DemoEnum")))
                    .field(FieldDescriptor::new("Demo2", FieldType::named("Demo2")))
                    .field(FieldDescriptor::new(
                        "Demo2s",
                        FieldType::list(FieldType::named("Demo2")),
                    ))
                    .field(
                        FieldDescriptor::new(
                            "IntInts",
                            FieldType::list(FieldType::list(FieldType::I32)),
                        )
                        .with(Annotation::DimLength(vec![2, 3])),
                    ),
            )
            .register(
                TypeDescriptor::new("Demo2")
                    .field(FieldDescriptor::new("Name", FieldType::String))
                    .field(FieldDescriptor::new(
                        "Demo2s",
                        FieldType::list(FieldType::named("Demo2")),
                    ))
                    .field(FieldDescriptor::new("Parent", FieldType::named("Demo2"))),
            );
        registry
    }

    #[test]
    fn test_main_type_and_order() {
        let schema = extract(&demo_registry(), "DemoConfig").unwrap();
        let names: Vec<_> = schema.nodes().iter().map(|n| n.type_name.as_str()).collect();
        assert_eq!(names, vec!["DemoConfig", "Demo2"]);
        assert!(schema.nodes()[0].main_type);
        assert!(!schema.nodes()[1].main_type);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_self_reference_yields_single_node() {
        let schema = extract(&demo_registry(), "Demo2").unwrap();
        assert_eq!(schema.len(), 1);
        let node = schema.main().unwrap();
        let list = node.find_property("Demo2s").unwrap();
        assert_eq!(list.sub_type_name.as_deref(), Some("Demo2"));
        let parent = node.find_property("Parent").unwrap();
        assert_eq!(parent.kind, Kind::Object);
    }

    #[test]
    fn test_natural_bounds() {
        let schema = extract(&demo_registry(), "DemoConfig").unwrap();
        let main = schema.main().unwrap();

        let byte = main.find_property("Byte").unwrap();
        assert_eq!(byte.kind, Kind::Number);
        assert_eq!(byte.constraints.minimum, Some(Decimal::ZERO));
        assert_eq!(byte.constraints.maximum, Some(Decimal::from(255)));

        let double = main.find_property("Double").unwrap();
        assert_eq!(double.constraints.minimum, Some(Decimal::MIN));
        assert_eq!(double.constraints.maximum, Some(Decimal::MAX));
    }

    #[test]
    fn test_explicit_range_overrides_natural_bounds() {
        let schema = extract(&demo_registry(), "DemoConfig").unwrap();
        let int = schema.main().unwrap().find_property("Int").unwrap();
        assert_eq!(int.constraints.minimum, Some(Decimal::ONE));
        assert_eq!(int.constraints.maximum, Some(Decimal::from(10)));
        assert!(int.constraints.required);
        assert_eq!(int.constraints.denied_values, vec!["1", "2"]);
        assert_eq!(int.label(), "Number");
    }

    #[test]
    fn test_char_is_single_character_string() {
        let schema = extract(&demo_registry(), "DemoConfig").unwrap();
        let ch = schema.main().unwrap().find_property("Char").unwrap();
        assert_eq!(ch.kind, Kind::String);
        assert_eq!(ch.constraints.minimum, Some(Decimal::ONE));
        assert_eq!(ch.constraints.maximum, Some(Decimal::ONE));
    }

    #[test]
    fn test_enum_projects_to_number_with_options() {
        let schema = extract(&demo_registry(), "DemoConfig").unwrap();
        let e = schema.main().unwrap().find_property("Enum").unwrap();
        assert_eq!(e.kind, Kind::Number);
        assert_eq!(e.options.len(), 3);
        assert_eq!(e.options[1], OptionItem::new("Value2", "1"));
    }

    #[test]
    fn test_nested_list_dim() {
        let schema = extract(&demo_registry(), "DemoConfig").unwrap();
        let grid = schema.main().unwrap().find_property("IntInts").unwrap();
        assert_eq!(grid.kind, Kind::Array);
        assert_eq!(grid.dim, Some(2));
        assert_eq!(grid.element_kind, Some(Kind::Number));
        assert_eq!(grid.dim_length, Some(vec![2, 3]));
        assert!(grid.sub_type_name.is_none());
        let element = grid.element_constraints.as_ref().unwrap();
        assert_eq!(element.minimum, Some(Decimal::from(i32::MIN)));
    }

    #[test]
    fn test_array_annotations_split_count_and_element() {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("Root").field(
                FieldDescriptor::new("Codes", FieldType::list(FieldType::String))
                    .with(Annotation::MaxLength(4))
                    .with(Annotation::RegularExpression("[A-Z]{3}".to_string())),
            ),
        );
        let schema = extract(&registry, "Root").unwrap();
        let codes = schema.main().unwrap().find_property("Codes").unwrap();
        assert_eq!(codes.constraints.maximum, Some(Decimal::from(4)));
        assert_eq!(
            codes
                .element_constraints
                .as_ref()
                .and_then(|c| c.regular_expression.as_deref()),
            Some("[A-Z]{3}")
        );
    }

    #[test]
    fn test_unsupported_field_is_fatal() {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("Root")
                .field(FieldDescriptor::new("Ok", FieldType::I32))
                .field(FieldDescriptor::new("Span", FieldType::parse("TimeSpan"))),
        );
        let err = extract(&registry, "Root").unwrap_err();
        match err {
            Error::Extraction {
                type_name, field, ..
            } => {
                assert_eq!(type_name, "Root");
                assert_eq!(field, "Span");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unregistered_reference_is_fatal() {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("Root").field(FieldDescriptor::new(
                "Items",
                FieldType::list(FieldType::named("Ghost")),
            )),
        );
        let err = extract(&registry, "Root").unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn test_invalid_regex_is_fatal() {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("Root").field(
                FieldDescriptor::new("Code", FieldType::String)
                    .with(Annotation::RegularExpression("(".to_string())),
            ),
        );
        assert!(matches!(
            extract(&registry, "Root"),
            Err(Error::Extraction { .. })
        ));
    }

    #[test]
    fn test_unknown_root() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            extract(&registry, "Nothing"),
            Err(Error::UnknownType(_))
        ));
    }
}
