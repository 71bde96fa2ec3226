//! Type descriptors: the registration-time description of a type's fields
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use rust_decimal::Decimal;
use std::fmt;

/// Declared type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Char,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    DateTime,
    DateOnly,
    TimeOnly,
    /// A registered enumeration or class, resolved by name
    Named(String),
    /// Array or list of the inner type
    List(Box<FieldType>),
    /// A recognised type expression with no schema representation
    Unsupported(String),
}

impl FieldType {
    /// Shorthand for `List(inner)`
    pub fn list(inner: FieldType) -> Self {
        FieldType::List(Box::new(inner))
    }

    /// Shorthand for `Named(name)`
    pub fn named(name: impl Into<String>) -> Self {
        FieldType::Named(name.into())
    }

    /// Parse a type expression such as `u8`, `List<Item>`, `double[][]` or
    /// `Option<string>`. Unknown generic shapes become [`FieldType::Unsupported`];
    /// bare identifiers become [`FieldType::Named`].
    pub fn parse(expr: &str) -> Self {
        let expr = expr.trim();

        if let Some(inner) = expr.strip_suffix("[]") {
            return FieldType::list(FieldType::parse(inner));
        }

        if let Some((outer, inner)) = split_generic(expr) {
            return match outer {
                "List" | "Vec" | "Array" | "IList" | "IEnumerable" => {
                    FieldType::list(FieldType::parse(inner))
                }
                "Option" | "Nullable" => FieldType::parse(inner),
                _ => FieldType::Unsupported(expr.to_string()),
            };
        }

        match expr {
            "string" | "String" | "str" => FieldType::String,
            "char" | "Char" => FieldType::Char,
            "bool" | "Boolean" | "boolean" => FieldType::Bool,
            "i8" | "sbyte" | "SByte" => FieldType::I8,
            "i16" | "short" | "Int16" => FieldType::I16,
            "i32" | "int" | "Int32" => FieldType::I32,
            "i64" | "long" | "Int64" => FieldType::I64,
            "u8" | "byte" | "Byte" => FieldType::U8,
            "u16" | "ushort" | "UInt16" => FieldType::U16,
            "u32" | "uint" | "UInt32" => FieldType::U32,
            "u64" | "ulong" | "UInt64" => FieldType::U64,
            "f32" | "float" | "Single" => FieldType::F32,
            "f64" | "double" | "Double" => FieldType::F64,
            "decimal" | "Decimal" => FieldType::Decimal,
            "DateTime" | "datetime" => FieldType::DateTime,
            "DateOnly" | "date" | "NaiveDate" => FieldType::DateOnly,
            "TimeOnly" | "time" | "NaiveTime" => FieldType::TimeOnly,
            "TimeSpan" | "Duration" | "object" | "dynamic" => {
                FieldType::Unsupported(expr.to_string())
            }
            name if is_identifier(name) => FieldType::Named(name.to_string()),
            _ => FieldType::Unsupported(expr.to_string()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Char => f.write_str("char"),
            FieldType::Bool => f.write_str("bool"),
            FieldType::I8 => f.write_str("i8"),
            FieldType::I16 => f.write_str("i16"),
            FieldType::I32 => f.write_str("i32"),
            FieldType::I64 => f.write_str("i64"),
            FieldType::U8 => f.write_str("u8"),
            FieldType::U16 => f.write_str("u16"),
            FieldType::U32 => f.write_str("u32"),
            FieldType::U64 => f.write_str("u64"),
            FieldType::F32 => f.write_str("f32"),
            FieldType::F64 => f.write_str("f64"),
            FieldType::Decimal => f.write_str("decimal"),
            FieldType::DateTime => f.write_str("DateTime"),
            FieldType::DateOnly => f.write_str("DateOnly"),
            FieldType::TimeOnly => f.write_str("TimeOnly"),
            FieldType::Named(name) | FieldType::Unsupported(name) => f.write_str(name),
            FieldType::List(inner) => write!(f, "List<{inner}>"),
        }
    }
}

fn split_generic(expr: &str) -> Option<(&str, &str)> {
    let open = expr.find('<')?;
    let inner = expr.strip_suffix('>')?;
    Some((expr[..open].trim(), inner[open + 1..].trim()))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// Constraint and presentation tags attached to a field at registration time.
///
/// Tags apply in order; a later tag overrides what an earlier one set.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Display {
        name: Option<String>,
        description: Option<String>,
        group: Option<String>,
        order: Option<i32>,
        prompt: Option<String>,
    },
    Range {
        min: Decimal,
        max: Decimal,
    },
    Required,
    AllowedValues(Vec<String>),
    DeniedValues(Vec<String>),
    Length {
        min: usize,
        max: usize,
    },
    MinLength(usize),
    MaxLength(usize),
    RegularExpression(String),
    Option {
        label: String,
        value: String,
    },
    DimLength(Vec<usize>),
    /// Value used for this field in a generated default instance
    Default(serde_json::Value),
}

impl Annotation {
    /// A display tag carrying only a name
    pub fn display_name(name: impl Into<String>) -> Self {
        Annotation::Display {
            name: Some(name.into()),
            description: None,
            group: None,
            order: None,
            prompt: None,
        }
    }

    /// A numeric range tag
    pub fn range(min: impl Into<Decimal>, max: impl Into<Decimal>) -> Self {
        Annotation::Range {
            min: min.into(),
            max: max.into(),
        }
    }

    /// An allow-list tag
    pub fn allowed<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Annotation::AllowedValues(values.into_iter().map(Into::into).collect())
    }

    /// A deny-list tag
    pub fn denied<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Annotation::DeniedValues(values.into_iter().map(Into::into).collect())
    }

    /// An enumerated choice tag
    pub fn option(label: impl Into<String>, value: impl Into<String>) -> Self {
        Annotation::Option {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One field of a registered type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub annotations: Vec<Annotation>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            annotations: Vec::new(),
        }
    }

    /// Attach an annotation
    pub fn with(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Explicit default value, if one was annotated
    pub fn default_value(&self) -> Option<&serde_json::Value> {
        self.annotations.iter().rev().find_map(|a| match a {
            Annotation::Default(value) => Some(value),
            _ => None,
        })
    }
}

/// A class-like type: a name and an ordered field list
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

/// An enumeration: ordered members with their discriminants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: String,
    pub members: Vec<(String, i64)>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Append a member with an explicit discriminant
    pub fn member(mut self, name: impl Into<String>, value: i64) -> Self {
        self.members.push((name.into(), value));
        self
    }

    /// Build from member names, numbering them by ordinal
    pub fn ordinal<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).zip(0..).collect(),
        }
    }
}
