//! Serializer: editable tree → canonical JSON document
//!
//! The whole tree is validated before anything is emitted; the first
//! violation aborts serialization, so an invalid document is never
//! produced.

use crate::grid;
use crate::node::{EditableNode, Layout};
use crate::{Error, Result};
use confed_schema::Kind;
use confed_validation::format::{Canonical, canonical};
use confed_validation::{ValidationConfig, ValidationEngine};
use serde_json::{Map, Number, Value};
use std::str::FromStr;
use tracing::debug;

/// Serializes validated trees
#[derive(Debug, Clone)]
pub struct Serializer {
    engine: ValidationEngine,
}

impl Serializer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: ValidationEngine::with_config(ValidationConfig::fail_fast()),
        }
    }

    /// Validate `root` and emit its canonical document
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first failing node and rule.
    pub fn serialize(&self, root: &EditableNode) -> Result<Value> {
        if let Some(issue) = self.engine.validate(root).into_issues().into_iter().next() {
            debug!(path = %issue.path, rule = %issue.rule, "serialization refused");
            return Err(Error::Validation {
                path: issue.path,
                rule: issue.rule,
                message: issue.message,
            });
        }
        Ok(emit(root)?.unwrap_or(Value::Null))
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize with a default [`Serializer`]
///
/// # Errors
///
/// See [`Serializer::serialize`].
pub fn serialize(root: &EditableNode) -> Result<Value> {
    Serializer::new().serialize(root)
}

/// The node's JSON value, `None` for unset scalars and placeholder objects
fn emit(node: &EditableNode) -> Result<Option<Value>> {
    match node.kind() {
        Kind::Object => {
            if !node.is_materialized() {
                return Ok(None);
            }
            if let Some(fragment) = node.retained() {
                return Ok(Some(fragment.clone()));
            }
            let mut map = Map::new();
            for child in node.children() {
                if let Some(value) = emit(child)? {
                    map.insert(child.name.clone(), value);
                }
            }
            Ok(Some(Value::Object(map)))
        }
        Kind::Array => {
            let values = node
                .children()
                .iter()
                .map(|child| Ok(emit(child)?.unwrap_or(Value::Null)))
                .collect::<Result<Vec<_>>>()?;
            let value = match node.layout() {
                Layout::Grid if node.extents().len() > 1 => {
                    grid::fold(values, &grid::lengths(node.extents()))
                }
                _ => Value::Array(values),
            };
            Ok(Some(value))
        }
        kind => {
            let Some(text) = node.value() else {
                return Ok(None);
            };
            if kind != Kind::String && text.trim().is_empty() {
                return Ok(None);
            }
            let value = match canonical(kind, text)? {
                Canonical::Text(text) => Value::String(text),
                Canonical::Boolean(b) => Value::Bool(b),
                Canonical::Number(digits) => {
                    Number::from_str(&digits).map_or(Value::String(digits), Value::Number)
                }
            };
            Ok(Some(value))
        }
    }
}
