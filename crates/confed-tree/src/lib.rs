#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # confed-tree
//!
//! Editable, continuously validated node trees over JSON documents.
//!
//! A [`TreeBuilder`] binds a [`SchemaDocument`](confed_schema::SchemaDocument)
//! to an existing (or absent) document and produces an [`EditableNode`]
//! tree. [`EditableTree`] applies edits and keeps every node's validity
//! current; the [`Serializer`] turns a valid tree back into a canonical
//! document and refuses invalid ones.
//!
//! ```rust
//! use confed_schema::{Kind, PropertyNode, SchemaDocument, SchemaNode};
//! use confed_tree::{EditableTree, serialize};
//! use serde_json::json;
//!
//! let schema = SchemaDocument::new(vec![
//!     SchemaNode::new("Settings", true).property(PropertyNode::new("Port", Kind::Number)),
//! ]);
//!
//! let mut tree = EditableTree::build(schema, Some(&json!({ "Port": 80 }))).unwrap();
//! let port = tree.resolve("Port").unwrap();
//! tree.set_value(&port, Some("8080".to_string())).unwrap();
//!
//! assert_eq!(serialize(tree.root()).unwrap(), json!({ "Port": 8080 }));
//! ```

/// Schema + document → editable tree.
pub mod builder;
/// Multi-dimensional grid layout helpers.
pub mod grid;
/// Runtime tree node.
pub mod node;
/// Node addressing and cursor navigation.
pub mod path;
/// Editable tree → canonical document.
pub mod serializer;
/// Edit operations over a whole tree.
pub mod tree;

pub use builder::TreeBuilder;
pub use grid::DimExtent;
pub use node::{EditableNode, Layout};
pub use path::{Cursor, NodePath, Segment};
pub use serializer::{Serializer, serialize};
pub use tree::EditableTree;

use confed_validation::RuleKind;
use thiserror::Error;

/// Errors that can occur when building, editing or serializing trees
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed at '{path}': {message} ({rule})")]
    Validation {
        path: String,
        rule: RuleKind,
        message: String,
    },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid edit on '{path}': {reason}")]
    InvalidEdit { path: String, reason: String },

    #[error(transparent)]
    Schema(#[from] confed_schema::Error),

    #[error(transparent)]
    Rules(#[from] confed_validation::Error),
}

impl Error {
    /// Build an invalid-path error with the input path and the reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-edit error for the node at `path`.
    pub fn invalid_edit(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEdit {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for tree operations.
pub type Result<T> = std::result::Result<T, Error>;
