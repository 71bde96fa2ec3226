//! Node addressing and cursor navigation
//!
//! Nodes are addressed structurally by a [`NodePath`] of child positions, or
//! textually as `Demo2s[0].Int`: names select object properties, bracketed
//! indices select array elements.

use crate::node::EditableNode;
use crate::{Error, Result};
use confed_schema::Kind;
use confed_validation::child_path;
use std::fmt;

/// Child positions from the root to a node; empty for the root itself
pub type NodePath = Vec<usize>;

/// One step of a textual path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(idx) => write!(f, "[{idx}]"),
        }
    }
}

/// Split a textual path such as `Demo2s[0].Int` into segments
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] on empty names, unclosed brackets or
/// non-numeric indices.
pub fn parse(path: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    if path.is_empty() {
        return Ok(segments);
    }

    for part in path.split('.') {
        let (name, mut rest) = match part.find('[') {
            Some(open) => (&part[..open], &part[open..]),
            None => (part, ""),
        };
        if name.is_empty() {
            return Err(Error::invalid_path(path, "empty segment"));
        }
        segments.push(Segment::Field(name.to_string()));

        while !rest.is_empty() {
            let close = rest
                .find(']')
                .ok_or_else(|| Error::invalid_path(path, format!("unclosed bracket in '{part}'")))?;
            let index = rest[1..close]
                .trim()
                .parse()
                .map_err(|_| Error::invalid_path(path, format!("invalid index in '{part}'")))?;
            segments.push(Segment::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(Error::invalid_path(
                    path,
                    format!("unexpected text after index in '{part}'"),
                ));
            }
        }
    }
    Ok(segments)
}

/// A read-only position in an editable tree
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    node: &'a EditableNode,
    path: NodePath,
    display: Option<String>,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the root of a tree
    #[must_use]
    pub fn new(root: &'a EditableNode) -> Self {
        Self {
            node: root,
            path: Vec::new(),
            display: None,
        }
    }

    #[must_use]
    pub fn node(&self) -> &'a EditableNode {
        self.node
    }

    /// Structural path from the root
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    #[must_use]
    pub fn into_path(self) -> NodePath {
        self.path
    }

    /// Textual path from the root, in the same form validation reports use
    #[must_use]
    pub fn display(&self) -> String {
        self.display
            .clone()
            .unwrap_or_else(|| self.node.name.clone())
    }

    /// Navigate to an object property by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] when this is not an object or it has no such property.
    pub fn child(&self, name: &str) -> Result<Cursor<'a>> {
        if self.node.kind() != Kind::Object {
            return Err(Error::invalid_path(
                self.joined(&Segment::Field(name.to_string())),
                format!("'{}' is not an object", self.display()),
            ));
        }
        let idx = self
            .node
            .children()
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| {
                Error::invalid_path(
                    self.joined(&Segment::Field(name.to_string())),
                    "no such property",
                )
            })?;
        Ok(self.step(idx))
    }

    /// Navigate to an array element by position
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] when this is not an array or the index is out of range.
    pub fn child_at(&self, index: usize) -> Result<Cursor<'a>> {
        let segment = Segment::Index(index);
        if self.node.kind() != Kind::Array {
            return Err(Error::invalid_path(
                self.joined(&segment),
                format!("'{}' is not an array", self.display()),
            ));
        }
        if index >= self.node.children().len() {
            return Err(Error::invalid_path(
                self.joined(&segment),
                format!("index out of range (length {})", self.node.children().len()),
            ));
        }
        Ok(self.step(index))
    }

    /// Navigate along a textual path such as `Demo2s[0].Int`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] when the path is malformed or does not resolve.
    pub fn navigate(&self, path: &str) -> Result<Cursor<'a>> {
        let mut cursor = self.clone();
        for segment in parse(path)? {
            cursor = match segment {
                Segment::Field(name) => cursor.child(&name)?,
                Segment::Index(idx) => cursor.child_at(idx)?,
            };
        }
        Ok(cursor)
    }

    fn step(&self, idx: usize) -> Cursor<'a> {
        let child = &self.node.children()[idx];
        let mut path = self.path.clone();
        path.push(idx);
        Cursor {
            node: child,
            path,
            display: Some(child_path(
                self.display.as_deref(),
                self.node.kind(),
                idx,
                &child.name,
            )),
        }
    }

    fn joined(&self, segment: &Segment) -> String {
        match (&self.display, segment) {
            (None, segment) => segment.to_string(),
            (Some(base), Segment::Index(_)) => format!("{base}{segment}"),
            (Some(base), Segment::Field(_)) => format!("{base}.{segment}"),
        }
    }
}

/// Resolve a structural path from `root`
pub fn node_at<'a>(root: &'a EditableNode, path: &[usize]) -> Option<&'a EditableNode> {
    path.iter()
        .try_fold(root, |node, &idx| node.children().get(idx))
}

/// Mutable counterpart of [`node_at`]
pub fn node_at_mut<'a>(root: &'a mut EditableNode, path: &[usize]) -> Option<&'a mut EditableNode> {
    let mut node = root;
    for &idx in path {
        node = node.child_mut(idx)?;
    }
    Some(node)
}

/// Textual form of a structural path
pub fn display_path(root: &EditableNode, path: &[usize]) -> Option<String> {
    let mut cursor = Cursor::new(root);
    for &idx in path {
        if idx >= cursor.node.children().len() {
            return None;
        }
        cursor = cursor.step(idx);
    }
    Some(cursor.display())
}

/// Visit every node depth-first, parents before children, with its textual path and depth
pub fn walk<F>(root: &EditableNode, mut visit: F)
where
    F: FnMut(&EditableNode, &str, usize),
{
    walk_recursive(&Cursor::new(root), &mut visit, 0);
}

fn walk_recursive<F>(cursor: &Cursor<'_>, visit: &mut F, depth: usize)
where
    F: FnMut(&EditableNode, &str, usize),
{
    visit(cursor.node, &cursor.display(), depth);
    for idx in 0..cursor.node.children().len() {
        walk_recursive(&cursor.step(idx), visit, depth + 1);
    }
}
