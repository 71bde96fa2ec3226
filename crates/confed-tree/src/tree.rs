//! Edit operations over a whole tree
//!
//! Every edit is applied to one node and is followed, before it returns, by
//! a validity refresh of that node and each of its ancestors in turn.

use crate::builder::TreeBuilder;
use crate::grid;
use crate::node::{EditableNode, Layout};
use crate::path::{Cursor, NodePath, display_path, node_at, node_at_mut};
use crate::{Error, Result};
use confed_schema::{Kind, SchemaDocument};
use confed_validation::{ValidationEngine, ValidationReport};
use serde_json::Value;
use tracing::debug;

/// An editable tree together with the schema it was built from
#[derive(Debug, Clone)]
pub struct EditableTree {
    schema: SchemaDocument,
    root: EditableNode,
}

impl EditableTree {
    /// Build a tree over `document`, or over nothing for a new document
    ///
    /// # Errors
    ///
    /// Fails when the schema has no main type or a pattern does not compile.
    pub fn build(schema: SchemaDocument, document: Option<&Value>) -> Result<Self> {
        let root = TreeBuilder::new(&schema).build(document)?;
        Ok(Self { schema, root })
    }

    #[must_use]
    pub fn root(&self) -> &EditableNode {
        &self.root
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaDocument {
        &self.schema
    }

    #[must_use]
    pub fn into_root(self) -> EditableNode {
        self.root
    }

    /// Whether every node of the tree is valid
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.root.is_valid()
    }

    /// Collect every violation in the tree
    #[must_use]
    pub fn report(&self) -> ValidationReport {
        ValidationEngine::new().validate(&self.root)
    }

    #[must_use]
    pub fn node(&self, path: &[usize]) -> Option<&EditableNode> {
        node_at(&self.root, path)
    }

    /// Resolve a textual path such as `Demo2s[0].Int`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] when the path does not resolve.
    pub fn resolve(&self, path: &str) -> Result<NodePath> {
        Ok(Cursor::new(&self.root).navigate(path)?.into_path())
    }

    /// Textual form of a structural path
    #[must_use]
    pub fn display_path(&self, path: &[usize]) -> String {
        display_path(&self.root, path).unwrap_or_else(|| format!("{path:?}"))
    }

    /// Replace a scalar's value; `None` unsets it
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEdit`] when the node is an Object or Array.
    pub fn set_value(&mut self, path: &[usize], value: Option<String>) -> Result<()> {
        let node = self.node_mut(path)?;
        if node.kind().is_composite() {
            return Err(self.edit_error(path, "only scalar nodes hold values"));
        }
        node.set_value(value);
        debug!(path = %self.display_path(path), "value changed");
        self.refresh(path);
        Ok(())
    }

    /// Append one element to an Array and return its path
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEdit`] when the node is not an Array or is a
    /// multi-dimensional grid, which only changes size through [`Self::set_dim_length`].
    pub fn add_element(&mut self, path: &[usize]) -> Result<NodePath> {
        let array = self.array_ref(path)?;
        if array.layout() == Layout::Grid && array.extents().len() > 1 {
            return Err(self.edit_error(path, "grid arrays are resized by dimension"));
        }

        let mut index = array.index.clone();
        index.push(array.children().len());
        let element = TreeBuilder::new(&self.schema).new_element(array, index)?;

        let array = self.array_mut(path)?;
        array.children_mut().push(element);
        let len = array.children().len();
        if let Some(first) = array.extents_mut().first_mut() {
            first.length = len;
        }

        let mut element_path = path.to_vec();
        element_path.push(len - 1);
        debug!(path = %self.display_path(path), len, "element added");
        self.refresh(path);
        Ok(element_path)
    }

    /// Remove the element at `path` from its Array and renumber its siblings
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEdit`] when the parent is not an Array or is a
    /// multi-dimensional grid.
    pub fn remove_element(&mut self, path: &[usize]) -> Result<()> {
        let Some((&idx, parent_path)) = path.split_last() else {
            return Err(self.edit_error(path, "the root cannot be removed"));
        };
        self.node(path)
            .ok_or_else(|| Error::invalid_path(format!("{path:?}"), "no such node"))?;

        let array = self.array_mut(parent_path)?;
        if array.layout() == Layout::Grid && array.extents().len() > 1 {
            return Err(self.edit_error(parent_path, "grid arrays are resized by dimension"));
        }
        array.children_mut().remove(idx);
        let len = array.children().len();
        if let Some(first) = array.extents_mut().first_mut() {
            first.length = len;
        }
        array.relabel();

        debug!(path = %self.display_path(parent_path), len, "element removed");
        self.refresh(parent_path);
        Ok(())
    }

    /// Populate an Object placeholder with one level of default children.
    /// Already materialized objects are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEdit`] when the node is not an Object.
    pub fn materialize(&mut self, path: &[usize]) -> Result<()> {
        let node = self.node_ref(path)?;
        if node.kind() != Kind::Object {
            return Err(self.edit_error(path, "only objects can be materialized"));
        }
        if node.is_materialized() {
            return Ok(());
        }

        let children = TreeBuilder::new(&self.schema).populate(&node.property)?;
        self.node_mut(path)?.set_materialized(children);
        debug!(path = %self.display_path(path), "object materialized");
        self.refresh(path);
        Ok(())
    }

    /// Change the length of one dimension of an Array and regrid it
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEdit`] when the node is not an Array, the
    /// dimension does not exist, or its length is fixed by the schema.
    pub fn set_dim_length(&mut self, path: &[usize], dimension: usize, length: usize) -> Result<()> {
        match self.array_ref(path)?.extents().get(dimension) {
            Some(extent) if extent.is_fixed() => {
                return Err(self.edit_error(path, format!("dimension {dimension} has a fixed length")));
            }
            Some(_) => {}
            None => {
                return Err(self.edit_error(path, format!("dimension {dimension} does not exist")));
            }
        }

        if let Some(extent) = self.array_mut(path)?.extents_mut().get_mut(dimension) {
            extent.length = length;
        }
        self.resize_grid(path)
    }

    /// Lay an Array out as a full grid: declared dimensions take their
    /// `DimLength`, the others keep their current length.
    ///
    /// Existing elements are flattened in row-major order and kept in their
    /// linear positions; extra elements are dropped from the end and missing
    /// ones created fresh. Every element is relabeled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEdit`] when the node is not an Array.
    pub fn resize_grid(&mut self, path: &[usize]) -> Result<()> {
        let array = self.array_mut(path)?;
        for extent in array.extents_mut().iter_mut() {
            extent.length = extent.grid_length();
        }
        let lengths = grid::lengths(array.extents());
        let total = grid::total(&lengths);

        let mut elements = flatten(std::mem::take(array.children_mut()));
        elements.truncate(total);
        array.set_layout(Layout::Grid);

        let array = self.array_ref(path)?;
        let builder = TreeBuilder::new(&self.schema);
        for linear in elements.len()..total {
            let mut index = array.index.clone();
            index.extend(grid::index_of(linear, &lengths));
            elements.push(builder.new_element(array, index)?);
        }

        let array = self.array_mut(path)?;
        *array.children_mut() = elements;
        array.relabel();
        debug!(path = %self.display_path(path), ?lengths, "array regridded");
        self.refresh(path);
        Ok(())
    }

    /// Refresh the node at `path`, then each ancestor up to the root
    fn refresh(&mut self, path: &[usize]) {
        for depth in (0..=path.len()).rev() {
            if let Some(node) = node_at_mut(&mut self.root, &path[..depth]) {
                node.refresh();
            }
        }
    }

    fn node_ref(&self, path: &[usize]) -> Result<&EditableNode> {
        node_at(&self.root, path).ok_or_else(|| Error::invalid_path(format!("{path:?}"), "no such node"))
    }

    fn node_mut(&mut self, path: &[usize]) -> Result<&mut EditableNode> {
        node_at_mut(&mut self.root, path)
            .ok_or_else(|| Error::invalid_path(format!("{path:?}"), "no such node"))
    }

    fn array_ref(&self, path: &[usize]) -> Result<&EditableNode> {
        let node = self.node_ref(path)?;
        if node.kind() == Kind::Array {
            Ok(node)
        } else {
            Err(self.edit_error(path, "not an array"))
        }
    }

    fn array_mut(&mut self, path: &[usize]) -> Result<&mut EditableNode> {
        self.array_ref(path)?;
        self.node_mut(path)
    }

    fn edit_error(&self, path: &[usize], reason: impl Into<String>) -> Error {
        Error::invalid_edit(self.display_path(path), reason)
    }
}

/// Leaf elements of nested array levels, in row-major order
fn flatten(children: Vec<EditableNode>) -> Vec<EditableNode> {
    let mut out = Vec::with_capacity(children.len());
    for mut child in children {
        if child.is_array_level() {
            out.extend(flatten(std::mem::take(child.children_mut())));
        } else {
            out.push(child);
        }
    }
    out
}
