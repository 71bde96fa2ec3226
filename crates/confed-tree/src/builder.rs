//! Tree builder: schema document + JSON document → editable tree
//!
//! Existing data drives the shape wherever it is present: an array gets one
//! child per stored element whatever its declared `DimLength`. Declared
//! lengths only size arrays that are created from nothing.

use crate::grid;
use crate::node::{EditableNode, Layout, default_text, element_property, value_text};
use crate::Result;
use confed_schema::{Kind, PropertyNode, SchemaDocument, SchemaNode};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

/// Builds editable nodes from a schema document
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder<'a> {
    schema: &'a SchemaDocument,
}

impl<'a> TreeBuilder<'a> {
    #[must_use]
    pub fn new(schema: &'a SchemaDocument) -> Self {
        Self { schema }
    }

    /// Build the whole tree. The root is an Object named after the main type
    /// and is always materialized; an absent or null document yields the
    /// root with every property built from no data.
    ///
    /// # Errors
    ///
    /// Fails when the schema has no main type or a pattern does not compile.
    pub fn build(&self, document: Option<&Value>) -> Result<EditableNode> {
        let main = self
            .schema
            .main()
            .ok_or_else(|| confed_schema::Error::invalid_schema("schema has no main type"))?;

        let fields = match document {
            Some(Value::Object(map)) => Some(map),
            None | Some(Value::Null) => None,
            Some(other) => {
                warn!(
                    type_name = %main.type_name,
                    found = json_type(other),
                    "document is not an object, treating as empty"
                );
                None
            }
        };

        let children = self.properties(main, fields)?;
        let property = PropertyNode::new(&main.type_name, Kind::Object).with_sub_type(&main.type_name);
        let root = EditableNode::object(property, main.type_name.clone(), Vec::new(), Some(children))?;
        debug!(
            type_name = %main.type_name,
            valid = root.is_valid(),
            "built editable tree"
        );
        Ok(root)
    }

    /// Build the node for `property` bound to `data`
    ///
    /// # Errors
    ///
    /// Fails when a pattern does not compile.
    pub fn build_property(&self, property: &PropertyNode, data: Option<&Value>) -> Result<EditableNode> {
        let label = property.label().to_string();
        match property.kind {
            Kind::Object => self.object(property.clone(), label, Vec::new(), data),
            Kind::Array => self.array(property.clone(), label, Vec::new(), data),
            _ => EditableNode::scalar(
                property.clone(),
                label,
                Vec::new(),
                data.and_then(value_text),
            ),
        }
    }

    /// Children of a freshly materialized Object: one level built from no data
    ///
    /// # Errors
    ///
    /// Fails when a pattern does not compile.
    pub fn populate(&self, property: &PropertyNode) -> Result<Vec<EditableNode>> {
        match self.sub_type(property) {
            Some(node) => self.properties(node, None),
            None => Ok(Vec::new()),
        }
    }

    /// A new element of `array` at `index`. Objects come materialized and
    /// scalars carry their kind's default text.
    ///
    /// # Errors
    ///
    /// Fails when a pattern does not compile.
    pub fn new_element(&self, array: &EditableNode, index: Vec<usize>) -> Result<EditableNode> {
        let element = array.element_property();
        let label = grid::label(&array.property.name, &index);
        match element.kind {
            Kind::Array => self.array(element, label, index, None),
            Kind::Object => {
                let children = self.populate(&element)?;
                EditableNode::object(element, label, index, Some(children))
            }
            kind => EditableNode::scalar(element, label, index, default_text(kind)),
        }
    }

    fn properties(
        &self,
        node: &SchemaNode,
        fields: Option<&Map<String, Value>>,
    ) -> Result<Vec<EditableNode>> {
        node.properties
            .iter()
            .map(|property| self.build_property(property, fields.and_then(|f| f.get(&property.name))))
            .collect()
    }

    fn sub_type(&self, property: &PropertyNode) -> Option<&'a SchemaNode> {
        let name = property.sub_type_name.as_deref()?;
        let node = self.schema.find_sub_type(name);
        if node.is_none() {
            warn!(property = %property.name, sub_type = name, "sub type not found");
        }
        node
    }

    fn object(
        &self,
        property: PropertyNode,
        label: String,
        index: Vec<usize>,
        data: Option<&Value>,
    ) -> Result<EditableNode> {
        let mut retained = None;
        let children = match data {
            Some(Value::Object(map)) => match self.sub_type(&property) {
                Some(node) => Some(self.properties(node, Some(map))?),
                None => {
                    debug!(property = %property.name, "keeping unexpanded object data as is");
                    retained = Some(Value::Object(map.clone()));
                    Some(Vec::new())
                }
            },
            None | Some(Value::Null) => None,
            Some(other) => {
                warn!(
                    property = %property.name,
                    found = json_type(other),
                    "expected an object, leaving placeholder"
                );
                None
            }
        };
        let mut node = EditableNode::object(property, label, index, children)?;
        if let Some(fragment) = retained {
            node.retain(fragment);
        }
        Ok(node)
    }

    fn array(
        &self,
        property: PropertyNode,
        label: String,
        index: Vec<usize>,
        data: Option<&Value>,
    ) -> Result<EditableNode> {
        let depth = property.depth();
        let mut extents = grid::extents(depth, property.dim_length.as_deref());

        match data {
            Some(Value::Array(items)) => {
                trace!(property = %property.name, len = items.len(), "loading array data");
                extents[0].length = items.len();
                let element = element_property(&property, Layout::Nested);
                let children = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let mut element_index = index.clone();
                        element_index.push(i);
                        self.element(element.clone(), &property.name, element_index, item)
                    })
                    .collect::<Result<Vec<_>>>()?;
                EditableNode::array(property, label, index, Layout::Nested, extents, children)
            }
            other => {
                if let Some(other) = other.filter(|v| !v.is_null()) {
                    warn!(
                        property = %property.name,
                        found = json_type(other),
                        "expected an array, creating a new one"
                    );
                }
                let shell = EditableNode::array(
                    property,
                    label,
                    index,
                    Layout::Grid,
                    extents,
                    Vec::new(),
                )?;
                self.fill_grid(shell)
            }
        }
    }

    /// Pre-size a Grid array: one element per cell of its extents
    fn fill_grid(&self, mut array: EditableNode) -> Result<EditableNode> {
        let lengths = grid::lengths(array.extents());
        let mut children = Vec::with_capacity(grid::total(&lengths));
        for linear in 0..grid::total(&lengths) {
            let mut index = array.index.clone();
            index.extend(grid::index_of(linear, &lengths));
            children.push(self.new_element(&array, index)?);
        }
        debug!(
            property = %array.name,
            elements = children.len(),
            ?lengths,
            "created array grid"
        );
        *array.children_mut() = children;
        array.refresh();
        Ok(array)
    }

    fn element(
        &self,
        element: PropertyNode,
        base: &str,
        index: Vec<usize>,
        data: &Value,
    ) -> Result<EditableNode> {
        let label = grid::label(base, &index);
        match element.kind {
            Kind::Array => self.array(element, label, index, Some(data)),
            Kind::Object => self.object(element, label, index, Some(data)),
            _ => EditableNode::scalar(element, label, index, value_text(data)),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confed_schema::Constraints;
    use serde_json::json;

    fn schema() -> SchemaDocument {
        SchemaDocument::new(vec![
            SchemaNode::new("Demo", true)
                .property(PropertyNode::new("Name", Kind::String))
                .property(PropertyNode::new("Count", Kind::Number))
                .property(PropertyNode::new("Child", Kind::Object).with_sub_type("Item"))
                .property(PropertyNode::array("Items", Kind::Object, 1).with_sub_type("Item"))
                .property(
                    PropertyNode::array("Matrix", Kind::Number, 2).with_dim_length(vec![2, 3]),
                ),
            SchemaNode::new("Item", false).property(
                PropertyNode::new("Flag", Kind::Boolean)
                    .with_constraints(Constraints::new().required()),
            ),
        ])
    }

    #[test]
    fn test_root_named_after_main_type() {
        let schema = schema();
        let root = TreeBuilder::new(&schema).build(None).unwrap();
        assert_eq!(root.name, "Demo");
        assert!(root.is_materialized());
        assert_eq!(root.children().len(), 5);
    }

    #[test]
    fn test_scalars_bind_to_fields() {
        let schema = schema();
        let root = TreeBuilder::new(&schema)
            .build(Some(&json!({"Name": "abc", "Count": 4})))
            .unwrap();
        assert_eq!(root.find_child("Name").unwrap().value(), Some("abc"));
        assert_eq!(root.find_child("Count").unwrap().value(), Some("4"));
    }

    #[test]
    fn test_absent_object_is_placeholder() {
        let schema = schema();
        let root = TreeBuilder::new(&schema).build(Some(&json!({}))).unwrap();
        let child = root.find_child("Child").unwrap();
        assert!(!child.is_materialized());
        assert!(child.children().is_empty());
    }

    #[test]
    fn test_present_object_is_expanded() {
        let schema = schema();
        let root = TreeBuilder::new(&schema)
            .build(Some(&json!({"Child": {"Flag": true}})))
            .unwrap();
        let child = root.find_child("Child").unwrap();
        assert!(child.is_materialized());
        assert_eq!(child.find_child("Flag").unwrap().value(), Some("true"));
    }

    #[test]
    fn test_new_grid_is_pre_sized() {
        let schema = schema();
        let root = TreeBuilder::new(&schema).build(None).unwrap();
        let matrix = root.find_child("Matrix").unwrap();
        assert_eq!(matrix.layout(), Layout::Grid);
        let labels: Vec<&str> = matrix.children().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Matrix(1,1)",
                "Matrix(1,2)",
                "Matrix(1,3)",
                "Matrix(2,1)",
                "Matrix(2,2)",
                "Matrix(2,3)"
            ]
        );
        assert_eq!(matrix.children()[0].value(), Some("0"));
    }

    #[test]
    fn test_existing_array_is_data_driven() {
        let schema = schema();
        let root = TreeBuilder::new(&schema)
            .build(Some(&json!({"Matrix": [[1], [2, 3], [4, 5, 6]]})))
            .unwrap();
        let matrix = root.find_child("Matrix").unwrap();
        assert_eq!(matrix.layout(), Layout::Nested);
        assert_eq!(matrix.children().len(), 3);
        assert_eq!(matrix.children()[1].label, "Matrix(2)");
        assert_eq!(matrix.children()[1].children()[1].label, "Matrix(2,2)");
        assert_eq!(matrix.children()[2].children()[2].value(), Some("6"));
    }

    #[test]
    fn test_object_elements() {
        let schema = schema();
        let root = TreeBuilder::new(&schema)
            .build(Some(&json!({"Items": [{"Flag": false}, null]})))
            .unwrap();
        let items = root.find_child("Items").unwrap();
        assert!(items.children()[0].is_materialized());
        assert!(!items.children()[1].is_materialized());
        assert_eq!(items.children()[0].label, "Items(1)");
    }

    #[test]
    fn test_validity_bubbles_up() {
        let schema = schema();
        let root = TreeBuilder::new(&schema)
            .build(Some(&json!({"Child": {}})))
            .unwrap();
        assert!(!root.find_child("Child").unwrap().is_valid());
        assert!(!root.is_valid());
    }

    #[test]
    fn test_mismatched_data_is_treated_as_absent() {
        let schema = schema();
        let root = TreeBuilder::new(&schema)
            .build(Some(&json!({"Child": 5, "Matrix": "oops"})))
            .unwrap();
        assert!(!root.find_child("Child").unwrap().is_materialized());
        assert_eq!(root.find_child("Matrix").unwrap().children().len(), 6);
    }

    #[test]
    fn test_unexpanded_object_keeps_its_data() {
        let schema = SchemaDocument::new(vec![
            SchemaNode::new("Station", true)
                .property(PropertyNode::new("Name", Kind::String))
                .property(PropertyNode::new("Peer", Kind::Object).with_sub_type("Station")),
        ]);
        let root = TreeBuilder::new(&schema)
            .build(Some(&json!({"Name": "root", "Peer": {"Name": "peer"}})))
            .unwrap();
        let peer = root.find_child("Peer").unwrap();
        assert!(peer.is_materialized());
        assert!(peer.children().is_empty());
        assert_eq!(peer.retained(), Some(&json!({"Name": "peer"})));
    }

    #[test]
    fn test_missing_main_type() {
        let schema = SchemaDocument::new(vec![SchemaNode::new("Orphan", false)]);
        assert!(TreeBuilder::new(&schema).build(None).is_err());
    }
}
