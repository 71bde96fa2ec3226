//! Runtime tree node

use crate::grid::{self, DimExtent};
use crate::Result;
use confed_schema::{Constraints, Kind, PropertyNode};
use confed_validation::{RuleSet, RuleViolation, Subject, ValidationTarget};
use serde_json::Value;

/// How an Array node's children map onto its dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One child per entry of the first dimension; deeper dimensions are
    /// nested Array children. Used for arrays loaded from data.
    Nested,
    /// A flat row-major list over every dimension. Used for new arrays.
    Grid,
}

/// A node of the editable tree, mirroring the property it was built from.
///
/// Object and Array nodes hold children, every other kind holds a textual
/// value. Each node caches its own rule violations and the aggregate
/// validity of its subtree.
#[derive(Debug, Clone)]
pub struct EditableNode {
    /// Property name, used as the key in the parent object
    pub name: String,
    /// Display label; array elements carry their one-based index
    pub label: String,
    /// The originating property; for array elements, the element's shape
    pub property: PropertyNode,
    /// Zero-based position within the enclosing array dimensions
    pub index: Vec<usize>,

    value: Option<String>,
    /// Stored data of an object whose type the schema cannot expand
    retained: Option<Value>,
    materialized: bool,
    children: Vec<EditableNode>,
    layout: Layout,
    extents: Vec<DimExtent>,
    rules: RuleSet,
    violations: Vec<RuleViolation>,
    valid: bool,
}

impl EditableNode {
    fn new(property: PropertyNode, label: String, index: Vec<usize>) -> Result<Self> {
        let rules = RuleSet::from_constraints(property.kind, &property.constraints)?;
        Ok(Self {
            name: property.name.clone(),
            label,
            property,
            index,
            value: None,
            retained: None,
            materialized: false,
            children: Vec::new(),
            layout: Layout::Nested,
            extents: Vec::new(),
            rules,
            violations: Vec::new(),
            valid: true,
        })
    }

    /// A scalar node holding `value`
    ///
    /// # Errors
    ///
    /// Fails when the property's regular expression does not compile.
    pub fn scalar(
        property: PropertyNode,
        label: String,
        index: Vec<usize>,
        value: Option<String>,
    ) -> Result<Self> {
        let mut node = Self::new(property, label, index)?;
        node.value = value;
        node.refresh();
        Ok(node)
    }

    /// An Object node; `children` of `None` leaves it an unmaterialized placeholder
    ///
    /// # Errors
    ///
    /// Fails when the property's constraints cannot be compiled into rules.
    pub fn object(
        property: PropertyNode,
        label: String,
        index: Vec<usize>,
        children: Option<Vec<EditableNode>>,
    ) -> Result<Self> {
        let mut node = Self::new(property, label, index)?;
        if let Some(children) = children {
            node.materialized = true;
            node.children = children;
        }
        node.refresh();
        Ok(node)
    }

    /// An Array node over `children` laid out according to `layout`
    ///
    /// # Errors
    ///
    /// Fails when the property's constraints cannot be compiled into rules.
    pub fn array(
        property: PropertyNode,
        label: String,
        index: Vec<usize>,
        layout: Layout,
        extents: Vec<DimExtent>,
        children: Vec<EditableNode>,
    ) -> Result<Self> {
        let mut node = Self::new(property, label, index)?;
        node.layout = layout;
        node.extents = extents;
        node.children = children;
        node.refresh();
        Ok(node)
    }

    pub fn kind(&self) -> Kind {
        self.property.kind
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Stored fragment kept verbatim because the object's type has no schema node
    pub fn retained(&self) -> Option<&Value> {
        self.retained.as_ref()
    }

    /// Whether an Object node has been populated. Always false for other kinds.
    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub fn children(&self) -> &[EditableNode] {
        &self.children
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Per-dimension sizes of an Array node
    pub fn extents(&self) -> &[DimExtent] {
        &self.extents
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// This node's own violations, without its children's
    pub fn violations(&self) -> &[RuleViolation] {
        &self.violations
    }

    /// Whether this node and its whole subtree satisfy every rule
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Find a direct child by property name
    pub fn find_child(&self, name: &str) -> Option<&EditableNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Whether this is an intermediate level of a multi-dimensional array
    pub(crate) fn is_array_level(&self) -> bool {
        self.kind() == Kind::Array && !self.index.is_empty()
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<EditableNode> {
        &mut self.children
    }

    pub(crate) fn child_mut(&mut self, idx: usize) -> Option<&mut EditableNode> {
        self.children.get_mut(idx)
    }

    pub(crate) fn extents_mut(&mut self) -> &mut Vec<DimExtent> {
        &mut self.extents
    }

    pub(crate) fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub(crate) fn retain(&mut self, fragment: Value) {
        self.retained = Some(fragment);
    }

    pub(crate) fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub(crate) fn set_materialized(&mut self, children: Vec<EditableNode>) {
        self.materialized = true;
        self.children = children;
    }

    /// Recompute this node's violations and aggregate validity from its
    /// current value and its children's cached validity
    pub fn refresh(&mut self) {
        self.violations = self.rules.evaluate(self.subject());
        self.valid = self.violations.is_empty() && self.children.iter().all(|c| c.valid);
    }

    /// Recompute validity for the whole subtree, children first
    pub fn refresh_all(&mut self) {
        for child in &mut self.children {
            child.refresh_all();
        }
        self.refresh();
    }

    /// Shape of this Array node's direct children
    pub fn element_property(&self) -> PropertyNode {
        element_property(&self.property, self.layout)
    }

    /// Renumber this Array node's children after a change to their count or layout
    pub(crate) fn relabel(&mut self) {
        let lengths = grid::lengths(&self.extents);
        let base = self.property.name.clone();
        for (i, child) in self.children.iter_mut().enumerate() {
            let mut index = self.index.clone();
            match self.layout {
                Layout::Nested => index.push(i),
                Layout::Grid => index.extend(grid::index_of(i, &lengths)),
            }
            child.label = grid::label(&base, &index);
            child.index = index;
            if child.is_array_level() {
                child.relabel();
            }
        }
    }
}

impl ValidationTarget for EditableNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> Kind {
        self.property.kind
    }

    fn rules(&self) -> &RuleSet {
        &self.rules
    }

    fn subject(&self) -> Subject<'_> {
        match self.property.kind {
            Kind::Object => Subject::Object {
                materialized: self.materialized,
            },
            Kind::Array => Subject::Array {
                len: self.children.len(),
            },
            _ => Subject::Scalar(self.value.as_deref()),
        }
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Shape of the direct children of an Array built from `array`.
///
/// A nested layout with more than one dimension left yields another Array
/// level; otherwise the element kind with the per-element constraints.
pub fn element_property(array: &PropertyNode, layout: Layout) -> PropertyNode {
    let depth = array.depth();
    if layout == Layout::Nested && depth > 1 {
        let mut level = array.clone();
        level.dim = Some(depth - 1);
        level.dim_length = array
            .dim_length
            .as_ref()
            .map(|lengths| lengths.iter().skip(1).copied().collect());
        level.constraints = Constraints::default();
        return level;
    }

    let mut element = PropertyNode::new(&array.name, array.element_kind.unwrap_or(Kind::String));
    element.sub_type_name.clone_from(&array.sub_type_name);
    element.constraints = array.element_constraints.clone().unwrap_or_default();
    element.options.clone_from(&array.options);
    element.presentation = array.presentation.clone();
    element
}

/// Editor text for a JSON value: strings verbatim, numbers and booleans as
/// their JSON text, anything else as compact JSON. Null is unset.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Initial text of a freshly created scalar element
pub fn default_text(kind: Kind) -> Option<String> {
    let text = match kind {
        Kind::Number => "0",
        Kind::Boolean => "false",
        Kind::DateTime => "0001-01-01T00:00:00",
        Kind::DateOnly => "0001-01-01",
        Kind::TimeOnly => "00:00:00",
        Kind::String | Kind::Object | Kind::Array => return None,
    };
    Some(text.to_string())
}
