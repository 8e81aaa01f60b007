//! Core type definitions for the HTML document tree
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for small arrays (most elements have few children and
//!    fewer attributes)
//! 3. One tagged enum for node payloads, so every match is exhaustive

use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any webpage
pub type NodeId = u32;

/// The implicit document root always lives at index 0.
pub const ROOT_NODE_ID: NodeId = 0;

/// Node kind, used as the `"type"` tag in serialized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
    Doctype,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Document => "document",
            NodeType::Element => "element",
            NodeType::Text => "text",
            NodeType::Comment => "comment",
            NodeType::Doctype => "doctype",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered attribute list with unique names.
///
/// Insertion order is preserved. Inserting a name that is already present
/// is a no-op: the first occurrence wins, which is what HTML requires for
/// duplicate attributes inside one start tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: SmallVec<[Attribute; 4]>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get attribute value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|attr| attr.name == name)
    }

    /// Append `name=value` unless `name` is already present.
    ///
    /// Returns `false` when the attribute was a duplicate and got dropped.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.items.push(Attribute {
            name,
            value: value.into(),
        });
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.insert_if_absent(name, value);
        }
        attrs
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Serializes as a JSON object in insertion order.
impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.items.len()))?;
        for attr in &self.items {
            map.serialize_entry(&attr.name, &attr.value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// ASCII-lowercased tag name
    pub tag_name: String,
    pub attributes: Attributes,
}

impl ElementData {
    pub fn new(tag_name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctypeData {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The implicit root. Only ever present at [`ROOT_NODE_ID`].
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    Doctype(DoctypeData),
}

/// The main DOM tree node structure
///
/// Navigation is index based: `parent_id` and `children_ids` point into the
/// owning [`Document`](crate::Document) arena.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>,
    pub data: NodeData,
}

impl DomNode {
    pub fn new(node_id: NodeId, data: NodeData) -> Self {
        Self {
            node_id,
            parent_id: None,
            children_ids: SmallVec::new(),
            data,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document => NodeType::Document,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
            NodeData::Doctype(_) => NodeType::Doctype,
        }
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag_name.as_str())
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Character data of a text node
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_element_named(&self, name: &str) -> bool {
        self.tag_name() == Some(name)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.as_element().and_then(|el| el.attributes.get(name))
    }
}
