//! Arena-based document storage
//!
//! "Bad programmers worry about the code. Good programmers worry about
//! data structures and their relationships."
//!
//! The document owns every node in one `Vec`. Parent/child links are plain
//! indices, so the tree cannot alias, cannot form cycles through shared
//! ownership, and lives exactly as long as its `Document`.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Root][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, ElementData, NodeData, NodeId, NodeType, ROOT_NODE_ID};

/// Parsed HTML document: an arena of nodes rooted at [`ROOT_NODE_ID`].
#[derive(Debug, Clone)]
pub struct Document {
    /// All nodes stored sequentially; index == NodeId
    nodes: Vec<DomNode>,
}

impl Document {
    /// Create a document holding only the implicit root
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create document with specific node capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(DomNode::new(ROOT_NODE_ID, NodeData::Document));
        Self { nodes }
    }

    pub fn root_id(&self) -> NodeId {
        ROOT_NODE_ID
    }

    pub fn root(&self) -> &DomNode {
        &self.nodes[ROOT_NODE_ID as usize]
    }

    /// Allocate a detached node, returns its ID
    ///
    /// Fails with `ResourceExhausted` if the arena cannot grow.
    pub fn create_node(&mut self, data: NodeData) -> Result<NodeId> {
        let node_id = NodeId::try_from(self.nodes.len()).map_err(|_| {
            DomError::ResourceExhausted(format!("more than {} nodes", NodeId::MAX))
        })?;
        self.nodes.try_reserve(1)?;
        self.nodes.push(DomNode::new(node_id, data));
        Ok(node_id)
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Append a detached node as the last child of `parent_id`.
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        if child_id == ROOT_NODE_ID {
            return Err(DomError::HierarchyRequest(
                "the document root cannot be a child".to_string(),
            ));
        }
        if child_id == parent_id {
            return Err(DomError::HierarchyRequest(format!(
                "node {} cannot be its own child",
                child_id
            )));
        }
        self.get(parent_id)?;

        let child = self.get_mut(child_id)?;
        if let Some(existing) = child.parent_id {
            return Err(DomError::HierarchyRequest(format!(
                "node {} already has parent {}",
                child_id, existing
            )));
        }
        child.parent_id = Some(parent_id);

        let parent = self.get_mut(parent_id)?;
        parent.children_ids.try_reserve(1).map_err(|_| {
            DomError::ResourceExhausted(format!("children of node {}", parent_id))
        })?;
        parent.children_ids.push(child_id);
        Ok(())
    }

    /// Append character data to `parent_id`.
    ///
    /// Merges into the last child when that child is already a text node,
    /// otherwise creates a new text node. Returns the text node's ID.
    pub fn append_text(&mut self, parent_id: NodeId, data: &str) -> Result<NodeId> {
        let last_child = self.get(parent_id)?.children_ids.last().copied();

        if let Some(last_id) = last_child {
            if let NodeData::Text(existing) = &mut self.get_mut(last_id)?.data {
                existing.try_reserve(data.len())?;
                existing.push_str(data);
                return Ok(last_id);
            }
        }

        let text_id = self.create_node(NodeData::Text(data.to_string()))?;
        self.append_child(parent_id, text_id)?;
        Ok(text_id)
    }

    /// Add an attribute to an element unless it already carries one with that name.
    ///
    /// Returns `Ok(false)` when the name was already present or the node is
    /// not an element.
    pub fn set_attribute_if_absent(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<bool> {
        match &mut self.get_mut(node_id)?.data {
            NodeData::Element(el) => Ok(el.attributes.insert_if_absent(name, value)),
            _ => Ok(false),
        }
    }

    /// Element payload of a node, if it is an element
    pub fn element(&self, node_id: NodeId) -> Option<&ElementData> {
        self.nodes.get(node_id as usize).and_then(DomNode::as_element)
    }

    /// Tag name of a node, if it is an element
    pub fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|el| el.tag_name.as_str())
    }

    /// Get attribute value of an element
    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.element(node_id).and_then(|el| el.attributes.get(name))
    }

    /// Direct children of a node
    pub fn children(&self, node_id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.get(node_id)?.children_ids)
    }

    /// Get parent of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// Number of direct children of the document root (not recursive)
    pub fn child_count(&self) -> usize {
        self.root().children_ids.len()
    }

    /// Total number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterator over all nodes in creation order
    pub fn iter(&self) -> impl Iterator<Item = &DomNode> {
        self.nodes.iter()
    }

    /// Traverse tree depth-first in document order (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            stack.extend(node.children_ids.iter().rev().copied());
        }

        Ok(())
    }

    /// Find nodes matching predicate, in document order
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut found = Vec::new();
        // The walk only fails on dangling ids, which the arena never hands out.
        let _ = self.traverse_df(ROOT_NODE_ID, |node| {
            if predicate(node) {
                found.push(node.node_id);
            }
            Ok(())
        });
        found
    }

    /// Find first node matching predicate, in document order
    pub fn find_one<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut stack = vec![ROOT_NODE_ID];
        while let Some(node_id) = stack.pop() {
            let node = self.nodes.get(node_id as usize)?;
            if predicate(node) {
                return Some(node_id);
            }
            stack.extend(node.children_ids.iter().rev().copied());
        }
        None
    }

    /// Find all elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| {
            node.tag_name()
                .is_some_and(|name| name.eq_ignore_ascii_case(tag))
        })
    }

    /// Find element by ID attribute
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_one(|node| node.attr("id") == Some(id))
    }

    /// The root `html` element
    pub fn document_element(&self) -> Option<NodeId> {
        self.root()
            .children_ids
            .iter()
            .copied()
            .find(|&id| self.tag_name(id) == Some("html"))
    }

    /// The `head` child of the root element
    pub fn head(&self) -> Option<NodeId> {
        self.child_of_document_element("head")
    }

    /// The `body` child of the root element
    pub fn body(&self) -> Option<NodeId> {
        self.child_of_document_element("body")
    }

    /// The doctype node, if the input declared one
    pub fn doctype(&self) -> Option<NodeId> {
        self.root()
            .children_ids
            .iter()
            .copied()
            .find(|&id| self.nodes[id as usize].node_type() == NodeType::Doctype)
    }

    fn child_of_document_element(&self, tag: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.nodes[html as usize]
            .children_ids
            .iter()
            .copied()
            .find(|&id| self.tag_name(id) == Some(tag))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
