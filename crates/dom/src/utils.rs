//! Utility functions for DOM processing

use crate::arena::Document;
use crate::error::Result;
use crate::types::{NodeData, NodeId};

/// Concatenated character data of a node and all its descendants, in
/// document order. Comments are skipped; whitespace is kept verbatim.
pub fn text_content(doc: &Document, node_id: NodeId) -> Result<String> {
    let mut text = String::new();

    doc.traverse_df(node_id, |node| {
        if let NodeData::Text(data) = &node.data {
            text.push_str(data);
        }
        Ok(())
    })?;

    Ok(text)
}

/// Depth of the deepest node below `node_id` (a leaf has depth 0).
pub fn max_depth(doc: &Document, node_id: NodeId) -> Result<usize> {
    let mut deepest = 0;
    let mut stack = vec![(node_id, 0usize)];

    while let Some((id, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        for &child_id in doc.children(id)? {
            stack.push((child_id, depth + 1));
        }
    }

    Ok(deepest)
}
