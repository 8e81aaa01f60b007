//! DOM Serializer - Convert a document tree to JSON
//!
//! Every node becomes one JSON object tagged with `"type"`:
//!
//! ```text
//! {"type":"document","children":[...]}
//! {"type":"element","tagName":"p","attributes":{"id":"x"},"children":[...]}
//! {"type":"text","content":"hello"}
//! {"type":"comment","content":" note "}
//! {"type":"doctype","name":"html","publicId":null,"systemId":null}
//! ```
//!
//! Attribute and child order are the arena's insertion order. The walk is
//! iterative over an explicit stack, so any depth the parser can build
//! serializes; serde_json only ever sees string and attribute-map leaves.

use crate::arena::Document;
use crate::error::{DomError, Result};
use crate::types::*;
use crate::utils;

/// Serializer configuration
#[derive(Debug, Clone, Default)]
pub struct SerializerConfig {
    /// Indent the JSON output (two spaces, serde_json's pretty layout)
    pub pretty: bool,
    /// Refuse trees nested deeper than this with `ResourceExhausted`.
    /// `None` serializes any depth.
    pub max_depth: Option<usize>,
}

/// DOM Tree Serializer
pub struct DomSerializer {
    config: SerializerConfig,
}

/// Pending work for the JSON walk
enum Frame {
    /// Write a node; `first` is false when a sibling precedes it
    Open { node_id: NodeId, level: usize, first: bool },
    /// Close the children array and object of a node at `level`
    Close { level: usize },
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Serialize the whole document, root included, to JSON
    pub fn serialize(&self, doc: &Document) -> Result<String> {
        if let Some(limit) = self.config.max_depth {
            let depth = utils::max_depth(doc, doc.root_id())?;
            if depth > limit {
                return Err(DomError::ResourceExhausted(format!(
                    "tree depth {} exceeds serializer limit {}",
                    depth, limit
                )));
            }
        }

        let mut out = JsonWriter::new(self.config.pretty, doc.node_count() * 48);
        let mut stack = vec![Frame::Open {
            node_id: doc.root_id(),
            level: 0,
            first: true,
        }];

        while let Some(frame) = stack.pop() {
            let (node_id, level) = match frame {
                Frame::Open {
                    node_id,
                    level,
                    first,
                } => {
                    out.begin_item(level, first);
                    (node_id, level)
                }
                Frame::Close { level } => {
                    out.close(']', level + 1);
                    out.close('}', level);
                    continue;
                }
            };

            let node = doc.get(node_id)?;
            out.push("{");
            out.key(level, "type", true);
            out.string(node.node_type().as_str())?;

            match &node.data {
                NodeData::Document => {}
                NodeData::Element(el) => {
                    out.key(level, "tagName", false);
                    out.string(&el.tag_name)?;
                    out.key(level, "attributes", false);
                    out.attributes(level, &el.attributes)?;
                }
                NodeData::Text(text) | NodeData::Comment(text) => {
                    out.key(level, "content", false);
                    out.string(text)?;
                    out.close('}', level);
                    continue;
                }
                NodeData::Doctype(dt) => {
                    out.key(level, "name", false);
                    out.string(&dt.name)?;
                    out.key(level, "publicId", false);
                    out.optional_string(dt.public_id.as_deref())?;
                    out.key(level, "systemId", false);
                    out.optional_string(dt.system_id.as_deref())?;
                    out.close('}', level);
                    continue;
                }
            }

            out.key(level, "children", false);
            if node.children_ids.is_empty() {
                out.push("[]");
                out.close('}', level);
                continue;
            }
            out.push("[");
            stack.push(Frame::Close { level });
            for (index, &child_id) in node.children_ids.iter().enumerate().rev() {
                stack.push(Frame::Open {
                    node_id: child_id,
                    level: level + 2,
                    first: index == 0,
                });
            }
        }

        let json = out.finish();
        tracing::debug!(
            "[DomSerializer] Serialized {} nodes into {} bytes",
            doc.node_count(),
            json.len()
        );
        Ok(json)
    }

    /// Indented text dump of the tree, one node per line
    ///
    /// Same layout as the html5lib tree-construction fixtures:
    ///
    /// ```text
    /// | <html>
    /// |   <head>
    /// |   <body>
    /// |     <a>
    /// |       href="x"
    /// |       "link"
    /// ```
    pub fn outline(&self, doc: &Document) -> Result<String> {
        let mut output = String::with_capacity(doc.node_count() * 16);
        let mut stack: Vec<(NodeId, usize)> = doc
            .root()
            .children_ids
            .iter()
            .rev()
            .map(|&id| (id, 0))
            .collect();

        while let Some((node_id, depth)) = stack.pop() {
            let node = doc.get(node_id)?;
            let indent = "  ".repeat(depth);

            match &node.data {
                NodeData::Element(el) => {
                    output.push_str(&format!("| {}<{}>\n", indent, el.tag_name));
                    for attr in &el.attributes {
                        output.push_str(&format!(
                            "| {}  {}=\"{}\"\n",
                            indent, attr.name, attr.value
                        ));
                    }
                }
                NodeData::Text(text) => {
                    output.push_str(&format!("| {}\"{}\"\n", indent, text));
                }
                NodeData::Comment(text) => {
                    output.push_str(&format!("| {}<!-- {} -->\n", indent, text));
                }
                NodeData::Doctype(dt) => {
                    output.push_str(&format!("| {}<!DOCTYPE {}", indent, dt.name));
                    if dt.public_id.is_some() || dt.system_id.is_some() {
                        output.push_str(&format!(
                            " \"{}\" \"{}\"",
                            dt.public_id.as_deref().unwrap_or(""),
                            dt.system_id.as_deref().unwrap_or("")
                        ));
                    }
                    output.push_str(">\n");
                }
                NodeData::Document => {}
            }

            for &child_id in node.children_ids.iter().rev() {
                stack.push((child_id, depth + 1));
            }
        }

        Ok(output)
    }
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON text builder for [`DomSerializer::serialize`]
///
/// `level` is the indentation of the enclosing object: its keys sit one
/// level deeper and array items two levels deeper.
struct JsonWriter {
    out: String,
    pretty: bool,
}

impl JsonWriter {
    fn new(pretty: bool, capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            pretty,
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self, level: usize) {
        if self.pretty {
            self.out.push('\n');
            self.out.push_str(&"  ".repeat(level));
        }
    }

    fn begin_item(&mut self, level: usize, first: bool) {
        if !first {
            self.out.push(',');
        }
        if level > 0 {
            self.newline(level);
        }
    }

    fn key(&mut self, level: usize, name: &str, first: bool) {
        if !first {
            self.out.push(',');
        }
        self.newline(level + 1);
        self.out.push('"');
        self.out.push_str(name);
        self.out.push_str(if self.pretty { "\": " } else { "\":" });
    }

    fn string(&mut self, value: &str) -> Result<()> {
        self.out.push_str(&serde_json::to_string(value)?);
        Ok(())
    }

    fn optional_string(&mut self, value: Option<&str>) -> Result<()> {
        self.out.push_str(&serde_json::to_string(&value)?);
        Ok(())
    }

    fn attributes(&mut self, level: usize, attributes: &Attributes) -> Result<()> {
        if self.pretty {
            let map = serde_json::to_string_pretty(attributes)?;
            let indent = format!("\n{}", "  ".repeat(level + 1));
            self.out.push_str(&map.replace('\n', &indent));
        } else {
            self.out.push_str(&serde_json::to_string(attributes)?);
        }
        Ok(())
    }

    fn close(&mut self, bracket: char, level: usize) {
        self.newline(level);
        self.out.push(bracket);
    }

    fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        let doctype = doc
            .create_node(NodeData::Doctype(DoctypeData {
                name: "html".into(),
                ..Default::default()
            }))
            .unwrap();
        let html = doc
            .create_node(NodeData::Element(ElementData::new(
                "html",
                [("lang", "en"), ("dir", "ltr")].into_iter().collect(),
            )))
            .unwrap();
        let comment = doc.create_node(NodeData::Comment(" c ".into())).unwrap();
        doc.append_child(ROOT_NODE_ID, doctype).unwrap();
        doc.append_child(ROOT_NODE_ID, html).unwrap();
        doc.append_text(html, "say \"hi\"\n").unwrap();
        doc.append_child(html, comment).unwrap();
        doc
    }

    #[test]
    fn test_serialize_simple_dom() {
        let json = DomSerializer::new().serialize(&sample()).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"type":"document","children":["#,
                r#"{"type":"doctype","name":"html","publicId":null,"systemId":null},"#,
                r#"{"type":"element","tagName":"html","attributes":{"lang":"en","dir":"ltr"},"children":["#,
                r#"{"type":"text","content":"say \"hi\"\n"},"#,
                r#"{"type":"comment","content":" c "}]}]}"#
            )
        );
    }

    #[test]
    fn test_serialize_pretty_is_same_value() {
        let doc = sample();
        let compact = DomSerializer::new().serialize(&doc).unwrap();
        let pretty = DomSerializer::with_config(SerializerConfig {
            pretty: true,
            ..Default::default()
        })
        .serialize(&doc)
        .unwrap();

        assert!(pretty.contains('\n'));
        let a: serde_json::Value = serde_json::from_str(&compact).unwrap();
        let b: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(a, b);
    }

    fn nested_divs(depth: usize) -> Document {
        let mut doc = Document::new();
        let mut parent = ROOT_NODE_ID;
        for _ in 0..depth {
            let div = doc
                .create_node(NodeData::Element(ElementData::new("div", Attributes::new())))
                .unwrap();
            doc.append_child(parent, div).unwrap();
            parent = div;
        }
        doc
    }

    #[test]
    fn test_serialize_pretty_layout() {
        let mut doc = Document::new();
        let p = doc
            .create_node(NodeData::Element(ElementData::new(
                "p",
                [("a", "1")].into_iter().collect(),
            )))
            .unwrap();
        doc.append_child(ROOT_NODE_ID, p).unwrap();
        doc.append_text(p, "x").unwrap();

        let pretty = DomSerializer::with_config(SerializerConfig {
            pretty: true,
            ..Default::default()
        })
        .serialize(&doc)
        .unwrap();
        assert_eq!(
            pretty,
            r#"{
  "type": "document",
  "children": [
    {
      "type": "element",
      "tagName": "p",
      "attributes": {
        "a": "1"
      },
      "children": [
        {
          "type": "text",
          "content": "x"
        }
      ]
    }
  ]
}"#
        );
    }

    #[test]
    fn test_serialize_any_depth() {
        let doc = nested_divs(20_000);

        let json = DomSerializer::new().serialize(&doc).unwrap();
        assert_eq!(json.matches(r#""tagName":"div""#).count(), 20_000);
        assert!(json.ends_with(&"]}".repeat(20_001)));

        let pretty = DomSerializer::with_config(SerializerConfig {
            pretty: true,
            ..Default::default()
        })
        .serialize(&nested_divs(1_000))
        .unwrap();
        assert_eq!(pretty.matches(r#""tagName": "div""#).count(), 1_000);
    }

    #[test]
    fn test_serialize_opt_in_depth_limit() {
        let doc = nested_divs(10);

        let serializer = DomSerializer::with_config(SerializerConfig {
            max_depth: Some(5),
            ..Default::default()
        });
        assert!(matches!(
            serializer.serialize(&doc),
            Err(DomError::ResourceExhausted(_))
        ));

        let serializer = DomSerializer::with_config(SerializerConfig {
            max_depth: Some(10),
            ..Default::default()
        });
        assert!(serializer.serialize(&doc).is_ok());
    }

    #[test]
    fn test_outline() {
        let outline = DomSerializer::new().outline(&sample()).unwrap();
        assert_eq!(
            outline,
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   lang=\"en\"\n\
             |   dir=\"ltr\"\n\
             |   \"say \"hi\"\n\"\n\
             |   <!--  c  -->\n"
        );
    }
}
