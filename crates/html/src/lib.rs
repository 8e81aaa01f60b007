//! HTML parsing
//!
//! Tokenizer and tree builder that turn HTML text into a [`dom::Document`].
//! Any input that is valid UTF-8 parses: unclosed, misnested and stray
//! markup is repaired the way browsers repair it, and the resulting tree
//! always has an `html` element with `head` and `body`.
//!
//! ```
//! let doc = html::parse("<div><p>hello").unwrap();
//! assert_eq!(html::child_count(&doc), 1);
//!
//! let json = html::serialize_to_json(&doc).unwrap();
//! assert!(json.starts_with(r#"{"type":"document","children":[{"type":"element","tagName":"html""#));
//! ```

pub mod issues;
pub mod parser;
pub mod token;
pub mod tokenizer;
pub mod tree_builder;

pub use dom::{Document, DomError, DomNode, DomSerializer, NodeData, NodeId, NodeType, Result, SerializerConfig};
pub use issues::{ParseIssue, ParseStage};
pub use parser::{HtmlParser, ParserConfig};
pub use token::Token;
pub use tokenizer::{tokenize, RawKind, Tokenizer};
pub use tree_builder::{InsertionMode, TreeBuilder};

/// Parse `input` with the default configuration.
pub fn parse(input: &str) -> Result<Document> {
    HtmlParser::new().parse(input)
}

/// Parse UTF-8 bytes with the default configuration.
pub fn parse_bytes(input: &[u8]) -> Result<Document> {
    HtmlParser::new().parse_bytes(input)
}

/// Number of direct children of the document root.
pub fn child_count(doc: &Document) -> usize {
    doc.child_count()
}

/// Serialize the whole document to compact JSON.
pub fn serialize_to_json(doc: &Document) -> Result<String> {
    DomSerializer::new().serialize(doc)
}
