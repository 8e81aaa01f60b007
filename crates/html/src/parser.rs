//! HTML Parser - Main entry point for parsing
//!
//! Drives the tokenizer and the tree builder over one input:
//!
//! ```text
//! &str → Tokenizer → Token → TreeBuilder → Document
//!            ↑                    │
//!            └── switch_to(kind) ─┘   (after <script>, <title>, ...)
//! ```
//!
//! Parsing is synchronous and keeps no state between calls, so one
//! `HtmlParser` can be reused, and separate parsers can run on separate
//! threads.

use crate::issues::ParseIssue;
use crate::tokenizer::Tokenizer;
use crate::tree_builder::TreeBuilder;
use dom::{Document, Result};

/// Rough bytes of markup per node, used to pre-size the arena
const BYTES_PER_NODE_ESTIMATE: usize = 32;

/// Configuration for the HTML parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Treat `<noscript>` contents as raw text, like a browser with
    /// scripting enabled does.
    pub scripting_enabled: bool,
    /// Keep the recovered parse issues for `parse_with_issues`.
    pub collect_issues: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            scripting_enabled: true,
            collect_issues: true,
        }
    }
}

/// Main HTML parser
#[derive(Debug, Clone, Default)]
pub struct HtmlParser {
    config: ParserConfig,
}

impl HtmlParser {
    /// Create new parser with default config
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Create parser with custom config
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a complete document.
    ///
    /// Never fails on malformed markup. The only error is
    /// [`DomError::ResourceExhausted`](dom::DomError::ResourceExhausted)
    /// when the tree cannot be allocated.
    pub fn parse(&self, input: &str) -> Result<Document> {
        self.parse_with_issues(input).map(|(doc, _)| doc)
    }

    /// Parse raw bytes, which must be UTF-8.
    pub fn parse_bytes(&self, input: &[u8]) -> Result<Document> {
        let text = std::str::from_utf8(input)?;
        self.parse(text)
    }

    /// Parse and also return every issue recovered from, tokenizer issues
    /// first.
    pub fn parse_with_issues(&self, input: &str) -> Result<(Document, Vec<ParseIssue>)> {
        let document = Document::with_capacity(input.len() / BYTES_PER_NODE_ESTIMATE + 4);
        let mut builder = TreeBuilder::with_document(self.config, document);
        let mut tokenizer = Tokenizer::new(input);

        while let Some(token) = tokenizer.next() {
            if let Some(kind) = builder.process(token)? {
                tokenizer.switch_to(kind);
            }
            if builder.is_finished() {
                break;
            }
        }

        let (document, builder_issues) = builder.finish()?;

        let mut issues = Vec::new();
        if self.config.collect_issues {
            issues = tokenizer.take_issues();
            issues.extend(builder_issues);
        }

        tracing::debug!(
            "[HtmlParser] Parsed {} bytes into {} nodes ({} issues)",
            input.len(),
            document.node_count(),
            issues.len()
        );

        Ok((document, issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::ParseStage;
    use dom::DomError;

    #[test]
    fn test_parse_simple_document() {
        let parser = HtmlParser::new();
        let doc = parser
            .parse("<!DOCTYPE html><html><head><title>T</title></head><body><p id=a>x</p></body></html>")
            .unwrap();

        assert!(doc.doctype().is_some());
        assert_eq!(doc.child_count(), 2);
        let p = doc.find_by_id("a").unwrap();
        assert_eq!(doc.tag_name(p), Some("p"));
        assert_eq!(doc.parent(p).unwrap().unwrap().tag_name(), Some("body"));
    }

    #[test]
    fn test_parse_bytes_rejects_invalid_utf8() {
        let parser = HtmlParser::new();
        let err = parser.parse_bytes(b"<p>ok\xFF</p>").unwrap_err();
        assert!(matches!(err, DomError::InputDecoding { valid_up_to: 5 }));
    }

    #[test]
    fn test_parse_bytes_accepts_utf8() {
        let doc = HtmlParser::new().parse_bytes("<p>héllo</p>".as_bytes()).unwrap();
        assert_eq!(doc.find_by_tag("p").len(), 1);
    }

    #[test]
    fn test_issues_from_both_stages() {
        let (_, issues) = HtmlParser::new()
            .parse_with_issues("<!DOCTYPE html><p a=1 a=2></span>")
            .unwrap();

        assert!(issues.iter().any(|i| i.stage == ParseStage::Tokenizer));
        assert!(issues.iter().any(|i| i.stage == ParseStage::TreeBuilder));
        let first_builder = issues
            .iter()
            .position(|i| i.stage == ParseStage::TreeBuilder)
            .unwrap();
        assert!(issues[..first_builder]
            .iter()
            .all(|i| i.stage == ParseStage::Tokenizer));
    }

    #[test]
    fn test_well_formed_document_has_no_issues() {
        let (_, issues) = HtmlParser::new()
            .parse_with_issues("<!DOCTYPE html><html><head></head><body><p>x</p></body></html>")
            .unwrap();
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_collect_issues_disabled() {
        let config = ParserConfig {
            collect_issues: false,
            ..ParserConfig::default()
        };
        let (_, issues) = HtmlParser::with_config(config)
            .parse_with_issues("<p a=1 a=2></span>")
            .unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_parser_is_reusable() {
        let parser = HtmlParser::new();
        let first = parser.parse("<div>a</div>").unwrap();
        let second = parser.parse("<div>a</div>").unwrap();
        assert_eq!(first.node_count(), second.node_count());
    }
}
