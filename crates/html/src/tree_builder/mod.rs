//! Tree construction
//!
//! Consumes tokens one at a time and builds a [`Document`]. Malformed input
//! is repaired on the fly: missing `html`/`head`/`body` elements are
//! synthesized, unclosed elements are closed implicitly, and stray end tags
//! are dropped. Nothing here fails except allocation.
//!
//! ## Insertion modes
//!
//! ```text
//! Initial → BeforeHtml → BeforeHead → InHead → AfterHead → InBody → AfterBody → AfterAfterBody
//!                                         ↘        ↙          ↓
//!                                           Text  ←───────────┘
//! ```
//!
//! Each mode has one rule function (see `rules.rs`). A rule either consumes
//! the token or hands it back together with the mode that should see it
//! next, which keeps every token's processing bounded.

mod rules;
pub mod tag_sets;

use crate::issues::ParseIssue;
use crate::parser::ParserConfig;
use crate::token::Token;
use crate::tokenizer::RawKind;
use dom::{Attributes, DoctypeData, Document, ElementData, NodeData, NodeId, Result};
use std::mem;
use tag_sets::{has_implied_end_tag, is_void, Scope};

/// Upper bound on how often one token may be handed to another mode.
pub const MAX_MODE_SWITCHES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionMode {
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    AfterHead,
    InBody,
    Text,
    AfterBody,
    AfterAfterBody,
}

#[derive(Debug)]
pub(crate) enum ProcessResult {
    Done,
    Reprocess(InsertionMode, Token),
}

#[derive(Debug)]
pub struct TreeBuilder {
    config: ParserConfig,
    document: Document,
    mode: InsertionMode,
    /// Mode to return to when a raw-text element closes
    original_mode: InsertionMode,
    open_elements: Vec<NodeId>,
    head_element: Option<NodeId>,
    /// Drop a leading newline from the next text token (`pre`, `textarea`)
    ignore_next_lf: bool,
    /// Content model the tokenizer must switch to after the current token
    pending_raw: Option<RawKind>,
    token_index: usize,
    finished: bool,
    issues: Vec<ParseIssue>,
}

impl TreeBuilder {
    pub fn new(config: ParserConfig) -> Self {
        Self::with_document(config, Document::new())
    }

    /// Build into a pre-sized document.
    pub fn with_document(config: ParserConfig, document: Document) -> Self {
        Self {
            config,
            document,
            mode: InsertionMode::Initial,
            original_mode: InsertionMode::Initial,
            open_elements: Vec::new(),
            head_element: None,
            ignore_next_lf: false,
            pending_raw: None,
            token_index: 0,
            finished: false,
            issues: Vec::new(),
        }
    }

    pub fn mode(&self) -> InsertionMode {
        self.mode
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one token.
    ///
    /// Returns the content model the tokenizer has to switch to before
    /// producing the next token, if the token opened a raw-text element.
    pub fn process(&mut self, mut token: Token) -> Result<Option<RawKind>> {
        if self.finished {
            return Ok(None);
        }

        if mem::take(&mut self.ignore_next_lf) {
            if let Token::Text { data } = &mut token {
                if data.starts_with('\n') {
                    data.remove(0);
                    if data.is_empty() {
                        self.token_index += 1;
                        return Ok(None);
                    }
                }
            }
        }

        let mut mode = self.mode;
        for _ in 0..=MAX_MODE_SWITCHES {
            match self.step(mode, token)? {
                ProcessResult::Done => {
                    self.token_index += 1;
                    return Ok(self.pending_raw.take());
                }
                ProcessResult::Reprocess(next_mode, next_token) => {
                    tracing::trace!("[TreeBuilder] Reprocessing {} in {:?}", next_token, next_mode);
                    self.mode = next_mode;
                    mode = next_mode;
                    token = next_token;
                }
            }
        }

        self.issue("token reprocessed too often, dropped");
        self.token_index += 1;
        Ok(self.pending_raw.take())
    }

    /// Close everything still open and hand out the finished document.
    pub fn finish(mut self) -> Result<(Document, Vec<ParseIssue>)> {
        if !self.finished {
            self.process(Token::EndOfInput)?;
        }
        Ok((self.document, self.issues))
    }

    /// Rules shared by every mode, then dispatch to the mode's own rules.
    pub(crate) fn step(&mut self, mode: InsertionMode, token: Token) -> Result<ProcessResult> {
        match token {
            Token::Comment { data } => {
                let parent = self.comment_parent(mode);
                let comment = self.document.create_node(NodeData::Comment(data))?;
                self.document.append_child(parent, comment)?;
                Ok(ProcessResult::Done)
            }
            Token::Doctype { .. } if mode != InsertionMode::Initial => {
                self.issue("unexpected doctype, ignored");
                Ok(ProcessResult::Done)
            }
            token => match mode {
                InsertionMode::Initial => self.initial(token),
                InsertionMode::BeforeHtml => self.before_html(token),
                InsertionMode::BeforeHead => self.before_head(token),
                InsertionMode::InHead => self.in_head(token),
                InsertionMode::AfterHead => self.after_head(token),
                InsertionMode::InBody => self.in_body(token),
                InsertionMode::Text => self.text(token),
                InsertionMode::AfterBody => self.after_body(token),
                InsertionMode::AfterAfterBody => self.after_after_body(token),
            },
        }
    }

    fn comment_parent(&self, mode: InsertionMode) -> NodeId {
        match mode {
            InsertionMode::Initial | InsertionMode::BeforeHtml | InsertionMode::AfterAfterBody => {
                self.document.root_id()
            }
            InsertionMode::AfterBody => self
                .open_elements
                .first()
                .copied()
                .unwrap_or_else(|| self.document.root_id()),
            _ => self.current_node(),
        }
    }

    // ---- stack of open elements ----

    fn current_node(&self) -> NodeId {
        self.open_elements
            .last()
            .copied()
            .unwrap_or_else(|| self.document.root_id())
    }

    fn current_tag(&self) -> Option<&str> {
        self.open_elements
            .last()
            .and_then(|&id| self.document.tag_name(id))
    }

    fn current_tag_is(&self, tag: &str) -> bool {
        self.current_tag() == Some(tag)
    }

    fn pop(&mut self) -> Option<NodeId> {
        self.open_elements.pop()
    }

    /// Pop elements until one matching `pred` has been popped.
    fn pop_until<F>(&mut self, pred: F)
    where
        F: Fn(&str) -> bool,
    {
        while let Some(id) = self.pop() {
            if self.document.tag_name(id).is_some_and(&pred) {
                break;
            }
        }
    }

    fn pop_until_named(&mut self, tag: &str) {
        self.pop_until(|name| name == tag);
    }

    /// Whether an element matching `pred` is open without a `scope`
    /// boundary between it and the current node.
    fn in_scope_where<F>(&self, scope: Scope, pred: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        for &id in self.open_elements.iter().rev() {
            let Some(name) = self.document.tag_name(id) else {
                continue;
            };
            if pred(name) {
                return true;
            }
            if scope.is_boundary(name) {
                return false;
            }
        }
        false
    }

    fn in_scope(&self, tag: &str, scope: Scope) -> bool {
        self.in_scope_where(scope, |name| name == tag)
    }

    fn generate_implied_end_tags(&mut self, except: Option<&str>) {
        while let Some(tag) = self.current_tag() {
            if !has_implied_end_tag(tag) || Some(tag) == except {
                break;
            }
            self.pop();
        }
    }

    fn close_p_element(&mut self) {
        self.generate_implied_end_tags(Some("p"));
        if !self.current_tag_is("p") {
            self.issue("unclosed elements inside p");
        }
        self.pop_until_named("p");
    }

    fn close_p_in_button_scope(&mut self) {
        if self.in_scope("p", Scope::Button) {
            self.close_p_element();
        }
    }

    /// Drop the element from wherever it sits on the stack.
    fn remove_from_stack(&mut self, node_id: NodeId) {
        if let Some(pos) = self.open_elements.iter().rposition(|&id| id == node_id) {
            self.open_elements.remove(pos);
        }
    }

    fn stop_parsing(&mut self) {
        tracing::trace!(
            "[TreeBuilder] Stopping with {} open elements",
            self.open_elements.len()
        );
        self.open_elements.clear();
        self.finished = true;
    }

    // ---- insertion ----

    fn create_element(&mut self, name: &str, attributes: Attributes) -> Result<NodeId> {
        self.document
            .create_node(NodeData::Element(ElementData::new(name, attributes)))
    }

    /// Append a new element to the current node and push it.
    fn insert_element(&mut self, name: &str, attributes: Attributes) -> Result<NodeId> {
        let parent = self.current_node();
        let id = self.create_element(name, attributes)?;
        self.document.append_child(parent, id)?;
        self.open_elements.push(id);
        Ok(id)
    }

    /// Append a new element to the current node without pushing it.
    fn insert_void_element(&mut self, name: &str, attributes: Attributes) -> Result<NodeId> {
        let parent = self.current_node();
        let id = self.create_element(name, attributes)?;
        self.document.append_child(parent, id)?;
        Ok(id)
    }

    /// Insert a start tag, pushing it unless it is a void element.
    fn insert_start_tag(&mut self, name: &str, attributes: Attributes, self_closing: bool) -> Result<NodeId> {
        if is_void(name) {
            return self.insert_void_element(name, attributes);
        }
        if self_closing {
            self.issue("self-closing flag on non-void element ignored");
        }
        self.insert_element(name, attributes)
    }

    /// Insert an element whose contents the tokenizer reads as raw text,
    /// and wait for its end tag in the Text mode.
    fn insert_raw_text_element(&mut self, name: &str, attributes: Attributes, kind: RawKind) -> Result<()> {
        self.insert_element(name, attributes)?;
        self.pending_raw = Some(kind);
        self.original_mode = self.mode;
        self.mode = InsertionMode::Text;
        Ok(())
    }

    fn insert_text(&mut self, data: &str) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let parent = self.current_node();
        self.document.append_text(parent, data)?;
        Ok(())
    }

    fn insert_doctype(&mut self, name: String, public_id: Option<String>, system_id: Option<String>) -> Result<()> {
        let root = self.document.root_id();
        let doctype = self.document.create_node(NodeData::Doctype(DoctypeData {
            name,
            public_id,
            system_id,
        }))?;
        self.document.append_child(root, doctype)
    }

    /// Copy attributes the element does not carry yet.
    fn merge_attributes(&mut self, node_id: NodeId, attributes: &Attributes) -> Result<()> {
        for attr in attributes {
            self.document
                .set_attribute_if_absent(node_id, &attr.name, &attr.value)?;
        }
        Ok(())
    }

    fn issue(&mut self, message: &str) {
        tracing::debug!("[TreeBuilder] {} at token {}", message, self.token_index);
        if self.config.collect_issues {
            self.issues
                .push(ParseIssue::tree_builder(message, self.token_index));
        }
    }
}

/// Split character data into its leading HTML whitespace and the rest.
fn split_leading_whitespace(data: &str) -> (&str, &str) {
    let split = data
        .find(|c: char| !matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' '))
        .unwrap_or(data.len());
    data.split_at(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;
    use dom::DomSerializer;

    fn build(input: &str) -> (Document, Vec<ParseIssue>) {
        let mut tokenizer = tokenize(input);
        let mut builder = TreeBuilder::new(ParserConfig::default());
        while let Some(token) = tokenizer.next() {
            if let Some(kind) = builder.process(token).unwrap() {
                tokenizer.switch_to(kind);
            }
        }
        builder.finish().unwrap()
    }

    fn outline(input: &str) -> String {
        let (doc, _) = build(input);
        DomSerializer::new().outline(&doc).unwrap()
    }

    #[test]
    fn test_split_leading_whitespace() {
        assert_eq!(split_leading_whitespace("  \nab c"), ("  \n", "ab c"));
        assert_eq!(split_leading_whitespace("   "), ("   ", ""));
        assert_eq!(split_leading_whitespace("x"), ("", "x"));
    }

    #[test]
    fn test_empty_input_gets_skeleton() {
        assert_eq!(outline(""), "| <html>\n|   <head>\n|   <body>\n");
    }

    #[test]
    fn test_text_only_input() {
        assert_eq!(
            outline("  hello"),
            "| <html>\n|   <head>\n|   <body>\n|     \"hello\"\n"
        );
    }

    #[test]
    fn test_mode_sequence_for_full_document() {
        let mut builder = TreeBuilder::new(ParserConfig::default());
        let mut tokenizer = tokenize("<!DOCTYPE html><html><head></head><body></body></html>");

        let mut modes = Vec::new();
        while let Some(token) = tokenizer.next() {
            builder.process(token).unwrap();
            modes.push(builder.mode());
        }
        assert_eq!(
            modes,
            vec![
                InsertionMode::BeforeHtml,
                InsertionMode::BeforeHead,
                InsertionMode::InHead,
                InsertionMode::AfterHead,
                InsertionMode::InBody,
                InsertionMode::AfterBody,
                InsertionMode::AfterAfterBody,
                InsertionMode::AfterAfterBody,
            ]
        );
        assert!(builder.is_finished());
    }

    #[test]
    fn test_raw_text_switch_is_requested() {
        let mut builder = TreeBuilder::new(ParserConfig::default());
        assert_eq!(builder.process(Token::start_tag("script")).unwrap(), Some(RawKind::ScriptData));
        assert_eq!(builder.mode(), InsertionMode::Text);
        assert_eq!(builder.process(Token::text("x")).unwrap(), None);
        assert_eq!(builder.process(Token::end_tag("script")).unwrap(), None);
        assert_eq!(builder.mode(), InsertionMode::InHead);
    }

    #[test]
    fn test_noscript_depends_on_scripting() {
        let mut builder = TreeBuilder::new(ParserConfig::default());
        assert_eq!(builder.process(Token::start_tag("noscript")).unwrap(), Some(RawKind::RawText));

        let config = ParserConfig {
            scripting_enabled: false,
            ..ParserConfig::default()
        };
        let mut builder = TreeBuilder::new(config);
        assert_eq!(builder.process(Token::start_tag("noscript")).unwrap(), None);
    }

    #[test]
    fn test_tokens_after_finish_are_ignored() {
        let mut builder = TreeBuilder::new(ParserConfig::default());
        builder.process(Token::EndOfInput).unwrap();
        assert!(builder.is_finished());
        builder.process(Token::start_tag("div")).unwrap();
        let (doc, _) = builder.finish().unwrap();
        assert!(doc.find_by_tag("div").is_empty());
    }

    #[test]
    fn test_finish_without_end_of_input() {
        let mut builder = TreeBuilder::new(ParserConfig::default());
        builder.process(Token::start_tag("p")).unwrap();
        let (doc, _) = builder.finish().unwrap();
        assert_eq!(doc.find_by_tag("p").len(), 1);
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_issues_not_collected_when_disabled() {
        let config = ParserConfig {
            collect_issues: false,
            ..ParserConfig::default()
        };
        let mut builder = TreeBuilder::new(config);
        builder.process(Token::end_tag("nothing")).unwrap();
        let (_, issues) = builder.finish().unwrap();
        assert!(issues.is_empty());
    }
}
