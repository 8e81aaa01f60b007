//! Per-mode token rules.

use super::tag_sets::{closes_p, is_head_content, is_heading, is_special, Scope};
use super::{split_leading_whitespace, InsertionMode, ProcessResult, TreeBuilder};
use crate::token::Token;
use crate::tokenizer::RawKind;
use dom::{Attributes, Result};

use ProcessResult::{Done, Reprocess};

/// End tags that the modes before `body` do not ignore.
fn is_structural_end_tag(name: &str) -> bool {
    matches!(name, "head" | "body" | "html" | "br")
}

impl TreeBuilder {
    pub(super) fn initial(&mut self, token: Token) -> Result<ProcessResult> {
        match token {
            Token::Text { data } => {
                let (_, rest) = split_leading_whitespace(&data);
                if rest.is_empty() {
                    return Ok(Done);
                }
                Ok(Reprocess(InsertionMode::BeforeHtml, Token::text(rest)))
            }
            Token::Doctype {
                name,
                public_id,
                system_id,
            } => {
                if name != "html" || public_id.is_some() {
                    self.issue("legacy or unknown doctype");
                }
                self.insert_doctype(name, public_id, system_id)?;
                self.mode = InsertionMode::BeforeHtml;
                Ok(Done)
            }
            token => {
                self.issue("missing doctype");
                Ok(Reprocess(InsertionMode::BeforeHtml, token))
            }
        }
    }

    pub(super) fn before_html(&mut self, token: Token) -> Result<ProcessResult> {
        match token {
            Token::Text { data } => {
                let (_, rest) = split_leading_whitespace(&data);
                if rest.is_empty() {
                    return Ok(Done);
                }
                self.synthesize_html()?;
                Ok(Reprocess(InsertionMode::BeforeHead, Token::text(rest)))
            }
            Token::StartTag {
                name, attributes, ..
            } if name == "html" => {
                self.insert_element(&name, attributes)?;
                self.mode = InsertionMode::BeforeHead;
                Ok(Done)
            }
            Token::EndTag { name } if !is_structural_end_tag(&name) => {
                self.issue("end tag before html, ignored");
                Ok(Done)
            }
            token => {
                self.synthesize_html()?;
                Ok(Reprocess(InsertionMode::BeforeHead, token))
            }
        }
    }

    fn synthesize_html(&mut self) -> Result<()> {
        self.insert_element("html", Attributes::new())?;
        Ok(())
    }

    pub(super) fn before_head(&mut self, token: Token) -> Result<ProcessResult> {
        match token {
            Token::Text { data } => {
                let (_, rest) = split_leading_whitespace(&data);
                if rest.is_empty() {
                    return Ok(Done);
                }
                self.synthesize_head()?;
                Ok(Reprocess(InsertionMode::InHead, Token::text(rest)))
            }
            Token::StartTag { ref name, .. } if name == "html" => self.step(InsertionMode::InBody, token),
            Token::StartTag {
                name, attributes, ..
            } if name == "head" => {
                let head = self.insert_element(&name, attributes)?;
                self.head_element = Some(head);
                self.mode = InsertionMode::InHead;
                Ok(Done)
            }
            Token::EndTag { name } if !is_structural_end_tag(&name) => {
                self.issue("end tag before head, ignored");
                Ok(Done)
            }
            token => {
                self.synthesize_head()?;
                Ok(Reprocess(InsertionMode::InHead, token))
            }
        }
    }

    fn synthesize_head(&mut self) -> Result<()> {
        let head = self.insert_element("head", Attributes::new())?;
        self.head_element = Some(head);
        Ok(())
    }

    pub(super) fn in_head(&mut self, token: Token) -> Result<ProcessResult> {
        match token {
            Token::Text { data } => {
                let (whitespace, rest) = split_leading_whitespace(&data);
                self.insert_text(whitespace)?;
                if rest.is_empty() {
                    return Ok(Done);
                }
                self.leave_head(Token::text(rest))
            }

            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => match name.as_str() {
                "html" => self.step(
                    InsertionMode::InBody,
                    Token::StartTag {
                        name,
                        attributes,
                        self_closing,
                    },
                ),
                "base" | "basefont" | "bgsound" | "link" | "meta" => {
                    self.insert_void_element(&name, attributes)?;
                    Ok(Done)
                }
                "title" => {
                    self.insert_raw_text_element(&name, attributes, RawKind::RcData)?;
                    Ok(Done)
                }
                "noscript" if self.config.scripting_enabled => {
                    self.insert_raw_text_element(&name, attributes, RawKind::RawText)?;
                    Ok(Done)
                }
                "noframes" | "style" => {
                    self.insert_raw_text_element(&name, attributes, RawKind::RawText)?;
                    Ok(Done)
                }
                "script" => {
                    self.insert_raw_text_element(&name, attributes, RawKind::ScriptData)?;
                    Ok(Done)
                }
                "noscript" | "template" => {
                    self.insert_element(&name, attributes)?;
                    Ok(Done)
                }
                "head" => {
                    self.issue("head start tag in head, ignored");
                    Ok(Done)
                }
                _ => self.leave_head(Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                }),
            },

            Token::EndTag { name } => match name.as_str() {
                "head" => {
                    self.pop_until_named("head");
                    self.mode = InsertionMode::AfterHead;
                    Ok(Done)
                }
                "template" | "noscript" => {
                    if self.open_elements_contain(&name) {
                        self.generate_implied_end_tags(None);
                        if !self.current_tag_is(&name) {
                            self.issue("unclosed elements before end tag");
                        }
                        self.pop_until_named(&name);
                    } else {
                        self.issue("end tag without open element, ignored");
                    }
                    Ok(Done)
                }
                "body" | "html" | "br" => self.leave_head(Token::EndTag { name }),
                _ => {
                    self.issue("end tag in head, ignored");
                    Ok(Done)
                }
            },

            token => self.leave_head(token),
        }
    }

    /// "Anything else" in head: close the head and let AfterHead decide.
    fn leave_head(&mut self, token: Token) -> Result<ProcessResult> {
        self.pop_until_named("head");
        Ok(Reprocess(InsertionMode::AfterHead, token))
    }

    fn open_elements_contain(&self, tag: &str) -> bool {
        self.open_elements
            .iter()
            .any(|&id| self.document.tag_name(id) == Some(tag))
    }

    pub(super) fn after_head(&mut self, token: Token) -> Result<ProcessResult> {
        match token {
            Token::Text { data } => {
                let (whitespace, rest) = split_leading_whitespace(&data);
                self.insert_text(whitespace)?;
                if rest.is_empty() {
                    return Ok(Done);
                }
                self.synthesize_body(Token::text(rest))
            }
            Token::StartTag { ref name, .. } if name == "html" => self.step(InsertionMode::InBody, token),
            Token::StartTag {
                name, attributes, ..
            } if name == "body" => {
                self.insert_element(&name, attributes)?;
                self.mode = InsertionMode::InBody;
                Ok(Done)
            }
            Token::StartTag { ref name, .. } if is_head_content(name) => {
                self.issue("head content after head");
                let Some(head) = self.head_element else {
                    return self.step(InsertionMode::InHead, token);
                };
                self.open_elements.push(head);
                let result = self.step(InsertionMode::InHead, token);
                // Raw text elements stay open for their content; anything
                // else pushed above head closes with it
                if self.mode == InsertionMode::Text {
                    self.remove_from_stack(head);
                } else if let Some(pos) = self.open_elements.iter().rposition(|&id| id == head) {
                    self.open_elements.truncate(pos);
                }
                result
            }
            Token::StartTag { ref name, .. } if name == "head" => {
                self.issue("head start tag after head, ignored");
                Ok(Done)
            }
            Token::EndTag { ref name } if name == "template" => self.step(InsertionMode::InHead, token),
            Token::EndTag { name } if !matches!(name.as_str(), "body" | "html" | "br") => {
                self.issue("end tag after head, ignored");
                Ok(Done)
            }
            token => self.synthesize_body(token),
        }
    }

    fn synthesize_body(&mut self, token: Token) -> Result<ProcessResult> {
        self.insert_element("body", Attributes::new())?;
        Ok(Reprocess(InsertionMode::InBody, token))
    }

    pub(super) fn in_body(&mut self, token: Token) -> Result<ProcessResult> {
        match token {
            Token::Text { data } => {
                self.insert_text(&data)?;
                Ok(Done)
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => self.in_body_start_tag(name, attributes, self_closing),
            Token::EndTag { name } => self.in_body_end_tag(name),
            Token::EndOfInput => {
                self.stop_parsing();
                Ok(Done)
            }
            // Comments and doctypes never reach the mode rules
            Token::Comment { .. } | Token::Doctype { .. } => Ok(Done),
        }
    }

    fn in_body_start_tag(&mut self, name: String, attributes: Attributes, self_closing: bool) -> Result<ProcessResult> {
        match name.as_str() {
            "html" => {
                self.issue("html start tag in body");
                if let Some(&html) = self.open_elements.first() {
                    self.merge_attributes(html, &attributes)?;
                }
            }
            "body" => {
                self.issue("body start tag in body");
                let body = self
                    .open_elements
                    .get(1)
                    .copied()
                    .filter(|&id| self.document.tag_name(id) == Some("body"));
                if let Some(body) = body {
                    self.merge_attributes(body, &attributes)?;
                }
            }
            "head" => self.issue("head start tag in body, ignored"),
            tag if is_head_content(tag) => {
                return self.step(
                    InsertionMode::InHead,
                    Token::StartTag {
                        name,
                        attributes,
                        self_closing,
                    },
                );
            }
            tag if is_heading(tag) => {
                self.close_p_in_button_scope();
                if self.current_tag().is_some_and(is_heading) {
                    self.issue("nested heading");
                    self.pop();
                }
                self.insert_element(&name, attributes)?;
            }
            "pre" | "listing" => {
                self.close_p_in_button_scope();
                self.insert_element(&name, attributes)?;
                self.ignore_next_lf = true;
            }
            "li" => {
                self.close_list_item(|tag| tag == "li");
                self.close_p_in_button_scope();
                self.insert_element(&name, attributes)?;
            }
            "dd" | "dt" => {
                self.close_list_item(|tag| matches!(tag, "dd" | "dt"));
                self.close_p_in_button_scope();
                self.insert_element(&name, attributes)?;
            }
            "plaintext" => {
                self.close_p_in_button_scope();
                self.insert_element(&name, attributes)?;
                self.pending_raw = Some(RawKind::PlainText);
            }
            "xmp" => {
                self.close_p_in_button_scope();
                self.insert_raw_text_element(&name, attributes, RawKind::RawText)?;
            }
            "hr" => {
                self.close_p_in_button_scope();
                self.insert_void_element(&name, attributes)?;
            }
            tag if closes_p(tag) => {
                self.close_p_in_button_scope();
                self.insert_element(&name, attributes)?;
            }
            "textarea" => {
                self.insert_raw_text_element(&name, attributes, RawKind::RcData)?;
                self.ignore_next_lf = true;
            }
            "iframe" | "noembed" => {
                self.insert_raw_text_element(&name, attributes, RawKind::RawText)?;
            }
            "noscript" if self.config.scripting_enabled => {
                self.insert_raw_text_element(&name, attributes, RawKind::RawText)?;
            }
            "image" => {
                self.issue("image start tag treated as img");
                self.insert_void_element("img", attributes)?;
            }
            "button" => {
                if self.in_scope("button", Scope::Default) {
                    self.issue("nested button");
                    self.generate_implied_end_tags(None);
                    self.pop_until_named("button");
                }
                self.insert_element(&name, attributes)?;
            }
            _ => {
                self.insert_start_tag(&name, attributes, self_closing)?;
            }
        }
        Ok(Done)
    }

    /// Close an open list item before inserting a new one.
    ///
    /// Walks the stack from the top; stops at the first matching item or at
    /// any special element other than `address`, `div` and `p`.
    fn close_list_item<F>(&mut self, is_item: F)
    where
        F: Fn(&str) -> bool,
    {
        let mut found = None;
        for &id in self.open_elements.iter().rev() {
            let Some(tag) = self.document.tag_name(id) else {
                continue;
            };
            if is_item(tag) {
                found = Some(tag.to_string());
                break;
            }
            if is_special(tag) && !matches!(tag, "address" | "div" | "p") {
                break;
            }
        }

        if let Some(tag) = found {
            self.generate_implied_end_tags(Some(&tag));
            if !self.current_tag_is(&tag) {
                self.issue("unclosed elements inside list item");
            }
            self.pop_until_named(&tag);
        }
    }

    fn in_body_end_tag(&mut self, name: String) -> Result<ProcessResult> {
        match name.as_str() {
            "body" => {
                if self.in_scope("body", Scope::Default) {
                    self.mode = InsertionMode::AfterBody;
                } else {
                    self.issue("body end tag without open body, ignored");
                }
            }
            "html" => {
                if self.in_scope("body", Scope::Default) {
                    return Ok(Reprocess(InsertionMode::AfterBody, Token::EndTag { name }));
                }
                self.issue("html end tag without open body, ignored");
            }
            "p" => {
                if self.in_scope("p", Scope::Button) {
                    self.close_p_element();
                } else {
                    self.issue("p end tag without open p, ignored");
                }
            }
            "li" => self.close_in_scope(&name, Scope::ListItem),
            "dd" | "dt" => self.close_in_scope(&name, Scope::Default),
            tag if is_heading(tag) => {
                if self.in_scope_where(Scope::Default, is_heading) {
                    self.generate_implied_end_tags(None);
                    if !self.current_tag_is(tag) {
                        self.issue("heading end tag does not match open heading");
                    }
                    self.pop_until(is_heading);
                } else {
                    self.issue("heading end tag without open heading, ignored");
                }
            }
            "template" => return self.step(InsertionMode::InHead, Token::EndTag { name }),
            "br" => {
                self.issue("br end tag treated as br start tag");
                self.insert_void_element("br", Attributes::new())?;
            }
            _ => self.close_any(&name),
        }
        Ok(Done)
    }

    /// End tag with implied end tags, honoring `scope`.
    fn close_in_scope(&mut self, tag: &str, scope: Scope) {
        if !self.in_scope(tag, scope) {
            self.issue("end tag without element in scope, ignored");
            return;
        }
        self.generate_implied_end_tags(Some(tag));
        if !self.current_tag_is(tag) {
            self.issue("unclosed elements before end tag");
        }
        self.pop_until_named(tag);
    }

    /// Generic end tag: close the nearest open element with that name
    /// and everything opened after it.
    fn close_any(&mut self, tag: &str) {
        let position = self
            .open_elements
            .iter()
            .rposition(|&id| self.document.tag_name(id) == Some(tag));

        match position {
            Some(pos) => {
                if pos + 1 != self.open_elements.len() {
                    self.issue("end tag closes unclosed elements");
                }
                self.open_elements.truncate(pos);
            }
            None => self.issue("end tag without open element, ignored"),
        }
    }

    pub(super) fn text(&mut self, token: Token) -> Result<ProcessResult> {
        match token {
            Token::Text { data } => {
                self.insert_text(&data)?;
                Ok(Done)
            }
            Token::EndTag { .. } => {
                self.pop();
                self.mode = self.original_mode;
                Ok(Done)
            }
            token => {
                if token == Token::EndOfInput {
                    self.issue("end of input in raw text element");
                } else {
                    self.issue("unexpected token in raw text element");
                }
                self.pop();
                Ok(Reprocess(self.original_mode, token))
            }
        }
    }

    pub(super) fn after_body(&mut self, token: Token) -> Result<ProcessResult> {
        match token {
            Token::Text { data } => self.whitespace_then_body(data),
            Token::StartTag { ref name, .. } if name == "html" => self.step(InsertionMode::InBody, token),
            Token::EndTag { ref name } if name == "html" => {
                self.mode = InsertionMode::AfterAfterBody;
                Ok(Done)
            }
            Token::EndOfInput => {
                self.stop_parsing();
                Ok(Done)
            }
            token => {
                self.issue("content after body");
                Ok(Reprocess(InsertionMode::InBody, token))
            }
        }
    }

    pub(super) fn after_after_body(&mut self, token: Token) -> Result<ProcessResult> {
        match token {
            Token::Text { data } => self.whitespace_then_body(data),
            Token::StartTag { ref name, .. } if name == "html" => self.step(InsertionMode::InBody, token),
            Token::EndOfInput => {
                self.stop_parsing();
                Ok(Done)
            }
            token => {
                self.issue("content after html");
                Ok(Reprocess(InsertionMode::InBody, token))
            }
        }
    }

    /// Whitespace goes in with the body rules; anything after it reopens
    /// the body.
    fn whitespace_then_body(&mut self, data: String) -> Result<ProcessResult> {
        let (whitespace, rest) = split_leading_whitespace(&data);
        if !whitespace.is_empty() {
            self.step(InsertionMode::InBody, Token::text(whitespace))?;
        }
        if rest.is_empty() {
            return Ok(Done);
        }
        self.issue("text after body");
        Ok(Reprocess(InsertionMode::InBody, Token::text(rest)))
    }
}
