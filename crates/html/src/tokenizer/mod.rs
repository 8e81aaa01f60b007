//! HTML tokenizer
//!
//! Turns input text into a lazy stream of [`Token`]s. The tokenizer never
//! fails: malformed markup is recovered from and reported as a
//! [`ParseIssue`], and every input ends with exactly one
//! [`Token::EndOfInput`].
//!
//! ```text
//! "<p class=x>hi</p>"
//!     → StartTag(p, class=x) → Text("hi") → EndTag(p) → EndOfInput
//! ```
//!
//! The tree builder drives content-model switching: after inserting a
//! `<script>`, `<style>`, `<title>` or similar element it calls
//! [`Tokenizer::switch_to`] so the element's body is read as raw text.

pub mod char_ref;
pub mod states;

use crate::issues::ParseIssue;
use crate::token::Token;
use dom::Attributes;
use states::{AttrValueKind, DoctypeIdKind, Quote, State};
use std::collections::VecDeque;
use std::mem;

pub use states::RawKind;

#[derive(Debug)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    state: State,
    /// Tokens ready to be handed out, in order
    pending: VecDeque<Token>,
    /// Character data not yet emitted; flushed before any other token
    text: String,

    tag_name: String,
    tag_is_end: bool,
    tag_self_closing: bool,
    tag_attributes: Attributes,
    current_attribute: Option<(String, String)>,

    comment: String,

    doctype_name: String,
    doctype_public_id: Option<String>,
    doctype_system_id: Option<String>,

    /// Name of the last start tag emitted, for matching raw-text end tags
    last_start_tag: String,
    finished: bool,
    issues: Vec<ParseIssue>,
}

/// Tokenize `input` lazily.
pub fn tokenize(input: &str) -> Tokenizer<'_> {
    Tokenizer::new(input)
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            state: State::Data,
            pending: VecDeque::new(),
            text: String::new(),
            tag_name: String::new(),
            tag_is_end: false,
            tag_self_closing: false,
            tag_attributes: Attributes::new(),
            current_attribute: None,
            comment: String::new(),
            doctype_name: String::new(),
            doctype_public_id: None,
            doctype_system_id: None,
            last_start_tag: String::new(),
            finished: false,
            issues: Vec::new(),
        }
    }

    /// Read the following input under a different content model.
    ///
    /// Must be called right after the start tag that opened the raw-text
    /// element has been taken from the iterator. RcData, RawText and
    /// ScriptData end at the matching end tag; PlainText never ends.
    pub fn switch_to(&mut self, kind: RawKind) {
        tracing::trace!("[Tokenizer] Switching to {:?} after <{}>", kind, self.last_start_tag);
        self.state = State::Raw(kind);
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Drain the issues recorded so far.
    pub fn take_issues(&mut self) -> Vec<ParseIssue> {
        mem::take(&mut self.issues)
    }

    // ---- input helpers ----

    fn rest(&self) -> &'a str {
        let input = self.input;
        &input[self.pos..]
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn reconsume(&mut self, c: char) {
        self.pos -= c.len_utf8();
    }

    /// Consume characters up to (not including) the first one in `stops`.
    fn take_until(&mut self, stops: &[char]) -> &'a str {
        let rest = self.rest();
        let end = rest.find(stops).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn issue(&mut self, message: &str, offset: usize) {
        tracing::debug!("[Tokenizer] {} at byte {}", message, offset);
        self.issues.push(ParseIssue::tokenizer(message, offset));
    }

    // ---- emission ----

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let data = mem::take(&mut self.text);
            self.pending.push_back(Token::Text { data });
        }
    }

    fn emit(&mut self, token: Token) {
        self.flush_text();
        self.pending.push_back(token);
    }

    fn begin_tag(&mut self, is_end: bool) {
        self.tag_name.clear();
        self.tag_is_end = is_end;
        self.tag_self_closing = false;
        self.tag_attributes = Attributes::new();
        self.current_attribute = None;
    }

    fn begin_attribute(&mut self, first: char) {
        self.finish_attribute();
        self.current_attribute = Some((first.to_ascii_lowercase().to_string(), String::new()));
    }

    fn finish_attribute(&mut self) {
        if let Some((name, value)) = self.current_attribute.take() {
            if !self.tag_attributes.insert_if_absent(name, value) {
                self.issue("duplicate attribute", self.pos);
            }
        }
    }

    fn push_attribute_name(&mut self, c: char) {
        if let Some((name, _)) = self.current_attribute.as_mut() {
            name.push(c.to_ascii_lowercase());
        }
    }

    fn push_attribute_value(&mut self, s: &str) {
        if let Some((_, value)) = self.current_attribute.as_mut() {
            value.push_str(s);
        }
    }

    fn emit_tag(&mut self) {
        self.finish_attribute();
        let name = mem::take(&mut self.tag_name);
        let attributes = mem::take(&mut self.tag_attributes);

        if self.tag_is_end {
            if !attributes.is_empty() {
                self.issue("end tag with attributes", self.pos);
            }
            if self.tag_self_closing {
                self.issue("end tag with trailing solidus", self.pos);
            }
            self.emit(Token::EndTag { name });
        } else {
            self.last_start_tag.clone_from(&name);
            self.emit(Token::StartTag {
                name,
                attributes,
                self_closing: self.tag_self_closing,
            });
        }
    }

    fn emit_comment(&mut self) {
        let data = mem::take(&mut self.comment);
        self.emit(Token::Comment { data });
    }

    fn begin_doctype(&mut self) {
        self.doctype_name.clear();
        self.doctype_public_id = None;
        self.doctype_system_id = None;
    }

    fn emit_doctype(&mut self) {
        let token = Token::Doctype {
            name: mem::take(&mut self.doctype_name),
            public_id: self.doctype_public_id.take(),
            system_id: self.doctype_system_id.take(),
        };
        self.emit(token);
    }

    fn doctype_id_mut(&mut self, kind: DoctypeIdKind) -> &mut Option<String> {
        match kind {
            DoctypeIdKind::Public => &mut self.doctype_public_id,
            DoctypeIdKind::System => &mut self.doctype_system_id,
        }
    }

    /// Decode the character reference following an already consumed `&`.
    ///
    /// Returns `None` when nothing decodes; the caller keeps the `&`.
    fn consume_char_ref(&mut self, in_attribute: bool) -> Option<String> {
        let amp = self.pos - 1;
        let decoded = char_ref::decode(self.rest(), in_attribute)?;
        self.pos += decoded.consumed;
        if !self.input[..self.pos].ends_with(';') {
            self.issue("character reference missing semicolon", amp);
        }
        Some(decoded.text)
    }

    /// `</name` followed by whitespace, `/` or `>`, where `name` matches
    /// the last start tag. `rest` starts right after the `<`.
    fn is_appropriate_end_tag(&self, rest: &str) -> bool {
        let name = self.last_start_tag.as_str();
        let Some(after_slash) = rest.strip_prefix('/') else {
            return false;
        };
        if name.is_empty() || !starts_with_ignore_case(after_slash, name) {
            return false;
        }
        matches!(
            after_slash[name.len()..].chars().next(),
            Some('\t' | '\n' | '\x0C' | '\r' | ' ' | '/' | '>')
        )
    }

    // ---- state machine ----

    fn step(&mut self) {
        if self.state == State::MarkupDeclarationOpen {
            self.markup_declaration_open();
            return;
        }

        let Some(c) = self.next_char() else {
            self.end_of_input();
            return;
        };

        match self.state {
            State::Data => match c {
                '<' => self.state = State::TagOpen,
                '&' => match self.consume_char_ref(false) {
                    Some(decoded) => self.text.push_str(&decoded),
                    None => self.text.push('&'),
                },
                _ => {
                    self.text.push(c);
                    let run = self.take_until(&['<', '&']);
                    self.text.push_str(run);
                }
            },

            State::Raw(kind) => self.raw_text(kind, c),

            State::TagOpen => match c {
                '!' => self.state = State::MarkupDeclarationOpen,
                '/' => self.state = State::EndTagOpen,
                c if c.is_ascii_alphabetic() => {
                    self.begin_tag(false);
                    self.reconsume(c);
                    self.state = State::TagName;
                }
                '?' => {
                    self.issue("unexpected question mark instead of tag name", self.pos - 1);
                    self.comment.clear();
                    self.reconsume(c);
                    self.state = State::BogusComment;
                }
                _ => {
                    self.issue("invalid first character of tag name", self.pos - 1);
                    self.text.push('<');
                    self.reconsume(c);
                    self.state = State::Data;
                }
            },

            State::EndTagOpen => match c {
                c if c.is_ascii_alphabetic() => {
                    self.begin_tag(true);
                    self.reconsume(c);
                    self.state = State::TagName;
                }
                '>' => {
                    self.issue("missing end tag name", self.pos - 1);
                    self.state = State::Data;
                }
                _ => {
                    self.issue("invalid first character of end tag name", self.pos - 1);
                    self.comment.clear();
                    self.reconsume(c);
                    self.state = State::BogusComment;
                }
            },

            State::TagName => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => self.state = State::BeforeAttributeName,
                '/' => self.state = State::SelfClosingStartTag,
                '>' => {
                    self.emit_tag();
                    self.state = State::Data;
                }
                _ => self.tag_name.push(c.to_ascii_lowercase()),
            },

            State::BeforeAttributeName => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => {}
                '/' | '>' => {
                    self.reconsume(c);
                    self.state = State::AfterAttributeName;
                }
                '=' => {
                    self.issue("unexpected equals sign before attribute name", self.pos - 1);
                    self.begin_attribute(c);
                    self.state = State::AttributeName;
                }
                _ => {
                    self.begin_attribute(c);
                    self.state = State::AttributeName;
                }
            },

            State::AttributeName => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' | '/' | '>' => {
                    self.reconsume(c);
                    self.state = State::AfterAttributeName;
                }
                '=' => self.state = State::BeforeAttributeValue,
                _ => {
                    if matches!(c, '"' | '\'' | '<') {
                        self.issue("unexpected character in attribute name", self.pos - 1);
                    }
                    self.push_attribute_name(c);
                }
            },

            State::AfterAttributeName => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => {}
                '/' => self.state = State::SelfClosingStartTag,
                '=' => self.state = State::BeforeAttributeValue,
                '>' => {
                    self.emit_tag();
                    self.state = State::Data;
                }
                _ => {
                    self.begin_attribute(c);
                    self.state = State::AttributeName;
                }
            },

            State::BeforeAttributeValue => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => {}
                '"' | '\'' => {
                    if let Some(quote) = Quote::from_char(c) {
                        self.state = State::AttributeValue(AttrValueKind::Quoted(quote));
                    }
                }
                '>' => {
                    self.issue("missing attribute value", self.pos - 1);
                    self.emit_tag();
                    self.state = State::Data;
                }
                _ => {
                    self.reconsume(c);
                    self.state = State::AttributeValue(AttrValueKind::Unquoted);
                }
            },

            State::AttributeValue(AttrValueKind::Quoted(quote)) => match c {
                c if c == quote.as_char() => self.state = State::AfterAttributeValueQuoted,
                '&' => self.attribute_char_ref(),
                _ => {
                    let mut buf = [0u8; 4];
                    self.push_attribute_value(c.encode_utf8(&mut buf));
                    let run = self.take_until(&[quote.as_char(), '&']);
                    self.push_attribute_value(run);
                }
            },

            State::AttributeValue(AttrValueKind::Unquoted) => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => self.state = State::BeforeAttributeName,
                '&' => self.attribute_char_ref(),
                '>' => {
                    self.emit_tag();
                    self.state = State::Data;
                }
                _ => {
                    if matches!(c, '"' | '\'' | '<' | '=' | '`') {
                        self.issue("unexpected character in unquoted attribute value", self.pos - 1);
                    }
                    let mut buf = [0u8; 4];
                    self.push_attribute_value(c.encode_utf8(&mut buf));
                }
            },

            State::AfterAttributeValueQuoted => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => self.state = State::BeforeAttributeName,
                '/' => self.state = State::SelfClosingStartTag,
                '>' => {
                    self.emit_tag();
                    self.state = State::Data;
                }
                _ => {
                    self.issue("missing whitespace between attributes", self.pos - 1);
                    self.reconsume(c);
                    self.state = State::BeforeAttributeName;
                }
            },

            State::SelfClosingStartTag => match c {
                '>' => {
                    self.tag_self_closing = true;
                    self.emit_tag();
                    self.state = State::Data;
                }
                _ => {
                    self.issue("unexpected solidus in tag", self.pos - 1);
                    self.reconsume(c);
                    self.state = State::BeforeAttributeName;
                }
            },

            // Handled before a character is consumed
            State::MarkupDeclarationOpen => self.reconsume(c),

            State::BogusComment => match c {
                '>' => {
                    self.emit_comment();
                    self.state = State::Data;
                }
                _ => {
                    self.comment.push(c);
                    let run = self.take_until(&['>']);
                    self.comment.push_str(run);
                }
            },

            State::CommentStart => match c {
                '-' => self.state = State::CommentStartDash,
                '>' => {
                    self.issue("abrupt closing of empty comment", self.pos - 1);
                    self.emit_comment();
                    self.state = State::Data;
                }
                _ => {
                    self.reconsume(c);
                    self.state = State::Comment;
                }
            },

            State::CommentStartDash => match c {
                '-' => self.state = State::CommentEnd,
                '>' => {
                    self.issue("abrupt closing of empty comment", self.pos - 1);
                    self.emit_comment();
                    self.state = State::Data;
                }
                _ => {
                    self.comment.push('-');
                    self.reconsume(c);
                    self.state = State::Comment;
                }
            },

            State::Comment => match c {
                '-' => self.state = State::CommentEndDash,
                _ => {
                    self.comment.push(c);
                    let run = self.take_until(&['-']);
                    self.comment.push_str(run);
                }
            },

            State::CommentEndDash => match c {
                '-' => self.state = State::CommentEnd,
                _ => {
                    self.comment.push('-');
                    self.reconsume(c);
                    self.state = State::Comment;
                }
            },

            State::CommentEnd => match c {
                '>' => {
                    self.emit_comment();
                    self.state = State::Data;
                }
                '!' => self.state = State::CommentEndBang,
                '-' => self.comment.push('-'),
                _ => {
                    self.comment.push_str("--");
                    self.reconsume(c);
                    self.state = State::Comment;
                }
            },

            State::CommentEndBang => match c {
                '-' => {
                    self.comment.push_str("--!");
                    self.state = State::CommentEndDash;
                }
                '>' => {
                    self.issue("incorrectly closed comment", self.pos - 1);
                    self.emit_comment();
                    self.state = State::Data;
                }
                _ => {
                    self.comment.push_str("--!");
                    self.reconsume(c);
                    self.state = State::Comment;
                }
            },

            State::Doctype => {
                if !matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ' | '>') {
                    self.issue("missing whitespace before doctype name", self.pos - 1);
                }
                if !c.is_ascii_whitespace() {
                    self.reconsume(c);
                }
                self.state = State::BeforeDoctypeName;
            }

            State::BeforeDoctypeName => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => {}
                '>' => {
                    self.issue("missing doctype name", self.pos - 1);
                    self.emit_doctype();
                    self.state = State::Data;
                }
                _ => {
                    self.doctype_name.push(c.to_ascii_lowercase());
                    self.state = State::DoctypeName;
                }
            },

            State::DoctypeName => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => self.state = State::AfterDoctypeName,
                '>' => {
                    self.emit_doctype();
                    self.state = State::Data;
                }
                _ => self.doctype_name.push(c.to_ascii_lowercase()),
            },

            State::AfterDoctypeName => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => {}
                '>' => {
                    self.emit_doctype();
                    self.state = State::Data;
                }
                _ => {
                    self.reconsume(c);
                    let rest = self.rest();
                    if starts_with_ignore_case(rest, "public") {
                        self.pos += "public".len();
                        self.state = State::BeforeDoctypeIdentifier(DoctypeIdKind::Public);
                    } else if starts_with_ignore_case(rest, "system") {
                        self.pos += "system".len();
                        self.state = State::BeforeDoctypeIdentifier(DoctypeIdKind::System);
                    } else {
                        self.issue("invalid character sequence after doctype name", self.pos);
                        self.pos += c.len_utf8();
                        self.state = State::BogusDoctype;
                    }
                }
            },

            State::BeforeDoctypeIdentifier(kind) => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => {}
                '"' | '\'' => {
                    *self.doctype_id_mut(kind) = Some(String::new());
                    if let Some(quote) = Quote::from_char(c) {
                        self.state = State::DoctypeIdentifier(kind, quote);
                    }
                }
                '>' => {
                    self.issue("missing doctype identifier", self.pos - 1);
                    self.emit_doctype();
                    self.state = State::Data;
                }
                _ => {
                    self.issue("missing quote before doctype identifier", self.pos - 1);
                    self.state = State::BogusDoctype;
                }
            },

            State::DoctypeIdentifier(kind, quote) => match c {
                c if c == quote.as_char() => self.state = State::AfterDoctypeIdentifier(kind),
                '>' => {
                    self.issue("abrupt doctype identifier", self.pos - 1);
                    self.emit_doctype();
                    self.state = State::Data;
                }
                _ => {
                    if let Some(id) = self.doctype_id_mut(kind).as_mut() {
                        id.push(c);
                    }
                }
            },

            State::AfterDoctypeIdentifier(kind) => match c {
                '\t' | '\n' | '\x0C' | '\r' | ' ' => {}
                '>' => {
                    self.emit_doctype();
                    self.state = State::Data;
                }
                '"' | '\'' if kind == DoctypeIdKind::Public => {
                    self.doctype_system_id = Some(String::new());
                    if let Some(quote) = Quote::from_char(c) {
                        self.state = State::DoctypeIdentifier(DoctypeIdKind::System, quote);
                    }
                }
                _ => {
                    self.issue("unexpected character after doctype identifier", self.pos - 1);
                    self.state = State::BogusDoctype;
                }
            },

            State::BogusDoctype => {
                if c == '>' {
                    self.emit_doctype();
                    self.state = State::Data;
                }
            }
        }
    }

    fn attribute_char_ref(&mut self) {
        match self.consume_char_ref(true) {
            Some(decoded) => self.push_attribute_value(&decoded),
            None => self.push_attribute_value("&"),
        }
    }

    fn raw_text(&mut self, kind: RawKind, c: char) {
        match (kind, c) {
            (RawKind::PlainText, _) => {
                self.text.push(c);
                let rest = self.rest();
                self.text.push_str(rest);
                self.pos = self.input.len();
            }
            (RawKind::RcData, '&') => match self.consume_char_ref(false) {
                Some(decoded) => self.text.push_str(&decoded),
                None => self.text.push('&'),
            },
            (_, '<') if self.is_appropriate_end_tag(self.rest()) => {
                // Skip "/name"; the tag name state reads the terminator
                self.pos += 1 + self.last_start_tag.len();
                self.begin_tag(true);
                self.tag_name.clone_from(&self.last_start_tag);
                self.state = State::TagName;
            }
            _ => {
                self.text.push(c);
                let run = match kind {
                    RawKind::RcData => self.take_until(&['<', '&']),
                    _ => self.take_until(&['<']),
                };
                self.text.push_str(run);
            }
        }
    }

    fn markup_declaration_open(&mut self) {
        let rest = self.rest();
        if rest.starts_with("--") {
            self.pos += 2;
            self.comment.clear();
            self.state = State::CommentStart;
        } else if starts_with_ignore_case(rest, "doctype") {
            self.pos += "doctype".len();
            self.begin_doctype();
            self.state = State::Doctype;
        } else if rest.starts_with("[CDATA[") {
            self.issue("CDATA section outside foreign content", self.pos);
            self.pos += "[CDATA[".len();
            self.comment.clear();
            self.comment.push_str("[CDATA[");
            self.state = State::BogusComment;
        } else {
            self.issue("incorrectly opened comment", self.pos);
            self.comment.clear();
            self.state = State::BogusComment;
        }
    }

    /// Flush whatever construct is open as a best-effort token, then
    /// queue the final [`Token::EndOfInput`].
    fn end_of_input(&mut self) {
        let offset = self.pos;
        match self.state {
            State::Data | State::Raw(_) => {}
            State::TagOpen => {
                self.issue("end of input before tag name", offset);
                self.text.push('<');
            }
            State::EndTagOpen => {
                self.issue("end of input before tag name", offset);
                self.text.push_str("</");
            }
            State::TagName
            | State::BeforeAttributeName
            | State::AttributeName
            | State::AfterAttributeName
            | State::BeforeAttributeValue
            | State::AttributeValue(_)
            | State::AfterAttributeValueQuoted
            | State::SelfClosingStartTag => {
                self.issue("end of input in tag", offset);
                self.emit_tag();
            }
            State::MarkupDeclarationOpen
            | State::BogusComment
            | State::CommentStart
            | State::CommentStartDash
            | State::Comment
            | State::CommentEndDash
            | State::CommentEnd
            | State::CommentEndBang => {
                self.issue("end of input in comment", offset);
                self.emit_comment();
            }
            State::Doctype
            | State::BeforeDoctypeName
            | State::DoctypeName
            | State::AfterDoctypeName
            | State::BeforeDoctypeIdentifier(_)
            | State::DoctypeIdentifier(..)
            | State::AfterDoctypeIdentifier(_)
            | State::BogusDoctype => {
                self.issue("end of input in doctype", offset);
                self.emit_doctype();
            }
        }

        self.flush_text();
        self.pending.push_back(Token::EndOfInput);
        self.state = State::Data;
        self.finished = true;
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }
            self.step();
        }
    }
}

fn starts_with_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.len() >= needle.len()
        && haystack.as_bytes()[..needle.len()].eq_ignore_ascii_case(needle.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).collect()
    }

    fn start(name: &str, attrs: &[(&str, &str)]) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes: attrs.iter().copied().collect(),
            self_closing: false,
        }
    }

    #[test]
    fn test_simple_element() {
        assert_eq!(
            tokens("<p class=x>hi</p>"),
            vec![
                start("p", &[("class", "x")]),
                Token::text("hi"),
                Token::end_tag("p"),
                Token::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_only_end_of_input() {
        let mut tokenizer = tokenize("");
        assert_eq!(tokenizer.next(), Some(Token::EndOfInput));
        assert_eq!(tokenizer.next(), None);
        assert_eq!(tokenizer.next(), None);
    }

    #[test]
    fn test_names_are_lowercased() {
        assert_eq!(
            tokens("<DIV ID='a'></Div>"),
            vec![start("div", &[("id", "a")]), Token::end_tag("div"), Token::EndOfInput]
        );
    }

    #[test]
    fn test_attribute_quoting_styles() {
        assert_eq!(
            tokens(r#"<input type="text" name='q' value=v disabled>"#),
            vec![
                start("input", &[("type", "text"), ("name", "q"), ("value", "v"), ("disabled", "")]),
                Token::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_duplicate_attribute_first_wins() {
        let mut tokenizer = tokenize("<a href='x' href='y'>");
        assert_eq!(tokenizer.next(), Some(start("a", &[("href", "x")])));
        assert_eq!(tokenizer.take_issues().len(), 1);
    }

    #[test]
    fn test_self_closing_flag() {
        assert_eq!(
            tokens("<br/><img src=a />"),
            vec![
                Token::StartTag {
                    name: "br".into(),
                    attributes: Attributes::new(),
                    self_closing: true,
                },
                Token::StartTag {
                    name: "img".into(),
                    attributes: [("src", "a")].into_iter().collect(),
                    self_closing: true,
                },
                Token::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_text_is_merged_around_char_refs() {
        assert_eq!(
            tokens("a &amp; b &lt;c&gt; &#65;&#x42;"),
            vec![Token::text("a & b <c> AB"), Token::EndOfInput]
        );
    }

    #[test]
    fn test_text_split_by_comment() {
        assert_eq!(
            tokens("a<!--c-->b"),
            vec![
                Token::text("a"),
                Token::Comment { data: "c".into() },
                Token::text("b"),
                Token::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_invalid_references_pass_through() {
        assert_eq!(
            tokens("&bogus; &#; &#0; AT&T"),
            vec![Token::text("&bogus; &#; &#0; AT&T"), Token::EndOfInput]
        );
    }

    #[test]
    fn test_attribute_legacy_reference_before_equals_is_literal() {
        assert_eq!(
            tokens("<a href='?a=1&copy=2&amp;b'>"),
            vec![start("a", &[("href", "?a=1&copy=2&b")]), Token::EndOfInput]
        );
    }

    #[test]
    fn test_lone_angle_brackets_are_text() {
        assert_eq!(tokens("a < b"), vec![Token::text("a < b"), Token::EndOfInput]);
        assert_eq!(tokens("x<"), vec![Token::text("x<"), Token::EndOfInput]);
        assert_eq!(tokens("x</"), vec![Token::text("x</"), Token::EndOfInput]);
    }

    #[test]
    fn test_nul_is_preserved() {
        assert_eq!(tokens("a\0b"), vec![Token::text("a\0b"), Token::EndOfInput]);
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokens("<!----><!-- a-b --><!--x--!>"),
            vec![
                Token::Comment { data: "".into() },
                Token::Comment { data: " a-b ".into() },
                Token::Comment { data: "x".into() },
                Token::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_bogus_comments() {
        assert_eq!(
            tokens("<?xml version='1.0'?><!x></ 3><![CDATA[y]]>"),
            vec![
                Token::Comment { data: "?xml version='1.0'?".into() },
                Token::Comment { data: "x".into() },
                Token::Comment { data: " 3".into() },
                Token::Comment { data: "[CDATA[y]]".into() },
                Token::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_doctype() {
        assert_eq!(
            tokens("<!DOCTYPE html>"),
            vec![
                Token::Doctype {
                    name: "html".into(),
                    public_id: None,
                    system_id: None,
                },
                Token::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_doctype_with_identifiers() {
        let input = r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" 'http://www.w3.org/TR/html4/strict.dtd'>"#;
        assert_eq!(
            tokens(input),
            vec![
                Token::Doctype {
                    name: "html".into(),
                    public_id: Some("-//W3C//DTD HTML 4.01//EN".into()),
                    system_id: Some("http://www.w3.org/TR/html4/strict.dtd".into()),
                },
                Token::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_unterminated_constructs_at_end_of_input() {
        assert_eq!(tokens("<div id=a"), vec![start("div", &[("id", "a")]), Token::EndOfInput]);
        assert_eq!(
            tokens("<!-- open"),
            vec![Token::Comment { data: " open".into() }, Token::EndOfInput]
        );
        assert_eq!(
            tokens("<!DOCTYPE html"),
            vec![
                Token::Doctype {
                    name: "html".into(),
                    public_id: None,
                    system_id: None,
                },
                Token::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_raw_text_ends_only_at_matching_end_tag() {
        let mut tokenizer = tokenize("<script>if (a<b) x = '</p>';</SCRIPT >after");
        assert_eq!(tokenizer.next(), Some(start("script", &[])));
        tokenizer.switch_to(RawKind::ScriptData);
        assert_eq!(tokenizer.next(), Some(Token::text("if (a<b) x = '</p>';")));
        assert_eq!(tokenizer.next(), Some(Token::end_tag("script")));
        assert_eq!(tokenizer.next(), Some(Token::text("after")));
        assert_eq!(tokenizer.next(), Some(Token::EndOfInput));
    }

    #[test]
    fn test_rcdata_decodes_references() {
        let mut tokenizer = tokenize("<title>a &amp; <b></title>");
        assert_eq!(tokenizer.next(), Some(start("title", &[])));
        tokenizer.switch_to(RawKind::RcData);
        assert_eq!(tokenizer.next(), Some(Token::text("a & <b>")));
        assert_eq!(tokenizer.next(), Some(Token::end_tag("title")));
    }

    #[test]
    fn test_rawtext_keeps_references() {
        let mut tokenizer = tokenize("<style>a &amp; b</style>");
        assert_eq!(tokenizer.next(), Some(start("style", &[])));
        tokenizer.switch_to(RawKind::RawText);
        assert_eq!(tokenizer.next(), Some(Token::text("a &amp; b")));
        assert_eq!(tokenizer.next(), Some(Token::end_tag("style")));
    }

    #[test]
    fn test_plaintext_never_ends() {
        let mut tokenizer = tokenize("<plaintext>a</plaintext><b>");
        assert_eq!(tokenizer.next(), Some(start("plaintext", &[])));
        tokenizer.switch_to(RawKind::PlainText);
        assert_eq!(tokenizer.next(), Some(Token::text("a</plaintext><b>")));
        assert_eq!(tokenizer.next(), Some(Token::EndOfInput));
    }

    #[test]
    fn test_unclosed_raw_text_runs_to_end() {
        let mut tokenizer = tokenize("<script>var a = 1;</scrip");
        assert_eq!(tokenizer.next(), Some(start("script", &[])));
        tokenizer.switch_to(RawKind::ScriptData);
        assert_eq!(tokenizer.next(), Some(Token::text("var a = 1;</scrip")));
        assert_eq!(tokenizer.next(), Some(Token::EndOfInput));
    }

    #[test]
    fn test_multibyte_text_and_attributes() {
        assert_eq!(
            tokens("<p title='héllo ✓'>日本語</p>"),
            vec![
                start("p", &[("title", "héllo ✓")]),
                Token::text("日本語"),
                Token::end_tag("p"),
                Token::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_issues_carry_byte_offsets() {
        let mut tokenizer = tokenize("ab<>");
        let _: Vec<Token> = tokenizer.by_ref().collect();
        let issues = tokenizer.take_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].position, 3);
    }
}
