//! Tokenizer states.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
}

impl Quote {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '"' => Some(Quote::Double),
            '\'' => Some(Quote::Single),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Quote::Double => '"',
            Quote::Single => '\'',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrValueKind {
    Quoted(Quote),
    Unquoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoctypeIdKind {
    Public,
    System,
}

/// Content models the tree builder can switch the tokenizer into after
/// inserting certain elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    /// `<title>`, `<textarea>`: text with character references
    RcData,
    /// `<style>`, `<xmp>`, `<iframe>`, `<noembed>`, `<noframes>`
    RawText,
    /// `<script>`
    ScriptData,
    /// `<plaintext>`: everything up to end of input is text
    PlainText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Data,
    Raw(RawKind),
    TagOpen,
    EndTagOpen,
    TagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValue(AttrValueKind),
    AfterAttributeValueQuoted,
    SelfClosingStartTag,
    MarkupDeclarationOpen,
    BogusComment,
    CommentStart,
    CommentStartDash,
    Comment,
    CommentEndDash,
    CommentEnd,
    CommentEndBang,
    Doctype,
    BeforeDoctypeName,
    DoctypeName,
    AfterDoctypeName,
    BeforeDoctypeIdentifier(DoctypeIdKind),
    DoctypeIdentifier(DoctypeIdKind, Quote),
    AfterDoctypeIdentifier(DoctypeIdKind),
    BogusDoctype,
}
